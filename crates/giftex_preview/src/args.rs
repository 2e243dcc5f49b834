use std::collections::BTreeSet;
use std::path::PathBuf;

use bitflags::bitflags;
use giftex::PlaybackConfig;

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PreviewOptions: u32 {
        /// Open with playback paused on the first frame
        const Paused = 1 << 0;

        /// Sample the texture with nearest filtering
        const Pixelated = 1 << 1;

        /// Show cursor and upload stats
        const Debug = 1 << 2;
    }
}

impl Default for PreviewOptions {
    fn default() -> Self {
        PreviewOptions::empty()
    }
}

#[derive(Debug, Default)]
pub struct Args {
    pub gif: Option<String>,
    pub options: PreviewOptions,
    pub max_fps: Option<f32>,
    pub log_dir: Option<PathBuf>,
    /// Problems with recognized flags, reported once logging is up
    pub errors: Vec<String>,
}

impl Args {
    // parse arguments (without the program name), return set of unrecognized args
    pub fn parse(args: &[String]) -> (Self, BTreeSet<String>) {
        let mut unrecognized_args = BTreeSet::new();
        let mut res = Args::default();

        let mut i = 0;
        let len = args.len();
        while i < len {
            let arg = &args[i];

            if arg == "--paused" {
                res.options.set(PreviewOptions::Paused, true);
            } else if arg == "--pixelated" {
                res.options.set(PreviewOptions::Pixelated, true);
            } else if arg == "--debug" {
                res.options.set(PreviewOptions::Debug, true);
            } else if arg == "--max-fps" {
                i += 1;
                let Some(fps) = args.get(i) else {
                    res.errors.push("max-fps argument missing?".to_owned());
                    continue;
                };

                match fps.parse::<f32>() {
                    Ok(fps) if fps > 0.0 => res.max_fps = Some(fps),
                    _ => res.errors.push(format!(
                        "failed to parse --max-fps '{fps}', expected a positive number"
                    )),
                }
            } else if arg == "--log-dir" {
                i += 1;
                let Some(dir) = args.get(i) else {
                    res.errors.push("log-dir argument missing?".to_owned());
                    continue;
                };
                res.log_dir = Some(PathBuf::from(dir));
            } else if !arg.starts_with('-') && res.gif.is_none() {
                res.gif = Some(arg.clone());
            } else {
                unrecognized_args.insert(arg.clone());
            }

            i += 1;
        }

        (res, unrecognized_args)
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            autoplay: !self.options.contains(PreviewOptions::Paused),
            max_fps: self.max_fps,
            ..Default::default()
        }
    }
}
