#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

mod app;
mod args;

use std::path::Path;

use app::PreviewApp;
use args::Args;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Console logging always, plus a daily rolling file when `log_dir` is set.
/// The returned guard flushes the file writer and must outlive the app.
fn setup_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("giftex=info"));

    // Log to stdout (if you run with `RUST_LOG=debug`).
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stdout);

    let (file_layer, guard) = match log_dir {
        Some(log_dir) => {
            use tracing_appender::{
                non_blocking,
                rolling::{RollingFileAppender, Rotation},
            };

            let file_appender = RollingFileAppender::new(
                Rotation::DAILY,
                log_dir,
                format!("giftex-{}.log", env!("CARGO_PKG_VERSION")),
            );
            let (non_blocking, guard) = non_blocking(file_appender);

            let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);
            (Some(file_layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    guard
}

fn generate_native_options(args: &Args) -> eframe::NativeOptions {
    let title = args.gif.as_deref().unwrap_or("giftex");

    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title)
            .with_inner_size([480.0, 520.0])
            .with_min_inner_size([160.0, 160.0]),
        ..Default::default()
    }
}

fn main() {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let (args, unrecognized) = Args::parse(&raw);

    #[allow(unused_variables)] // need guard to live for lifetime of program
    let guard = setup_logging(args.log_dir.as_deref());

    for err in &args.errors {
        tracing::error!("{err}");
    }

    for arg in &unrecognized {
        tracing::warn!("ignoring unrecognized argument '{arg}'");
    }

    let options = generate_native_options(&args);
    let res = eframe::run_native(
        "giftex preview",
        options,
        Box::new(|_cc| Ok(Box::new(PreviewApp::new(args)))),
    );

    if let Err(err) = res {
        tracing::error!("preview window exited with error: {err}");
    }
}
