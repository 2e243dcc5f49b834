use std::borrow::Cow;

/// red, green, blue
pub const PALETTE: [u8; 9] = [255, 0, 0, 0, 255, 0, 0, 0, 255];

/// One solid-colored frame of a fixture gif
pub struct Patch {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    /// palette index filling the patch
    pub index: u8,
    pub dispose: gif::DisposalMethod,
    /// hundredths of a second
    pub delay: u16,
    pub transparent: Option<u8>,
}

pub fn patch(left: u16, top: u16, width: u16, height: u16, index: u8) -> Patch {
    Patch {
        left,
        top,
        width,
        height,
        index,
        dispose: gif::DisposalMethod::Keep,
        delay: 10,
        transparent: None,
    }
}

pub fn encode(width: u16, height: u16, repeat: gif::Repeat, patches: &[Patch]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut out, width, height, &PALETTE).unwrap();
        encoder.set_repeat(repeat).unwrap();

        for p in patches {
            let frame = gif::Frame {
                left: p.left,
                top: p.top,
                width: p.width,
                height: p.height,
                delay: p.delay,
                dispose: p.dispose,
                transparent: p.transparent,
                buffer: Cow::Owned(vec![p.index; p.width as usize * p.height as usize]),
                ..Default::default()
            };
            encoder.write_frame(&frame).unwrap();
        }
    }
    out
}
