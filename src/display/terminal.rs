use std::io::{self, Write};

use super::{Frame, FrameSink};
use crate::error::DisplayError;

const COLOR_RESET: &str = "\x1B[0m";
const UPPER_HALF_BLOCK: char = '▀';

/// Stand-in for the LED panel when running without the `hardware` feature.
///
/// Each text line carries two pixel rows: the foreground colour paints the
/// upper half block and the background colour shows through below it.
pub struct TerminalPreview<W> {
    out: W,
}

impl TerminalPreview<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalPreview<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> FrameSink for TerminalPreview<W> {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let mut buf = String::new();
        for line in frame_to_lines(frame) {
            buf.push_str(&line);
            buf.push('\n');
        }
        self.out.write_all(buf.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

fn frame_to_lines(frame: &Frame) -> Vec<String> {
    let black = (0, 0, 0);
    let mut lines = Vec::with_capacity(frame.pixels.len().div_ceil(2));

    for pair in frame.pixels.chunks(2) {
        let top = &pair[0];
        let bottom = pair.get(1);
        let mut line = String::new();

        for (x, &(r, g, b)) in top.iter().enumerate() {
            let (br, bg, bb) = bottom.and_then(|row| row.get(x)).copied().unwrap_or(black);
            line.push_str(&format!(
                "\x1b[38;2;{r};{g};{b}m\x1b[48;2;{br};{bg};{bb}m{UPPER_HALF_BLOCK}"
            ));
        }
        line.push_str(COLOR_RESET);
        lines.push(line);
    }

    lines
}
