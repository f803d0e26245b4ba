use anyhow::Result;
use std::fmt::Write as _;
use std::io::{self, Stdout, Write};

use super::{BandLayout, Renderer};

const DEFAULT_HEIGHT: usize = 20;
const PARTIAL_BLOCKS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// ANSI bar chart: one column per band, bar height from the raw magnitude
/// (clipped to 0..1), colour from the normalized value.
pub struct TerminalRenderer<W: Write = Stdout> {
    out: W,
    height: usize,
    layout: Option<BandLayout>,
    axis: String,
    screen: String,
}

impl TerminalRenderer<Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout(), DEFAULT_HEIGHT)
    }
}

impl Default for TerminalRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn with_writer(out: W, height: usize) -> Self {
        Self {
            out,
            height: height.max(1),
            layout: None,
            axis: String::new(),
            screen: String::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn build_axis(layout: &BandLayout) -> String {
        let mut line = vec![' '; layout.band_count];
        for (pos, label) in &layout.ticks {
            if let Some(slot) = line.get_mut(*pos) {
                *slot = '|';
            }
            let start = pos.saturating_sub(label.len() / 2);
            for (offset, ch) in label.chars().enumerate() {
                if let Some(slot) = line.get_mut(start + offset) {
                    *slot = ch;
                }
            }
        }
        line.into_iter().collect::<String>().trim_end().to_string()
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn configure(&mut self, layout: &BandLayout) -> Result<()> {
        self.axis = Self::build_axis(layout);
        self.layout = Some(layout.clone());
        // Clear once; later frames only home the cursor.
        write!(self.out, "\x1B[2J")?;
        Ok(())
    }

    fn draw_frame(&mut self, normalized: &[f32], raw: &[f32]) -> Result<()> {
        let gradient = self.layout.as_ref().map(|l| l.gradient).unwrap_or_default();
        let height = self.height;

        self.screen.clear();
        self.screen.push_str("\x1B[H");

        for row in (0..height).rev() {
            for (&value, &level) in raw.iter().zip(normalized) {
                let filled = value.clamp(0.0, 1.0) * height as f32 - row as f32;
                let eighths = (filled.clamp(0.0, 1.0) * 8.0).round() as usize;
                if eighths == 0 {
                    self.screen.push(' ');
                } else {
                    let [r, g, b] = gradient.color_at(level);
                    let block = PARTIAL_BLOCKS[eighths];
                    let _ = write!(self.screen, "\x1B[38;2;{};{};{}m{}", r, g, b, block);
                }
            }
            self.screen.push_str("\x1B[0m\x1B[K\n");
        }
        self.screen.push_str(&self.axis);
        self.screen.push_str("\x1B[K\n");

        self.out.write_all(self.screen.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
