//! Character-cell emulation of the 160x128 panel.
//!
//! Text lands on a grid of 6x10 px cells. A flushing call prints the whole
//! grid to the writer, but only when it differs from the last printed frame,
//! so tight polling loops do not flood the terminal.
use std::io::Write;
use tm_traits::{BoxError, Point, Rect, Renderer, Tone};

use crate::error::HwError;

pub const CELL_W: i32 = 6;
pub const CELL_H: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    tone: Tone,
}

const BLANK: Cell = Cell {
    ch: ' ',
    tone: Tone::Normal,
};

pub struct TermRenderer {
    width: i32,
    height: i32,
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
    last_frame: Option<String>,
    out: Box<dyn Write + Send>,
    ansi: bool,
}

impl TermRenderer {
    pub fn new(width: u32, height: u32, out: Box<dyn Write + Send>) -> Self {
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        let cols = usize::try_from(width / CELL_W).unwrap_or(0).max(1);
        let rows = usize::try_from(height / CELL_H).unwrap_or(0).max(1);
        Self {
            width,
            height,
            cols,
            rows,
            cells: vec![BLANK; cols * rows],
            last_frame: None,
            out,
            ansi: false,
        }
    }

    /// Render highlighted cells in reverse video instead of brackets.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Current grid contents, one string per row, trailing blanks trimmed.
    pub fn rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|c| c.ch).collect::<String>().trim_end().to_string())
            .collect()
    }

    fn cell_index(&self, row: i32, col: i32) -> Option<usize> {
        let r = usize::try_from(row).ok()?;
        let c = usize::try_from(col).ok()?;
        (r < self.rows && c < self.cols).then_some(r * self.cols + c)
    }

    fn frame(&self) -> String {
        let border = format!("+{}+", "-".repeat(self.cols));
        let mut s = String::with_capacity((self.cols + 3) * (self.rows + 2) * 2);
        s.push_str(&border);
        s.push('\n');
        for row in self.cells.chunks(self.cols) {
            s.push('|');
            let mut highlighted = false;
            for cell in row {
                let hl = cell.tone == Tone::Highlight && cell.ch != ' ';
                if hl != highlighted {
                    s.push_str(match (hl, self.ansi) {
                        (true, true) => "\x1b[7m",
                        (false, true) => "\x1b[0m",
                        (true, false) => "[",
                        (false, false) => "]",
                    });
                    highlighted = hl;
                }
                s.push(cell.ch);
            }
            if highlighted {
                s.push_str(if self.ansi { "\x1b[0m" } else { "]" });
            }
            s.push_str("|\n");
        }
        s.push_str(&border);
        s.push('\n');
        s
    }

    fn flush_frame(&mut self) -> Result<(), BoxError> {
        let frame = self.frame();
        if self.last_frame.as_deref() == Some(frame.as_str()) {
            return Ok(());
        }
        self.out.write_all(frame.as_bytes()).map_err(HwError::from)?;
        self.out.flush().map_err(HwError::from)?;
        self.last_frame = Some(frame);
        Ok(())
    }
}

impl Renderer for TermRenderer {
    fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    fn line_height(&self) -> i32 {
        CELL_H
    }

    fn text_width(&self, text: &str) -> i32 {
        let widest = text.split('\n').map(|l| l.chars().count()).max().unwrap_or(0);
        i32::try_from(widest).unwrap_or(i32::MAX).saturating_mul(CELL_W)
    }

    fn clear(&mut self) -> Result<(), BoxError> {
        self.cells.fill(BLANK);
        self.flush_frame()
    }

    fn clear_area(&mut self, area: Rect, flush: bool) -> Result<(), BoxError> {
        for (i, cell) in self.cells.iter_mut().enumerate() {
            let col = i32::try_from(i % self.cols).unwrap_or(i32::MAX);
            let row = i32::try_from(i / self.cols).unwrap_or(i32::MAX);
            if area.contains(Point::new(col * CELL_W, row * CELL_H)) {
                *cell = BLANK;
            }
        }
        if flush { self.flush_frame() } else { Ok(()) }
    }

    fn draw_text(
        &mut self,
        text: &str,
        at: Point,
        tone: Tone,
        flush: bool,
    ) -> Result<(), BoxError> {
        let row0 = at.y.div_euclid(CELL_H);
        let col0 = at.x.div_euclid(CELL_W);
        for (dy, line) in (0i32..).zip(text.split('\n')) {
            for (dx, ch) in (0i32..).zip(line.chars()) {
                if let Some(idx) = self.cell_index(row0 + dy, col0 + dx) {
                    self.cells[idx] = Cell { ch, tone };
                }
            }
        }
        if flush { self.flush_frame() } else { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Sink {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn draws_lines_on_grid_rows() {
        let sink = Sink::default();
        let mut r = TermRenderer::new(160, 128, Box::new(sink.clone()));
        r.draw_text("Country Code\nTurn knob", Point::new(0, 0), Tone::Header, false)
            .unwrap();
        r.draw_text("US", Point::new(0, 20), Tone::Highlight, true)
            .unwrap();
        let rows = r.rows();
        assert_eq!(rows[0], "Country Code");
        assert_eq!(rows[1], "Turn knob");
        assert_eq!(rows[2], "US");
        assert!(sink.text().contains("|[US]"));
    }

    #[test]
    fn unchanged_frames_are_printed_once() {
        let sink = Sink::default();
        let mut r = TermRenderer::new(60, 20, Box::new(sink.clone()));
        r.draw_text("hi", Point::new(0, 0), Tone::Normal, true).unwrap();
        let once = sink.text().len();
        r.draw_text("hi", Point::new(0, 0), Tone::Normal, true).unwrap();
        assert_eq!(sink.text().len(), once);
    }

    #[test]
    fn clear_area_only_touches_region() {
        let mut r = TermRenderer::new(60, 30, Box::new(Sink::default()));
        r.draw_text("top\nmid\nlow", Point::new(0, 0), Tone::Normal, false)
            .unwrap();
        r.clear_area(Rect::new(0, 10, 60, 20), false).unwrap();
        assert_eq!(r.rows(), vec!["top", "", "low"]);
    }
}
