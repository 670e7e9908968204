//! Knob-driven list selection and character entry.
//!
//! Both loops poll: render, sleep one tick, look at the button flags. The
//! encoder position is read fresh on every tick, so callback threads never
//! touch the panel.
use tm_traits::{Clock, InputSource, Point, Rect, Renderer, Signal, Tone};
use tracing::{debug, info};

use crate::charset::{CharSet, glyph};
use crate::device::DeviceUi;
use crate::error::{Result, TmError};

/// Encoder bounds while scrolling a list. Lists wrap, so the bounds only
/// need to be far away.
pub const LIST_SPAN: i32 = 10_000;

/// Choices for [`DeviceUi::select_option`]: fixed, or produced on start and
/// again on every rewind.
pub enum ChoiceSource<'a> {
    Fixed(Vec<String>),
    Producer(Box<dyn FnMut() -> Result<Vec<String>> + 'a>),
}

impl<'a> ChoiceSource<'a> {
    pub fn fixed<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> Self {
        Self::Fixed(items.into_iter().map(|s| s.as_ref().to_string()).collect())
    }

    pub fn producer(f: impl FnMut() -> Result<Vec<String>> + 'a) -> Self {
        Self::Producer(Box::new(f))
    }

    fn produce(&mut self) -> Result<Vec<String>> {
        let choices = match self {
            Self::Fixed(v) => v.clone(),
            Self::Producer(f) => f()?,
        };
        if choices.is_empty() {
            return Err(TmError::EmptyChoices.into());
        }
        Ok(choices)
    }
}

/// `steps mod len`, always in `[0, len)`. `len` must be non-zero.
pub fn wrap_index(steps: i32, len: usize) -> usize {
    let len = i64::try_from(len).unwrap_or(i64::MAX).max(1);
    usize::try_from(i64::from(steps).rem_euclid(len)).unwrap_or(0)
}

/// What the list window shows around the cursor.
#[derive(Debug, PartialEq, Eq)]
pub struct ListView<'c> {
    pub before: &'c [String],
    pub current: &'c str,
    pub after: &'c [String],
}

/// Up to `rows/2` choices before `index` and `rows-1` after it.
pub fn list_window(choices: &[String], index: usize, rows: usize) -> ListView<'_> {
    let index = index.min(choices.len().saturating_sub(1));
    let start = index.saturating_sub(rows / 2);
    let end = index.saturating_add(rows).min(choices.len());
    ListView {
        before: &choices[start..index],
        current: choices.get(index).map_or("", String::as_str),
        after: choices.get(index + 1..end).unwrap_or(&[]),
    }
}

/// What the entry row shows for a cursor position.
#[derive(Debug, PartialEq, Eq)]
pub enum CharView {
    /// Cursor on the delete pseudo-choice; the preview is drawn unmasked.
    Delete { preview: String },
    At {
        before: String,
        cursor: String,
        after: String,
    },
}

pub fn char_window(set: &CharSet, cursor: i32, window: usize) -> CharView {
    let Ok(pos) = usize::try_from(cursor) else {
        return CharView::Delete {
            preview: set.slice(0..window),
        };
    };
    let pos = pos.min(set.len().saturating_sub(1));
    CharView::At {
        before: set.masked(pos.saturating_sub(window / 2)..pos),
        cursor: set.get(pos).map(glyph).unwrap_or_default().into_owned(),
        after: set.masked(pos + 1..pos.saturating_add(window)),
    }
}

fn rows_px(line_height: i32, n: usize) -> i32 {
    line_height.saturating_mul(i32::try_from(n).unwrap_or(i32::MAX))
}

impl<I, R, C> DeviceUi<I, R, C>
where
    I: InputSource,
    R: Renderer,
    C: Clock,
{
    /// Let the user scroll `choices` with the knob and pick one with select.
    ///
    /// Rewind re-runs a producer. Stop is cleared on entry and then ignored.
    pub fn select_option(&mut self, header: &str, mut source: ChoiceSource<'_>) -> Result<String> {
        let mut choices = source.produce()?;
        self.input.reset((-LIST_SPAN, LIST_SPAN));
        self.clear_signals();
        let y0 = self.header(header)?;
        let lh = self.screen.line_height();
        let b = self.screen.bounds();
        let region = Rect::new(b.x0, y0, b.x1, b.y1);
        let rows = self.layout.list_rows;

        let index = loop {
            self.check_abort()?;
            if self.input.is_set(Signal::Rewind) {
                choices = source.produce()?;
                self.input.clear(Signal::Rewind);
                debug!(count = choices.len(), "choices refreshed");
            }
            let index = wrap_index(self.input.steps(), choices.len());
            let view = list_window(&choices, index, rows);

            self.clear_region(region, false)?;
            let mut y = y0;
            if !view.before.is_empty() {
                self.draw(&view.before.join("\n"), Point::new(b.x0, y), Tone::Normal, false)?;
                y += rows_px(lh, view.before.len());
            }
            self.draw(view.current, Point::new(b.x0, y), Tone::Highlight, false)?;
            y += lh;
            self.draw(&view.after.join("\n"), Point::new(b.x0, y), Tone::Normal, true)?;

            self.clock.sleep(self.layout.list_poll);
            if self.input.is_set(Signal::Select) {
                break index;
            }
        };
        self.input.clear(Signal::Select);
        let selected = choices.swap_remove(index);
        info!(selected = %selected, "word selected");
        Ok(selected)
    }

    /// Build a string one character at a time.
    ///
    /// Select appends the character under the cursor, or deletes the last
    /// one when the cursor sits on `DEL` (position -1). Stop finishes and is
    /// left set for the caller.
    pub fn select_chars(&mut self, header: &str, label: &str, set: &CharSet) -> Result<String> {
        if set.is_empty() {
            return Err(TmError::EmptyChoices.into());
        }
        let last = i32::try_from(set.len() - 1).unwrap_or(i32::MAX);
        self.input.reset((-1, last));
        self.input.clear(Signal::Stop);
        self.input.clear(Signal::Select);

        let y0 = self.header(header)?;
        let lh = self.screen.line_height();
        let b = self.screen.bounds();
        let split = y0.saturating_add(rows_px(lh, 2));
        let entry = Rect::new(b.x0, y0, b.x1, split);
        let so_far = Rect::new(b.x0, split, b.x1, b.y1);

        let mut text = String::new();
        loop {
            while !self.input.is_set(Signal::Select) && !self.input.is_set(Signal::Stop) {
                self.check_abort()?;
                let cursor = self.input.steps();
                self.draw_entry_row(entry, cursor, set)?;
                self.clock.sleep(self.layout.chars_poll);
            }
            self.input.clear(Signal::Select);
            if self.input.is_set(Signal::Stop) {
                break;
            }
            let cursor = self.input.steps();
            match usize::try_from(cursor) {
                Err(_) => {
                    text.pop();
                    self.clear_region(so_far, false)?;
                }
                Ok(pos) => {
                    if let Some(c) = set.get(pos.min(set.len() - 1)) {
                        text.push(c);
                    }
                }
            }
            self.draw(&format!("{label}:\n{text}"), so_far.origin(), Tone::Info, true)?;
        }
        info!(chars = text.chars().count(), "text entered");
        Ok(text)
    }

    fn draw_entry_row(&mut self, entry: Rect, cursor: i32, set: &CharSet) -> Result<()> {
        self.clear_region(entry, false)?;
        let y = entry.y0;
        let mut x = entry.x0;
        let del_tone = if cursor < 0 { Tone::Highlight } else { Tone::Normal };
        self.draw("DEL", Point::new(x, y), del_tone, false)?;
        x += self.screen.text_width("DEL");
        match char_window(set, cursor, self.layout.char_window) {
            CharView::Delete { preview } => {
                self.draw(&preview, Point::new(x, y), Tone::Normal, true)?;
            }
            CharView::At {
                before,
                cursor,
                after,
            } => {
                self.draw(&before, Point::new(x, y), Tone::Normal, false)?;
                x += self.screen.text_width(&before);
                self.draw(&cursor, Point::new(x, y), Tone::Highlight, false)?;
                x += self.screen.text_width(&cursor);
                self.draw(&after, Point::new(x, y), Tone::Normal, true)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(0, 6, 0)]
    #[case(7, 6, 1)]
    #[case(-1, 6, 5)]
    #[case(-13, 6, 5)]
    #[case(i32::MIN, 3, 1)]
    fn wraps_euclidean(#[case] steps: i32, #[case] len: usize, #[case] want: usize) {
        assert_eq!(wrap_index(steps, len), want);
    }

    #[test]
    fn list_window_edges() {
        let c = strings(&["a", "b", "c", "d", "e", "f", "g"]);
        let v = list_window(&c, 0, 5);
        assert!(v.before.is_empty());
        assert_eq!(v.current, "a");
        assert_eq!(v.after, &c[1..5]);

        let v = list_window(&c, 4, 5);
        assert_eq!(v.before, &c[2..4]);
        assert_eq!(v.current, "e");
        assert_eq!(v.after, &c[5..7]);
    }

    #[test]
    fn char_window_masks_only_tail() {
        let set = CharSet::printable();
        match char_window(&set, 93, 12) {
            CharView::At {
                before,
                cursor,
                after,
            } => {
                assert_eq!(before, "^_`{|}");
                assert_eq!(cursor, "~");
                assert_eq!(after, "\u{25A1}".repeat(6));
            }
            other => panic!("unexpected view {other:?}"),
        }
        assert_eq!(
            char_window(&set, -1, 12),
            CharView::Delete {
                preview: "0123456789ab".into()
            }
        );
    }

    #[test]
    fn char_window_cursor_alias() {
        let set = CharSet::printable();
        let CharView::At { cursor, .. } = char_window(&set, 94, 12) else {
            panic!("expected cursor view");
        };
        assert_eq!(cursor, "SPC");
    }
}
