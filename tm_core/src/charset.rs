//! Character sets for knob-driven text entry.
use std::borrow::Cow;
use std::ops::Range;

/// Digits, lowercase, uppercase, punctuation, then whitespace.
pub const PRINTABLE: &str = concat!(
    "0123456789",
    "abcdefghijklmnopqrstuvwxyz",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~",
    " \t\n\r\x0b\x0c",
);

/// Positions at or beyond this index are drawn as [`MASK`] in the scroll
/// window (they are still selectable).
pub const SAFE_LEN: usize = 94;

pub const MASK: char = '\u{25A1}';

const UPPERCASE: Range<usize> = 36..62;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharSet {
    chars: Vec<char>,
}

impl Default for CharSet {
    fn default() -> Self {
        Self::printable()
    }
}

impl CharSet {
    pub fn new(chars: &str) -> Self {
        Self {
            chars: chars.chars().collect(),
        }
    }

    pub fn printable() -> Self {
        Self::new(PRINTABLE)
    }

    /// `A`..=`Z`, used for country codes.
    pub fn uppercase() -> Self {
        Self {
            chars: PRINTABLE.chars().skip(UPPERCASE.start).take(UPPERCASE.len()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    pub fn position(&self, c: char) -> Option<usize> {
        self.chars.iter().position(|&x| x == c)
    }

    /// Characters in `range`, clipped to the set, drawn literally.
    pub fn slice(&self, range: Range<usize>) -> String {
        let end = range.end.min(self.chars.len());
        let start = range.start.min(end);
        self.chars[start..end].iter().collect()
    }

    /// Like [`CharSet::slice`] with positions `>= SAFE_LEN` replaced by [`MASK`].
    pub fn masked(&self, range: Range<usize>) -> String {
        let end = range.end.min(self.chars.len());
        let start = range.start.min(end);
        (start..end)
            .map(|i| if i >= SAFE_LEN { MASK } else { self.chars[i] })
            .collect()
    }
}

/// Printable label for the character under the cursor.
pub fn glyph(c: char) -> Cow<'static, str> {
    match c {
        ' ' => Cow::Borrowed("SPC"),
        '\t' => Cow::Borrowed("\\t"),
        '\n' => Cow::Borrowed("\\n"),
        '\r' => Cow::Borrowed("\\r"),
        '\x0b' => Cow::Borrowed("\\v"),
        '\x0c' => Cow::Borrowed("\\f"),
        other => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn printable_layout() {
        let set = CharSet::printable();
        assert_eq!(set.len(), 100);
        assert_eq!(set.get(0), Some('0'));
        assert_eq!(set.get(36), Some('A'));
        assert_eq!(set.get(93), Some('~'));
        assert_eq!(set.get(94), Some(' '));
        assert_eq!(set.get(99), Some('\x0c'));
    }

    #[test]
    fn uppercase_subset() {
        let set = CharSet::uppercase();
        assert_eq!(set.slice(0..26), "ABCDEFGHIJKLMNOPQRSTUVWXYZ");
    }

    #[test]
    fn whitespace_tail_is_masked() {
        let set = CharSet::printable();
        assert_eq!(set.masked(92..97), "}~\u{25A1}\u{25A1}\u{25A1}");
        assert_eq!(set.masked(98..500), "\u{25A1}\u{25A1}");
        assert_eq!(set.slice(0..3), "012");
    }

    #[rstest]
    #[case(' ', "SPC")]
    #[case('\t', "\\t")]
    #[case('\n', "\\n")]
    #[case('\r', "\\r")]
    #[case('\x0b', "\\v")]
    #[case('\x0c', "\\f")]
    #[case('q', "q")]
    fn cursor_aliases(#[case] c: char, #[case] label: &str) {
        assert_eq!(glyph(c), label);
    }
}
