//! Backslash escapes for element text in the multiset format
//!
//! `\`, `,` and `]` are always escaped, as is the space opening any ` x ` inside an element, so
//! the only unescaped ` x ` in an entry is the one introducing its count.
use std::fmt::{self, Display, Formatter, Write};
use std::iter::FusedIterator;
use std::str::Chars;

/// Element text written with backslash escapes
#[derive(Debug, Clone, Copy)]
pub(crate) struct Escaped<'a>(pub(crate) &'a str);

impl<'a> Display for Escaped<'a> {
    fn fmt(&self, out: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let text = self.0;
        for (pos, chr) in text.char_indices() {
            match chr {
                '\\' | ',' | ']' => out.write_char('\\')?,
                ' ' if text[pos..].starts_with(" x ") => out.write_char('\\')?,
                _ => (),
            }
            out.write_char(chr)?;
        }
        Ok(())
    }
}

/// An iterator over the true characters of escaped element text
#[derive(Debug, Clone)]
pub(crate) struct Unescaped<'a> {
    chars: Chars<'a>,
}

impl<'a> Unescaped<'a> {
    pub(crate) fn new(escaped: &'a str) -> Self {
        Unescaped {
            chars: escaped.chars(),
        }
    }
}

impl<'a> Iterator for Unescaped<'a> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        match self.chars.next() {
            Some('\\') => self.chars.next(),
            chr => chr,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (min, max) = self.chars.size_hint();
        ((min + 1) / 2, max)
    }
}

impl<'a> FusedIterator for Unescaped<'a> {}

#[cfg(test)]
mod tests {
    use super::{Escaped, Unescaped};

    #[test]
    fn test_escaping() {
        assert_eq!(Escaped("plain").to_string(), "plain");
        assert_eq!(Escaped("p, q").to_string(), r"p\, q");
        assert_eq!(Escaped("r]").to_string(), r"r\]");
        assert_eq!(Escaped(r"back\slash").to_string(), r"back\\slash");
        assert_eq!(Escaped("a x 2").to_string(), r"a\ x 2");
        assert_eq!(Escaped("a x").to_string(), "a x");
        assert_eq!(Escaped("[").to_string(), "[");
    }

    #[test]
    fn test_unescaping() {
        for text in ["plain", "p, q", "r]", r"back\slash", "a x 2", " x  x ", ""] {
            let escaped = Escaped(text).to_string();
            let res: String = Unescaped::new(&escaped).collect();
            assert_eq!(res, text);
        }
    }
}
