//! An insertion ordered hash multiset
//!
//! A [LinkedHashMultiSet] stores every distinct element once together with its number of
//! occurrences, and iterates the distinct elements in the order they became present. An element
//! whose count drops to zero loses its place in line, so adding it again places it last.
//!
//! Borrowing iterators cover the common case. When iteration needs to interleave with mutation,
//! the detached [Cursor] and [ElementCursor] step through the multiset and fail with
//! [Error::ConcurrentModification] once its distinct elements change under them.
//!
//! The [Display] format lists entries in order, writing counts above one as `element x count`.
//! Backslashes escape `\`, `,`, `]` and any ` x ` inside an element's text, and an empty element
//! is written as ` x 1`. Multisets of elements implementing [FromStr] can be parsed back from that
//! format with [LinkedHashMultiSet::try_from_str] or the [TryFrom] / [TryInto] traits.
//!
//! # Example
//!
//! ```
//! # use linked_multiset::LinkedHashMultiSet;
//! let mut set = LinkedHashMultiSet::new();
//! set.add_many("a", 3).unwrap();
//! set.add("c").unwrap();
//! set.add_many("b", 2).unwrap();
//! assert_eq!(set.to_string(), "[a x 3, c, b x 2]");
//!
//! set.remove_many(&"a", 3).unwrap();
//! set.add("a").unwrap();
//! assert_eq!(set.to_string(), "[c, b x 2, a]");
//!
//! let parsed: LinkedHashMultiSet<String> = "[c, b x 2, a]".try_into().unwrap();
//! assert_eq!(parsed.count(&"b".to_owned()), 2);
//! ```
#![warn(missing_docs)]

mod cursor;
mod escape;
mod iter;
mod multiset;

pub use cursor::{Cursor, ElementCursor};
use escape::Unescaped;
pub use iter::{Elements, Entries, Iter};
pub use multiset::{Count, ElementSet, LinkedHashMultiSet};
use nom::{
    bytes::complete::{escaped, tag},
    character::complete::{char, digit1, none_of, one_of},
    combinator::{all_consuming, map},
    multi::separated_list0,
    sequence::delimited,
    IResult,
};
use num::NumCast;
use std::fmt::{self, Display, Formatter};
use std::hash::Hash;
use std::str::FromStr;

/// An error from modifying or stepping through a [LinkedHashMultiSet]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// A count of zero was given where at least one occurrence is required
    InvalidCount,
    /// A count or the total length would exceed the count type
    CountOverflow,
    /// The distinct elements changed since a cursor was created
    ConcurrentModification,
    /// A cursor was asked to remove an element before producing one
    NoCurrentElement,
}

impl Display for Error {
    fn fmt(&self, out: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Error::InvalidCount => write!(out, "count must be positive"),
            Error::CountOverflow => write!(out, "count overflowed"),
            Error::ConcurrentModification => write!(out, "multiset modified during iteration"),
            Error::NoCurrentElement => write!(out, "cursor has no current element"),
        }
    }
}

impl std::error::Error for Error {}

/// An error that happens while trying to turn a string into a [LinkedHashMultiSet]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseError<'a> {
    /// The string isn't a bracketed, comma separated list
    ///
    /// This will show the remainder of the string where the parse error occured
    Syntax(&'a str),
    /// An element couldn't be parsed into the element type
    Element(&'a str),
    /// An entry's count was zero or too large for the count type
    Count(&'a str),
}

impl<'a> Display for ParseError<'a> {
    fn fmt(&self, out: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            ParseError::Syntax(rest) => write!(out, "invalid multiset syntax at \"{}\"", rest),
            ParseError::Element(element) => write!(out, "invalid element \"{}\"", element),
            ParseError::Count(entry) => write!(out, "invalid count in \"{}\"", entry),
        }
    }
}

impl<'a> std::error::Error for ParseError<'a> {}

impl<'a> From<nom::Err<nom::error::Error<&'a str>>> for ParseError<'a> {
    fn from(err: nom::Err<nom::error::Error<&'a str>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => panic!("internal error: incomplete parsing"),
            nom::Err::Error(err) => ParseError::Syntax(err.input),
            nom::Err::Failure(err) => ParseError::Syntax(err.input),
        }
    }
}

impl<K: FromStr + Hash + Eq, C: Count> LinkedHashMultiSet<K, C> {
    /// Try to parse a multiset from its [Display] format
    ///
    /// Entries keep the order they are listed in, and a repeated element accumulates its counts.
    /// An unescaped ` x <digits>` ending an entry is its count. Every other character of the entry
    /// belongs to the element, with a backslash escaping the character after it.
    ///
    /// This is identical to `LinkedHashMultiSet::try_from` or `"...".try_into()`.
    pub fn try_from_str(input: &str) -> Result<Self, ParseError<'_>> {
        let (_, entries) = all_consuming(multiset)(input).map_err(|err| {
            let err = ParseError::from(err);
            log::trace!("rejected multiset text: {}", err);
            err
        })?;
        let mut set = Self::default();
        for (raw, element, digits) in entries {
            let count = match digits {
                Some(digits) => digits
                    .parse::<u128>()
                    .ok()
                    .and_then(<C as NumCast>::from)
                    .ok_or(ParseError::Count(raw))?,
                None => C::one(),
            };
            let parsed = Unescaped::new(element)
                .collect::<String>()
                .parse()
                .map_err(|_| ParseError::Element(element))?;
            set.add_many(parsed, count)
                .map_err(|_| ParseError::Count(raw))?;
        }
        Ok(set)
    }
}

impl<'a, K: FromStr + Hash + Eq, C: Count> TryFrom<&'a str> for LinkedHashMultiSet<K, C> {
    type Error = ParseError<'a>;

    fn try_from(input: &'a str) -> Result<Self, Self::Error> {
        Self::try_from_str(input)
    }
}

fn split_count(raw: &str) -> (&str, Option<&str>) {
    let mut escaping = false;
    for (pos, chr) in raw.char_indices() {
        if escaping {
            escaping = false;
        } else if chr == '\\' {
            escaping = true;
        } else if chr == ' ' && raw[pos..].starts_with(" x ") {
            let digits = &raw[pos + 3..];
            if all_consuming(digit1::<_, nom::error::Error<&str>>)(digits).is_ok() {
                return (&raw[..pos], Some(digits));
            }
        }
    }
    (raw, None)
}

fn entry(input: &str) -> IResult<&str, (&str, &str, Option<&str>)> {
    map(escaped(none_of("\\,]"), '\\', one_of("\\,] ")), |raw: &str| {
        let (element, digits) = split_count(raw);
        (raw, element, digits)
    })(input)
}

fn multiset(input: &str) -> IResult<&str, Vec<(&str, &str, Option<&str>)>> {
    delimited(char('['), separated_list0(tag(", "), entry), char(']'))(input)
}
