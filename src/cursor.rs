//! Detached cursors with fail-fast modification checks
//!
//! A cursor remembers a position in a [LinkedHashMultiSet] without borrowing it, and takes the
//! multiset as an argument on every step. Each multiset carries a modification stamp that
//! advances whenever its set of distinct elements changes: a new element is added, an element's
//! count drops to zero, or the multiset is cleared. A cursor records the stamp when created and
//! refuses to step once the stamp differs, failing with [Error::ConcurrentModification].
//!
//! Count changes that keep every element present do not advance the stamp, so a cursor keeps
//! working across them. The check is best effort: stepping a cursor with a multiset other than
//! the one it was created from is not detected reliably.
use crate::multiset::{Count, LinkedHashMultiSet, Node};
use crate::Error;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Guard {
    stamp: u64,
    poisoned: bool,
}

impl Guard {
    fn new(stamp: u64) -> Self {
        Guard {
            stamp,
            poisoned: false,
        }
    }

    fn check(&mut self, stamp: u64) -> Result<(), Error> {
        if self.poisoned {
            Err(Error::ConcurrentModification)
        } else if self.stamp != stamp {
            log::debug!(
                "cursor created at modification {} stepped at modification {}",
                self.stamp,
                stamp
            );
            Err(self.poison())
        } else {
            Ok(())
        }
    }

    fn poison(&mut self) -> Error {
        self.poisoned = true;
        Error::ConcurrentModification
    }

    fn resync(&mut self, stamp: u64) {
        self.stamp = stamp;
    }
}

fn node_at<'a, K, C: Count>(
    guard: &mut Guard,
    set: &'a LinkedHashMultiSet<K, C>,
    slot: usize,
) -> Result<(&'a K, &'a Node<C>), Error> {
    // a vacant slot under an unchanged stamp means the cursor belongs to another multiset
    set.node(slot).ok_or_else(|| guard.poison())
}

/// Follow the entry that swap removal moved from `last` into `slot`
fn relocate(position: Option<usize>, last: usize, slot: usize) -> Option<usize> {
    match position {
        Some(pos) if pos == last => Some(slot),
        other => other,
    }
}

/// A cursor over every occurrence of a [LinkedHashMultiSet]
///
/// Created by [LinkedHashMultiSet::cursor]. Occurrences are produced in the same order as
/// [LinkedHashMultiSet::iter]. The number of repeats of the current element is read from the
/// multiset on every step, so count changes made while positioned on an element are reflected.
///
/// # Example
///
/// ```
/// # use linked_multiset::{Error, LinkedHashMultiSet};
/// let mut set = LinkedHashMultiSet::new();
/// set.add_many("a", 2).unwrap();
/// let mut cursor = set.cursor();
/// assert_eq!(cursor.next(&set), Ok(Some(&"a")));
/// set.add("b").unwrap();
/// assert_eq!(cursor.next(&set), Err(Error::ConcurrentModification));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor<C = usize> {
    guard: Guard,
    next: Option<usize>,
    current: Option<usize>,
    yielded: C,
    removable: bool,
}

impl<C: Count> Cursor<C> {
    pub(crate) fn new(stamp: u64, head: Option<usize>) -> Self {
        Cursor {
            guard: Guard::new(stamp),
            next: head,
            current: None,
            yielded: C::zero(),
            removable: false,
        }
    }

    /// Advance to the next occurrence
    ///
    /// Returns `Ok(None)` once every occurrence has been produced.
    ///
    /// # Errors
    ///
    /// Fails with [Error::ConcurrentModification] if the distinct elements of `set` changed since
    /// this cursor was created. After a failure every later call fails the same way.
    pub fn next<'a, K>(
        &mut self,
        set: &'a LinkedHashMultiSet<K, C>,
    ) -> Result<Option<&'a K>, Error> {
        self.guard.check(set.stamp())?;
        if let Some(slot) = self.current {
            let (element, node) = node_at(&mut self.guard, set, slot)?;
            if self.yielded < node.count {
                self.yielded = self.yielded + C::one();
                self.removable = true;
                return Ok(Some(element));
            }
        }
        match self.next {
            Some(slot) => {
                let (element, node) = node_at(&mut self.guard, set, slot)?;
                self.current = Some(slot);
                self.next = node.next;
                self.yielded = C::one();
                self.removable = true;
                Ok(Some(element))
            }
            None => Ok(None),
        }
    }

    /// Remove one occurrence of the element last produced by [Cursor::next]
    ///
    /// The removal does not invalidate this cursor, even if it removes the element entirely. It
    /// does invalidate any other cursor in the latter case.
    ///
    /// # Errors
    ///
    /// Fails with [Error::NoCurrentElement] if nothing was produced since the cursor was created
    /// or since the last removal, and with [Error::ConcurrentModification] like [Cursor::next].
    pub fn remove<K: Hash + Eq>(
        &mut self,
        set: &mut LinkedHashMultiSet<K, C>,
    ) -> Result<(), Error> {
        self.guard.check(set.stamp())?;
        let slot = match self.current {
            Some(slot) if self.removable => slot,
            _ => return Err(Error::NoCurrentElement),
        };
        node_at(&mut self.guard, set, slot)?;
        let last = set.distinct_len() - 1;
        let previous = set.remove_at(slot, C::one());
        self.removable = false;
        if previous == C::one() {
            self.current = None;
            self.next = relocate(self.next, last, slot);
        } else {
            self.yielded = self.yielded - C::one();
        }
        self.guard.resync(set.stamp());
        Ok(())
    }
}

/// A cursor over the distinct elements of a [LinkedHashMultiSet]
///
/// Created by [crate::ElementSet::cursor].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementCursor {
    guard: Guard,
    next: Option<usize>,
    current: Option<usize>,
}

impl ElementCursor {
    pub(crate) fn new(stamp: u64, head: Option<usize>) -> Self {
        ElementCursor {
            guard: Guard::new(stamp),
            next: head,
            current: None,
        }
    }

    /// Advance to the next distinct element
    ///
    /// # Errors
    ///
    /// Fails with [Error::ConcurrentModification] if the distinct elements of `set` changed since
    /// this cursor was created. After a failure every later call fails the same way.
    pub fn next<'a, K, C: Count>(
        &mut self,
        set: &'a LinkedHashMultiSet<K, C>,
    ) -> Result<Option<&'a K>, Error> {
        self.guard.check(set.stamp())?;
        match self.next {
            Some(slot) => {
                let (element, node) = node_at(&mut self.guard, set, slot)?;
                self.current = Some(slot);
                self.next = node.next;
                Ok(Some(element))
            }
            None => Ok(None),
        }
    }

    /// Remove every occurrence of the element last produced by [ElementCursor::next]
    ///
    /// Returns the number of occurrences removed. The removal does not invalidate this cursor.
    ///
    /// # Errors
    ///
    /// Fails with [Error::NoCurrentElement] if nothing was produced since the cursor was created
    /// or since the last removal, and with [Error::ConcurrentModification] like
    /// [ElementCursor::next].
    pub fn remove<K: Hash + Eq, C: Count>(
        &mut self,
        set: &mut LinkedHashMultiSet<K, C>,
    ) -> Result<C, Error> {
        self.guard.check(set.stamp())?;
        let slot = self.current.ok_or(Error::NoCurrentElement)?;
        let count = node_at(&mut self.guard, set, slot)?.1.count;
        let last = set.distinct_len() - 1;
        set.remove_at(slot, count);
        self.current = None;
        self.next = relocate(self.next, last, slot);
        self.guard.resync(set.stamp());
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, LinkedHashMultiSet};

    fn sample() -> LinkedHashMultiSet<&'static str> {
        let mut set = LinkedHashMultiSet::new();
        set.add("a").unwrap();
        set.add_many("b", 2).unwrap();
        set.add("c").unwrap();
        set
    }

    fn drain<'a>(
        cursor: &mut super::Cursor,
        set: &LinkedHashMultiSet<&'a str>,
    ) -> Result<Vec<&'a str>, Error> {
        let mut seen = Vec::new();
        while let Some(element) = cursor.next(set)? {
            seen.push(*element);
        }
        Ok(seen)
    }

    #[test]
    fn test_matches_iter() {
        let set = sample();
        let mut cursor = set.cursor();
        let expected: Vec<_> = set.iter().copied().collect();
        assert_eq!(drain(&mut cursor, &set), Ok(expected));
        assert_eq!(cursor.next(&set), Ok(None));

        let mut elements = set.element_set().cursor();
        let mut seen = Vec::new();
        while let Some(element) = elements.next(&set).unwrap() {
            seen.push(*element);
        }
        assert_eq!(seen, ["a", "b", "c"]);
    }

    #[test]
    fn test_new_element_fails() {
        let mut set = sample();
        let mut cursor = set.cursor();
        assert_eq!(cursor.next(&set), Ok(Some(&"a")));
        set.add("d").unwrap();
        assert_eq!(cursor.next(&set), Err(Error::ConcurrentModification));
        set.remove(&"d").unwrap();
        assert_eq!(cursor.next(&set), Err(Error::ConcurrentModification));
    }

    #[test]
    fn test_removed_element_fails() {
        let mut set = sample();
        let mut elements = set.element_set().cursor();
        assert_eq!(elements.next(&set), Ok(Some(&"a")));
        set.remove(&"c").unwrap();
        assert_eq!(elements.next(&set), Err(Error::ConcurrentModification));

        let mut cursor = set.cursor();
        set.clear();
        assert_eq!(cursor.next(&set), Err(Error::ConcurrentModification));
    }

    #[test]
    fn test_count_change_passes() {
        let mut set = sample();
        let mut cursor = set.cursor();
        let mut elements = set.element_set().cursor();
        assert_eq!(cursor.next(&set), Ok(Some(&"a")));
        assert_eq!(elements.next(&set), Ok(Some(&"a")));
        set.add("a").unwrap();
        set.remove(&"b").unwrap();
        assert_eq!(drain(&mut cursor, &set), Ok(vec!["a", "b", "c"]));
        assert_eq!(elements.next(&set), Ok(Some(&"b")));
        assert_eq!(elements.next(&set), Ok(Some(&"c")));
        assert_eq!(elements.next(&set), Ok(None));
    }

    #[test]
    fn test_remove_through_cursor() {
        let mut set = sample();
        let mut cursor = set.cursor();
        let mut kept = Vec::new();
        while let Some(&element) = cursor.next(&set).unwrap() {
            if element == "b" || element == "c" {
                cursor.remove(&mut set).unwrap();
            } else {
                kept.push(element);
            }
        }
        assert_eq!(kept, ["a"]);
        assert_eq!(set.to_string(), "[a]");
    }

    #[test]
    fn test_remove_partial() {
        let mut set = sample();
        let mut cursor = set.cursor();
        cursor.next(&set).unwrap();
        assert_eq!(cursor.next(&set), Ok(Some(&"b")));
        cursor.remove(&mut set).unwrap();
        assert_eq!(set.count(&"b"), 1);
        assert_eq!(drain(&mut cursor, &set), Ok(vec!["b", "c"]));
    }

    #[test]
    fn test_remove_without_current() {
        let mut set = sample();
        let mut cursor = set.cursor();
        assert_eq!(cursor.remove(&mut set), Err(Error::NoCurrentElement));
        cursor.next(&set).unwrap();
        cursor.remove(&mut set).unwrap();
        assert_eq!(cursor.remove(&mut set), Err(Error::NoCurrentElement));

        let mut elements = set.element_set().cursor();
        assert_eq!(elements.remove(&mut set), Err(Error::NoCurrentElement));
        elements.next(&set).unwrap();
        assert_eq!(elements.remove(&mut set), Ok(2));
        assert_eq!(elements.remove(&mut set), Err(Error::NoCurrentElement));
        assert_eq!(set.to_string(), "[c]");
    }

    #[test]
    fn test_cursor_removal_invalidates_others() {
        let mut set = sample();
        let mut first = set.element_set().cursor();
        let mut second = set.element_set().cursor();
        first.next(&set).unwrap();
        second.next(&set).unwrap();
        first.remove(&mut set).unwrap();
        assert_eq!(first.next(&set), Ok(Some(&"b")));
        assert_eq!(second.next(&set), Err(Error::ConcurrentModification));
    }

    #[test]
    fn test_readded_element_goes_last() {
        let mut set = sample();
        let mut elements = set.element_set().cursor();
        while let Some(&element) = elements.next(&set).unwrap() {
            if element == "a" {
                elements.remove(&mut set).unwrap();
            }
        }
        set.add("a").unwrap();
        let order: Vec<_> = set.element_set().iter().copied().collect();
        assert_eq!(order, ["b", "c", "a"]);
    }

    fn ordered_sample() -> LinkedHashMultiSet<&'static str> {
        let mut set = LinkedHashMultiSet::new();
        set.add_many("a", 3).unwrap();
        set.add("c").unwrap();
        set.add_many("b", 2).unwrap();
        set
    }

    /// Every interleaving of `next` (clear bit) and `remove` (set bit) agrees with a `Vec`
    #[test]
    fn test_every_occurrence_sequence() {
        const STEPS: u32 = 9;
        for mask in 0..1u32 << STEPS {
            let mut set = ordered_sample();
            let mut cursor = set.cursor();
            let mut model: Vec<&str> = set.iter().copied().collect();
            let mut pos = 0;
            let mut last = None;
            for step in 0..STEPS {
                if mask & (1 << step) == 0 {
                    let expected = model.get(pos).copied();
                    if expected.is_some() {
                        last = Some(pos);
                        pos += 1;
                    }
                    let actual = cursor.next(&set).map(|element| element.copied());
                    assert_eq!(actual, Ok(expected), "mask {:09b} step {}", mask, step);
                } else {
                    let expected = match last.take() {
                        Some(idx) => {
                            model.remove(idx);
                            pos -= 1;
                            Ok(())
                        }
                        None => Err(Error::NoCurrentElement),
                    };
                    let actual = cursor.remove(&mut set);
                    assert_eq!(actual, expected, "mask {:09b} step {}", mask, step);
                }
                let contents: Vec<_> = set.iter().copied().collect();
                assert_eq!(contents, model, "mask {:09b} step {}", mask, step);
            }
        }
    }

    #[test]
    fn test_every_element_sequence() {
        const STEPS: u32 = 7;
        for mask in 0..1u32 << STEPS {
            let mut set = ordered_sample();
            let mut cursor = set.element_set().cursor();
            let mut model = vec![("a", 3), ("c", 1), ("b", 2)];
            let mut pos = 0;
            let mut last = None;
            for step in 0..STEPS {
                if mask & (1 << step) == 0 {
                    let expected = model.get(pos).map(|&(element, _)| element);
                    if expected.is_some() {
                        last = Some(pos);
                        pos += 1;
                    }
                    let actual = cursor.next(&set).map(|element| element.copied());
                    assert_eq!(actual, Ok(expected), "mask {:07b} step {}", mask, step);
                } else {
                    let expected = match last.take() {
                        Some(idx) => {
                            pos -= 1;
                            Ok(model.remove(idx).1)
                        }
                        None => Err(Error::NoCurrentElement),
                    };
                    let actual = cursor.remove(&mut set);
                    assert_eq!(actual, expected, "mask {:07b} step {}", mask, step);
                }
                let contents: Vec<_> = set
                    .entries()
                    .map(|(&element, count)| (element, count))
                    .collect();
                assert_eq!(contents, model, "mask {:07b} step {}", mask, step);
            }
        }
    }
}
