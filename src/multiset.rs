//! An insertion ordered hash multiset
use crate::cursor::{Cursor, ElementCursor};
use crate::escape::Escaped;
use crate::iter::{Elements, Entries, Iter, Links};
use crate::Error;
use indexmap::{Equivalent, IndexMap};
use num::{PrimInt, Unsigned};
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::Hash;

/// An unsigned primitive integer usable as an occurrence count
///
/// This is implemented for every unsigned primitive, `usize` being the default count type of a
/// [LinkedHashMultiSet].
pub trait Count: PrimInt + Unsigned {}

impl<T: PrimInt + Unsigned> Count for T {}

/// The count of a distinct element and its neighbours in iteration order
#[derive(Debug, Clone)]
pub(crate) struct Node<C> {
    pub(crate) count: C,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

/// A hash multiset that remembers the order in which elements became present
///
/// Every distinct element is stored once with its occurrence count. Distinct elements are
/// iterated in the order they were added, except that an element whose count drops to zero
/// forgets its position: adding it again places it at the end.
///
/// Equality only considers elements and counts, never order. [Clone] copies the storage, so the
/// two multisets evolve independently afterwards.
///
/// The borrowing iterators ([LinkedHashMultiSet::iter], [LinkedHashMultiSet::entries],
/// [ElementSet::iter]) cannot observe a modification. For iteration that interleaves with
/// mutation, [LinkedHashMultiSet::cursor] and [ElementSet::cursor] return detached cursors that
/// fail with [Error::ConcurrentModification] once the set of distinct elements changes under
/// them.
pub struct LinkedHashMultiSet<K, C = usize> {
    map: IndexMap<K, Node<C>>,
    head: Option<usize>,
    tail: Option<usize>,
    len: C,
    stamp: u64,
}

impl<K> LinkedHashMultiSet<K> {
    /// Create an empty multiset with `usize` counts
    pub fn new() -> Self {
        Self::with_slots(0)
    }

    /// Create an empty multiset with room for `capacity` distinct elements
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_slots(capacity)
    }
}

impl<K, C: Count> Default for LinkedHashMultiSet<K, C> {
    fn default() -> Self {
        Self::with_slots(0)
    }
}

impl<K, C: Count> LinkedHashMultiSet<K, C> {
    fn with_slots(capacity: usize) -> Self {
        LinkedHashMultiSet {
            map: IndexMap::with_capacity(capacity),
            head: None,
            tail: None,
            len: C::zero(),
            stamp: 0,
        }
    }

    /// The total number of occurrences, summed over all distinct elements
    pub fn len(&self) -> C {
        self.len
    }

    /// The number of distinct elements
    pub fn distinct_len(&self) -> usize {
        self.map.len()
    }

    /// True if no element is present
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over every occurrence
    ///
    /// Each element is repeated according to its count, and all repeats of an element are
    /// contiguous.
    pub fn iter(&self) -> Iter<'_, K, C> {
        Iter::new(self)
    }

    /// Iterate over distinct elements paired with their counts
    pub fn entries(&self) -> Entries<'_, K, C> {
        Entries::new(self)
    }

    /// A view of the distinct elements
    pub fn element_set(&self) -> ElementSet<'_, K, C> {
        ElementSet { set: self }
    }

    /// A detached cursor over every occurrence
    ///
    /// Unlike [LinkedHashMultiSet::iter] the cursor does not borrow the multiset, so the multiset
    /// can be modified between steps. See [Cursor] for how modifications are detected.
    pub fn cursor(&self) -> Cursor<C> {
        Cursor::new(self.stamp, self.head)
    }

    pub(crate) fn head(&self) -> Option<usize> {
        self.head
    }

    pub(crate) fn stamp(&self) -> u64 {
        self.stamp
    }

    pub(crate) fn node(&self, slot: usize) -> Option<(&K, &Node<C>)> {
        self.map.get_index(slot)
    }

    fn touch(&mut self) {
        self.stamp = self.stamp.wrapping_add(1);
    }

    /// Remove every element
    pub fn clear(&mut self) {
        if !self.is_empty() {
            self.map.clear();
            self.head = None;
            self.tail = None;
            self.len = C::zero();
            self.touch();
        }
    }
}

impl<K: Hash + Eq, C: Count> LinkedHashMultiSet<K, C> {
    /// The number of occurrences of `element`, zero if absent
    pub fn count<Q>(&self, element: &Q) -> C
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.map.get(element).map_or_else(C::zero, |node| node.count)
    }

    /// True if `element` occurs at least once
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.map.contains_key(element)
    }

    /// Add one occurrence of `element`, returning its previous count
    pub fn add(&mut self, element: K) -> Result<C, Error> {
        self.add_many(element, C::one())
    }

    /// Add `count` occurrences of `element`, returning its previous count
    ///
    /// An element that was not present is placed after every other element. An element that is
    /// already present keeps its position.
    ///
    /// # Errors
    ///
    /// Fails with [Error::InvalidCount] if `count` is zero and with [Error::CountOverflow] if the
    /// element count or the total length would overflow. The multiset is unchanged on failure.
    pub fn add_many(&mut self, element: K, count: C) -> Result<C, Error> {
        if count.is_zero() {
            return Err(Error::InvalidCount);
        }
        let len = self.len.checked_add(&count).ok_or(Error::CountOverflow)?;
        match self.map.get_index_of(&element) {
            Some(slot) => {
                let node = &mut self.map[slot];
                let previous = node.count;
                node.count = previous.checked_add(&count).ok_or(Error::CountOverflow)?;
                self.len = len;
                Ok(previous)
            }
            None => {
                self.link_back(element, count);
                self.len = len;
                Ok(C::zero())
            }
        }
    }

    /// Remove one occurrence of `element`, returning its previous count
    pub fn remove<Q>(&mut self, element: &Q) -> Result<C, Error>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.remove_many(element, C::one())
    }

    /// Remove up to `count` occurrences of `element`, returning its previous count
    ///
    /// If fewer than `count` occurrences are present, all of them are removed. Once the count
    /// reaches zero the element also loses its position, so adding it again places it last.
    /// Removing an absent element does nothing and returns zero.
    ///
    /// # Errors
    ///
    /// Fails with [Error::InvalidCount] if `count` is zero, leaving the multiset unchanged.
    pub fn remove_many<Q>(&mut self, element: &Q, count: C) -> Result<C, Error>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        if count.is_zero() {
            return Err(Error::InvalidCount);
        }
        Ok(match self.map.get_index_of(element) {
            Some(slot) => self.remove_at(slot, count),
            None => C::zero(),
        })
    }

    /// Remove every occurrence of `element`, returning its previous count
    pub fn remove_all<Q>(&mut self, element: &Q) -> C
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        match self.map.get_index_of(element) {
            Some(slot) => {
                let (_, node) = self.unlink(slot);
                self.len = self.len - node.count;
                node.count
            }
            None => C::zero(),
        }
    }

    /// Set the count of `element` exactly, returning its previous count
    ///
    /// A count of zero removes the element. Giving a count to an absent element places it last.
    ///
    /// # Errors
    ///
    /// Fails with [Error::CountOverflow] if the total length would overflow, leaving the multiset
    /// unchanged.
    pub fn set_count(&mut self, element: K, count: C) -> Result<C, Error> {
        if count.is_zero() {
            return Ok(self.remove_all(&element));
        }
        let previous = self.count(&element);
        let len = (self.len - previous)
            .checked_add(&count)
            .ok_or(Error::CountOverflow)?;
        match self.map.get_index_of(&element) {
            Some(slot) => self.map[slot].count = count,
            None => self.link_back(element, count),
        }
        self.len = len;
        Ok(previous)
    }

    /// Remove up to `count` occurrences from the element stored in `slot`
    ///
    /// Removing the element entirely moves the element in the last slot into `slot`.
    pub(crate) fn remove_at(&mut self, slot: usize, count: C) -> C {
        let node = &mut self.map[slot];
        let previous = node.count;
        if count < previous {
            node.count = previous - count;
            self.len = self.len - count;
        } else {
            self.unlink(slot);
            self.len = self.len - previous;
        }
        previous
    }

    fn link_back(&mut self, element: K, count: C) {
        let node = Node {
            count,
            prev: self.tail,
            next: None,
        };
        let (slot, _) = self.map.insert_full(element, node);
        match self.tail {
            Some(tail) => self.map[tail].next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.touch();
    }

    fn unlink(&mut self, slot: usize) -> (K, Node<C>) {
        let Node { prev, next, .. } = self.map[slot];
        match prev {
            Some(prev) => self.map[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.map[next].prev = prev,
            None => self.tail = prev,
        }
        // swap removal moves the last entry into the vacated slot
        let last = self.map.len() - 1;
        if slot != last {
            let Node { prev, next, .. } = self.map[last];
            match prev {
                Some(prev) => self.map[prev].next = Some(slot),
                None => self.head = Some(slot),
            }
            match next {
                Some(next) => self.map[next].prev = Some(slot),
                None => self.tail = Some(slot),
            }
        }
        let removed = match self.map.swap_remove_index(slot) {
            Some(removed) => removed,
            None => panic!("internal error: unlinking vacant slot {}", slot),
        };
        self.touch();
        removed
    }
}

impl<K: Clone, C: Count> Clone for LinkedHashMultiSet<K, C> {
    fn clone(&self) -> Self {
        LinkedHashMultiSet {
            map: self.map.clone(),
            head: self.head,
            tail: self.tail,
            len: self.len,
            stamp: 0,
        }
    }
}

impl<K: Hash + Eq, C: Count> PartialEq for LinkedHashMultiSet<K, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && self.distinct_len() == other.distinct_len()
            && self
                .entries()
                .all(|(element, count)| other.count(element) == count)
    }
}

impl<K: Hash + Eq, C: Count> Eq for LinkedHashMultiSet<K, C> {}

/// Elements are escaped so that the output parses back with
/// [LinkedHashMultiSet::try_from_str]. An element whose text is empty always carries its count.
impl<K: Display, C: Count + Display> Display for LinkedHashMultiSet<K, C> {
    fn fmt(&self, out: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(out, "[")?;
        for (num, (element, count)) in self.entries().enumerate() {
            if num > 0 {
                write!(out, ", ")?;
            }
            let text = element.to_string();
            if count == C::one() && !text.is_empty() {
                write!(out, "{}", Escaped(&text))?;
            } else {
                write!(out, "{} x {}", Escaped(&text), count)?;
            }
        }
        write!(out, "]")
    }
}

impl<K: Debug, C: Count + Debug> Debug for LinkedHashMultiSet<K, C> {
    fn fmt(&self, out: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        out.debug_map()
            .entries(Links::new(self).map(|(element, node)| (element, &node.count)))
            .finish()
    }
}

/// # Panics
///
/// Panics if a count overflows `C`.
impl<K: Hash + Eq, C: Count> Extend<K> for LinkedHashMultiSet<K, C> {
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = K>,
    {
        for item in iter {
            if let Err(err) = self.add(item) {
                panic!("{} while extending multiset", err);
            }
        }
    }
}

/// # Panics
///
/// Panics if a count overflows `C`.
impl<K: Hash + Eq, C: Count> FromIterator<K> for LinkedHashMultiSet<K, C> {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = K>,
    {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<'a, K, C: Count> IntoIterator for &'a LinkedHashMultiSet<K, C> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A read only view of the distinct elements of a [LinkedHashMultiSet]
///
/// Formats like a list: `[a, c, b]`.
pub struct ElementSet<'a, K, C = usize> {
    set: &'a LinkedHashMultiSet<K, C>,
}

impl<'a, K, C: Count> ElementSet<'a, K, C> {
    /// Iterate over the distinct elements in order
    pub fn iter(&self) -> Elements<'a, K, C> {
        Elements::new(self.set)
    }

    /// The number of distinct elements
    pub fn len(&self) -> usize {
        self.set.distinct_len()
    }

    /// True if there are no elements
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// A detached cursor over the distinct elements
    pub fn cursor(&self) -> ElementCursor {
        ElementCursor::new(self.set.stamp, self.set.head)
    }
}

impl<'a, K: Hash + Eq, C: Count> ElementSet<'a, K, C> {
    /// True if `element` is present
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.set.contains(element)
    }
}

impl<'a, K, C> Clone for ElementSet<'a, K, C> {
    fn clone(&self) -> Self {
        ElementSet { set: self.set }
    }
}

impl<'a, K, C> Copy for ElementSet<'a, K, C> {}

impl<'a, K: Debug, C: Count + Debug> Debug for ElementSet<'a, K, C> {
    fn fmt(&self, out: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        out.debug_set()
            .entries(Links::new(self.set).map(|(element, _)| element))
            .finish()
    }
}

impl<'a, K: Display, C: Count> Display for ElementSet<'a, K, C> {
    fn fmt(&self, out: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(out, "[")?;
        for (num, element) in self.iter().enumerate() {
            if num > 0 {
                write!(out, ", ")?;
            }
            write!(out, "{}", element)?;
        }
        write!(out, "]")
    }
}

impl<'a, K, C: Count> IntoIterator for ElementSet<'a, K, C> {
    type Item = &'a K;
    type IntoIter = Elements<'a, K, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
