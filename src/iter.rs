//! Borrowing iterators over a [LinkedHashMultiSet]
use crate::multiset::{Count, LinkedHashMultiSet, Node};
use std::fmt::{self, Debug, Formatter};
use std::iter::FusedIterator;

/// Walks the linked nodes in iteration order
pub(crate) struct Links<'a, K, C> {
    set: &'a LinkedHashMultiSet<K, C>,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, K, C: Count> Links<'a, K, C> {
    pub(crate) fn new(set: &'a LinkedHashMultiSet<K, C>) -> Self {
        Links {
            set,
            next: set.head(),
            remaining: set.distinct_len(),
        }
    }
}

impl<'a, K, C> Clone for Links<'a, K, C> {
    fn clone(&self) -> Self {
        Links {
            set: self.set,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, C: Count> Iterator for Links<'a, K, C> {
    type Item = (&'a K, &'a Node<C>);

    fn next(&mut self) -> Option<Self::Item> {
        let (element, node) = self.set.node(self.next?)?;
        self.next = node.next;
        self.remaining -= 1;
        Some((element, node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// An iterator over every occurrence of a [LinkedHashMultiSet]
///
/// Created by [LinkedHashMultiSet::iter].
pub struct Iter<'a, K, C = usize> {
    links: Links<'a, K, C>,
    current: Option<(&'a K, C)>,
    remaining: C,
}

impl<'a, K, C: Count> Iter<'a, K, C> {
    pub(crate) fn new(set: &'a LinkedHashMultiSet<K, C>) -> Self {
        Iter {
            links: Links::new(set),
            current: None,
            remaining: set.len(),
        }
    }
}

impl<'a, K, C: Copy> Clone for Iter<'a, K, C> {
    fn clone(&self) -> Self {
        Iter {
            links: self.links.clone(),
            current: self.current,
            remaining: self.remaining,
        }
    }
}

impl<'a, K: Debug, C: Debug> Debug for Iter<'a, K, C> {
    fn fmt(&self, out: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        out.debug_struct("Iter")
            .field("current", &self.current)
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<'a, K, C: Count> Iterator for Iter<'a, K, C> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((element, left)) = self.current.as_mut() {
                if !left.is_zero() {
                    *left = *left - C::one();
                    self.remaining = self.remaining - C::one();
                    return Some(*element);
                }
            }
            let (element, node) = self.links.next()?;
            self.current = Some((element, node.count));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // counts wider than usize can't be expressed exactly
        match self.remaining.to_usize() {
            Some(remaining) => (remaining, Some(remaining)),
            None => (usize::MAX, None),
        }
    }
}

impl<'a, K, C: Count> FusedIterator for Iter<'a, K, C> {}

/// An iterator over the distinct elements of a [LinkedHashMultiSet]
///
/// Created by [crate::ElementSet::iter].
pub struct Elements<'a, K, C = usize> {
    links: Links<'a, K, C>,
}

impl<'a, K, C: Count> Elements<'a, K, C> {
    pub(crate) fn new(set: &'a LinkedHashMultiSet<K, C>) -> Self {
        Elements {
            links: Links::new(set),
        }
    }
}

impl<'a, K, C> Clone for Elements<'a, K, C> {
    fn clone(&self) -> Self {
        Elements {
            links: self.links.clone(),
        }
    }
}

impl<'a, K, C> Debug for Elements<'a, K, C> {
    fn fmt(&self, out: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        out.debug_struct("Elements")
            .field("remaining", &self.links.remaining)
            .finish()
    }
}

impl<'a, K, C: Count> Iterator for Elements<'a, K, C> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.links.next().map(|(element, _)| element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.links.size_hint()
    }
}

impl<'a, K, C: Count> ExactSizeIterator for Elements<'a, K, C> {}

impl<'a, K, C: Count> FusedIterator for Elements<'a, K, C> {}

/// An iterator over distinct elements and their counts
///
/// Created by [LinkedHashMultiSet::entries].
pub struct Entries<'a, K, C = usize> {
    links: Links<'a, K, C>,
}

impl<'a, K, C: Count> Entries<'a, K, C> {
    pub(crate) fn new(set: &'a LinkedHashMultiSet<K, C>) -> Self {
        Entries {
            links: Links::new(set),
        }
    }
}

impl<'a, K, C> Clone for Entries<'a, K, C> {
    fn clone(&self) -> Self {
        Entries {
            links: self.links.clone(),
        }
    }
}

impl<'a, K, C> Debug for Entries<'a, K, C> {
    fn fmt(&self, out: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        out.debug_struct("Entries")
            .field("remaining", &self.links.remaining)
            .finish()
    }
}

impl<'a, K, C: Count> Iterator for Entries<'a, K, C> {
    type Item = (&'a K, C);

    fn next(&mut self) -> Option<Self::Item> {
        self.links.next().map(|(element, node)| (element, node.count))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.links.size_hint()
    }
}

impl<'a, K, C: Count> ExactSizeIterator for Entries<'a, K, C> {}

impl<'a, K, C: Count> FusedIterator for Entries<'a, K, C> {}
