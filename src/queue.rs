//! # Two-buffer FIFO queue.
//!
//! [`Queue`] keeps arrival order using two plain vectors and only tail
//! operations on each:
//!
//! ```text
//! enqueue ──► fresh:    [a, b, c]            (tail = newest)
//!             reversed: [f, e, d]            (tail = oldest, next to dequeue)
//!
//! logical order: d, e, f, a, b, c
//! ```
//!
//! `dequeue` pops from `reversed`. Only when `reversed` is empty is `fresh`
//! moved over in reverse order. Every element is moved at most once, so each
//! operation costs amortized O(1).

/// First-in-first-out queue backed by two vectors.
#[derive(Debug, Clone)]
pub struct Queue<T> {
    fresh: Vec<T>,
    reversed: Vec<T>,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Queue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fresh: Vec::new(),
            reversed: Vec::new(),
        }
    }

    /// Appends one item to the logical tail and returns the new length.
    pub fn enqueue(&mut self, item: T) -> usize {
        self.fresh.push(item);
        self.len()
    }

    /// Appends every item, in iteration order, and returns the new length.
    ///
    /// # Example
    /// ```
    /// use throttle_queue::Queue;
    ///
    /// let mut q = Queue::new();
    /// assert_eq!(q.enqueue_all(["a", "b", "c"]), 3);
    /// assert_eq!(q.dequeue(), Some("a"));
    /// ```
    pub fn enqueue_all<I>(&mut self, items: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        self.fresh.extend(items);
        self.len()
    }

    /// Removes and returns the logical head.
    ///
    /// Returns `None` on an empty queue; the queue stays empty.
    pub fn dequeue(&mut self) -> Option<T> {
        if self.reversed.is_empty() {
            self.reversed.extend(self.fresh.drain(..).rev());
        }
        self.reversed.pop()
    }

    /// Number of held elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fresh.len() + self.reversed.len()
    }

    /// True if the queue holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fresh.is_empty() && self.reversed.is_empty()
    }
}
