// Rolling window: the most recent N ratings for one entity.
//
// Backed by a VecDeque with the newest rating at the front. Once the window
// is full, each insertion pushes the oldest rating off the back and hands it
// to the caller.

use std::collections::VecDeque;

/// Fixed-capacity, most-recent-first buffer of ratings.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T> RollingWindow<T> {
    /// Create an empty window holding at most `capacity` entries.
    ///
    /// A capacity of zero is bumped to one so every insert keeps the
    /// newest rating.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Insert a rating as the most recent entry.
    ///
    /// Returns the evicted (oldest) rating if the window was already full.
    pub fn insert(&mut self, rating: T) -> Option<T> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_back()
        } else {
            None
        };
        self.entries.push_front(rating);
        evicted
    }

    /// Current contents, most recent first.
    pub fn to_ordered_ratings(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current contents as one slice, most recent first.
    ///
    /// Rotates the ring in place so no ratings are copied.
    pub fn as_slice(&mut self) -> &[T] {
        self.entries.make_contiguous()
    }
}
