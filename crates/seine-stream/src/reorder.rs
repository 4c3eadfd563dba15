//! Reorder buffer for out-of-order chunk arrival.

use seine_types::Chunk;

/// Pending chunks kept sorted by descending index, so the smallest index
/// is always the back element.
///
/// The drain policy is: pop the back while its index equals the next
/// expected index. Inspection is O(1); insertion keeps the order with a
/// binary search.
#[derive(Debug, Default)]
pub(crate) struct ReorderBuffer {
    entries: Vec<(Chunk, usize)>,
}

impl ReorderBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a chunk destined for `index`.
    pub(crate) fn push(&mut self, chunk: Chunk, index: usize) {
        let at = self.entries.partition_point(|(_, i)| *i > index);
        self.entries.insert(at, (chunk, index));
    }

    /// Pop the smallest-index entry if its index equals `index`.
    pub(crate) fn pop_if_next(&mut self, index: usize) -> Option<Chunk> {
        match self.entries.last() {
            Some((_, i)) if *i == index => self.entries.pop().map(|(chunk, _)| chunk),
            _ => None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
