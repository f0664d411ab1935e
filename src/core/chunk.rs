/// Outcome of filling a chunk from a reader.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ChunkStatus {
    /// The chunk reached its capacity; more items may follow.
    Full,
    /// The reader is exhausted; this is the last chunk (possibly empty).
    Finished,
}

/// Ordered, bounded batch of items written as one unit.
#[derive(Debug)]
pub struct Chunk<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> Chunk<T> {
    /// Creates an empty chunk. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Chunk<T> {
        let capacity = capacity.max(1);
        Chunk {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
