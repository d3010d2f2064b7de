/// Fixed-capacity recency filter.
///
/// Remembers the last `capacity` distinct ids it was asked to record. The
/// slot to overwrite is picked by a monotonic write cursor modulo the
/// capacity, so the oldest entry is always the one evicted. A miss only
/// means "not seen among the last `capacity` ids".
#[derive(Debug, Clone)]
pub struct DedupRing<T> {
    slots: Vec<Option<T>>,
    cursor: usize,
}

impl<T: PartialEq> DedupRing<T> {
    /// Create an empty ring. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots, cursor: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, id: &T) -> bool {
        self.slots.iter().flatten().any(|seen| seen == id)
    }

    /// Record `id` unless it is already present.
    ///
    /// Returns `true` if `id` was seen recently (and nothing changed),
    /// `false` if it is new and has now been recorded.
    pub fn check_and_record(&mut self, id: T) -> bool {
        if self.contains(&id) {
            return true;
        }
        let slot = self.cursor % self.slots.len();
        self.slots[slot] = Some(id);
        self.cursor = self.cursor.wrapping_add(1);
        false
    }
}
