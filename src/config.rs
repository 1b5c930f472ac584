/// Configuration for a [`Queue`](crate::Queue).
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    /// Maximum number of items the queue will hold before `try_push`
    /// returns `false` and `wait_push` blocks.
    pub capacity: usize,
}

impl QueueConfig {
    /// Creates a new configuration with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than zero");
        Self { capacity }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        // Matches the default QUEUE_SIZE template parameter of the
        // original C++ implementation this queue is modeled on.
        Self { capacity: 256 }
    }
}
