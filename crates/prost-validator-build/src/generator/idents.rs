/// Collision-free temporary names for one message's validate procedure.
///
/// A fresh allocator is created per message, so names restart at 1 in every
/// procedure and output stays stable across runs.
#[derive(Debug, Default)]
pub(crate) struct IdentAllocator {
    counter: usize,
}

impl IdentAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `prefix` followed by the next counter value, e.g. `_src3`.
    pub fn allocate(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}{}", self.counter)
    }
}
