use super::context::SyncContext;

/// Default name reported in log fields.
const DEFAULT_NAME: &str = "main";

/// Default initial queue capacity.
const DEFAULT_CAPACITY: usize = 16;

/// Builder for configuring and creating a synchronization context.
///
/// # Examples
///
/// ```rust
/// use mainline::ContextBuilder;
///
/// let context = ContextBuilder::new()
///     .name("ui")
///     .capacity(64)
///     .build();
///
/// assert_eq!(context.name(), "ui");
/// ```
pub struct ContextBuilder {
    /// Name attached to the context's log events.
    name: String,

    /// Initial capacity of the work queue.
    capacity: usize,
}

impl ContextBuilder {
    /// Creates a builder with the default configuration.
    ///
    /// The context is named `"main"` and its queue starts with room for
    /// 16 items.
    pub fn new() -> Self {
        Self {
            name: String::from(DEFAULT_NAME),
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Sets the name used in log events emitted by this context.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the initial capacity of the work queue.
    ///
    /// The queue still grows past this; it only avoids early reallocations.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn capacity(mut self, n: usize) -> Self {
        assert!(n > 0, "capacity must be > 0");

        self.capacity = n;
        self
    }

    /// Builds the context.
    ///
    /// The calling thread becomes the context's main thread: the returned
    /// value cannot leave it.
    pub fn build(self) -> SyncContext {
        SyncContext::from_parts(self.name, self.capacity)
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
