use axum::Router;
use std::fmt;

/// Position of a middleware stage in the request pipeline.
/// Lower values run earlier, i.e. sit further out around the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    /// Request span logging, wraps everything including rejections
    pub const TRACE: Priority = Priority(0);
    /// IP admission, ahead of anything that depends on access
    pub const ADMISSION: Priority = Priority(1);
    pub const CORS: Priority = Priority(10);
}

type Stage = Box<dyn FnOnce(Router) -> Router + Send>;

struct Entry {
    priority: Priority,
    name: &'static str,
    stage: Stage,
}

/// Ordered set of middleware stages applied to the router at serve time.
///
/// Registration order does not matter across priorities; stages sharing a
/// priority run in the order they were registered.
#[derive(Default)]
pub struct Pipeline {
    entries: Vec<Entry>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, priority: Priority, name: &'static str, stage: F) -> &mut Self
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.entries.push(Entry {
            priority,
            name,
            stage: Box::new(stage),
        });
        self
    }

    /// Stage names in execution order
    pub fn names(&self) -> Vec<&'static str> {
        let mut ordered: Vec<_> = self.entries.iter().map(|e| (e.priority, e.name)).collect();
        ordered.sort_by_key(|(priority, _)| *priority);
        ordered.into_iter().map(|(_, name)| name).collect()
    }

    /// Wrap the router so the lowest priority ends up as the outermost layer
    pub fn apply(self, router: Router) -> Router {
        let mut entries = self.entries;
        entries.sort_by_key(|e| e.priority);

        // The last layer added is the first to see a request
        entries.into_iter().rev().fold(router, |router, entry| {
            tracing::debug!(stage = entry.name, priority = entry.priority.0, "Binding middleware");
            (entry.stage)(router)
        })
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").field("stages", &self.names()).finish()
    }
}
