//! Label extension point.
//!
//! Hosts register [`LabelHook`]s when the collector is built. At finalize
//! time hooks are asked in registration order and the first non-empty answer
//! is merged into the info record; later hooks are not consulted.

use std::sync::Arc;

use testgauge_core::summary::OutcomeCounts;
use testgauge_core::Labels;

use crate::snapshot::SessionEnd;

/// Supplies extra info labels for a finished session.
pub trait LabelHook: Send + Sync {
    fn add_labels(&self, counts: &OutcomeCounts, end: &SessionEnd) -> Option<Labels>;
}

impl<F> LabelHook for F
where
    F: Fn(&OutcomeCounts, &SessionEnd) -> Option<Labels> + Send + Sync,
{
    fn add_labels(&self, counts: &OutcomeCounts, end: &SessionEnd) -> Option<Labels> {
        self(counts, end)
    }
}

/// Ordered hook registry.
#[derive(Clone, Default)]
pub struct LabelHooks {
    hooks: Vec<Arc<dyn LabelHook>>,
}

impl LabelHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn LabelHook>) {
        self.hooks.push(hook);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, hook: impl LabelHook + 'static) -> Self {
        self.register(Arc::new(hook));
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// First non-empty label set, if any hook produced one.
    pub fn first_labels(&self, counts: &OutcomeCounts, end: &SessionEnd) -> Option<Labels> {
        self.hooks
            .iter()
            .filter_map(|h| h.add_labels(counts, end))
            .find(|labels| !labels.is_empty())
    }
}
