// src/exec/registry.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::exec::backend::Executor;
use crate::plan::{ExecutorKind, ExecutorRef};

/// Maps executor references to executor implementations.
///
/// Resolution order for a reference `kind:id`:
/// 1. an executor registered for exactly `kind:id`
/// 2. the default executor registered for `kind`
/// 3. the fallback executor, if one is set
///
/// The registry is an ordinary value handed to the compiler; there is no
/// process-wide instance.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    exact: HashMap<ExecutorRef, Arc<dyn Executor>>,
    by_kind: HashMap<ExecutorKind, Arc<dyn Executor>>,
    fallback: Option<Arc<dyn Executor>>,
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut exact: Vec<String> = self.exact.keys().map(|r| r.to_string()).collect();
        exact.sort();
        let mut kinds: Vec<&str> = self.by_kind.keys().map(|k| k.as_str()).collect();
        kinds.sort();
        f.debug_struct("ExecutorRegistry")
            .field("exact", &exact)
            .field("by_kind", &kinds)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor for one exact reference.
    pub fn register(
        &mut self,
        reference: ExecutorRef,
        executor: impl Executor + 'static,
    ) -> &mut Self {
        self.register_shared(reference, Arc::new(executor))
    }

    pub fn register_shared(
        &mut self,
        reference: ExecutorRef,
        executor: Arc<dyn Executor>,
    ) -> &mut Self {
        debug!(executor = %reference, "registering executor");
        self.exact.insert(reference, executor);
        self
    }

    /// Register the executor used for any reference of `kind` without an
    /// exact registration.
    pub fn register_kind(
        &mut self,
        kind: ExecutorKind,
        executor: impl Executor + 'static,
    ) -> &mut Self {
        debug!(kind = %kind, "registering default executor for kind");
        self.by_kind.insert(kind, Arc::new(executor));
        self
    }

    /// Executor used when nothing more specific matches.
    pub fn set_fallback(&mut self, executor: impl Executor + 'static) -> &mut Self {
        self.fallback = Some(Arc::new(executor));
        self
    }

    pub fn resolve(&self, reference: &ExecutorRef) -> Option<Arc<dyn Executor>> {
        self.exact
            .get(reference)
            .or_else(|| self.by_kind.get(&reference.kind))
            .or(self.fallback.as_ref())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.by_kind.len() + usize::from(self.fallback.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
