use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Shared cancellation flag. Clones observe the same flag; once aborted a
/// token stays aborted, so a new turn needs a new token.
#[derive(Clone, Debug, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn new() -> Self { Self::default() }

    pub fn abort(&self) { self.0.store(true, Ordering::Relaxed); }

    pub fn is_aborted(&self) -> bool { self.0.load(Ordering::Relaxed) }
}

/// Called at every cooperative checkpoint so the host can run its event loop.
pub type YieldHook = Box<dyn FnMut() + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Aborted,
    Deadline,
    NodeLimit,
}

/// Everything the search consults at a checkpoint: the abort token, the
/// wall-clock deadline, an optional node budget and the host's yield hook.
pub struct SearchControl {
    token: AbortToken,
    deadline: Option<Instant>,
    node_limit: u64,
    hook: Option<YieldHook>,
    stopped: Option<StopReason>,
}

impl fmt::Debug for SearchControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchControl")
            .field("aborted", &self.token.is_aborted())
            .field("deadline", &self.deadline)
            .field("node_limit", &self.node_limit)
            .field("stopped", &self.stopped)
            .finish()
    }
}

impl Default for SearchControl {
    fn default() -> Self { Self::new(AbortToken::new()) }
}

impl SearchControl {
    pub fn new(token: AbortToken) -> Self {
        Self { token, deadline: None, node_limit: u64::MAX, hook: None, stopped: None }
    }

    pub fn with_hook(mut self, hook: YieldHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn token(&self) -> &AbortToken { &self.token }

    pub(crate) fn arm(&mut self, deadline: Option<Instant>, node_limit: Option<u64>) {
        self.deadline = deadline;
        self.node_limit = node_limit.unwrap_or(u64::MAX);
        self.stopped = None;
    }

    /// Hand control to the host, then re-check every stop condition.
    pub(crate) fn checkpoint(&mut self, nodes: u64) -> bool {
        if let Some(hook) = self.hook.as_mut() { hook(); }
        self.poll(nodes)
    }

    /// Stop check without yielding. Returns true once the search must unwind.
    pub(crate) fn poll(&mut self, nodes: u64) -> bool {
        if self.stopped.is_some() { return true; }
        let reason = if self.token.is_aborted() {
            Some(StopReason::Aborted)
        } else if self.deadline.is_some_and(|dl| Instant::now() >= dl) {
            Some(StopReason::Deadline)
        } else if nodes >= self.node_limit {
            Some(StopReason::NodeLimit)
        } else {
            None
        };
        self.stopped = reason;
        reason.is_some()
    }

    pub fn stopped(&self) -> Option<StopReason> { self.stopped }

    pub fn aborted(&self) -> bool { self.stopped == Some(StopReason::Aborted) || self.token.is_aborted() }
}
