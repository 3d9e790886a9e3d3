use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Cooperative interrupt flag shared between a caller and long-running work.
///
/// Cloning shares the flag. Work checks it between units and stops early; nothing is
/// forcibly terminated.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True once [`CancelToken::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
