use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::{
    core::CompositeResult,
    error::{TokenError, TokenResult},
};

/// Collapses bursts of repaint requests into at most one render in flight plus one
/// follow-up.
///
/// Any thread may call [`RepaintCoalescer::request`]; the caller that gets `true` back
/// owns the render loop and should drive it with [`RepaintCoalescer::run`].
#[derive(Debug, Default)]
pub struct RepaintCoalescer {
    pending: AtomicBool,
    in_flight: AtomicBool,
}

impl RepaintCoalescer {
    /// Fresh coalescer with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the preview stale. Returns `true` when no render is running and the caller
    /// has become responsible for starting one.
    pub fn request(&self) -> bool {
        self.pending.store(true, Ordering::SeqCst);
        self.try_acquire()
    }

    /// True while a render loop owns the coalescer.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// True when a request has not been served yet.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Render until no request is pending. Requests arriving while `render` runs cause
    /// exactly one more pass. Returns the number of passes executed.
    pub fn run(&self, mut render: impl FnMut()) -> usize {
        let mut passes = 0;
        loop {
            while self.pending.swap(false, Ordering::SeqCst) {
                render();
                passes += 1;
            }
            self.in_flight.store(false, Ordering::SeqCst);
            // A request may have landed between the swap and the release above.
            if !self.pending.load(Ordering::SeqCst) || !self.try_acquire() {
                return passes;
            }
        }
    }

    fn try_acquire(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Outcome of feeding a render result into [`PreviewState`].
#[derive(Debug, PartialEq, Eq)]
pub enum PreviewUpdate {
    /// The new composite replaced the previous one.
    Updated,
    /// Rendering failed recoverably; the previous composite is still shown.
    KeptPrevious,
}

/// Last successfully rendered preview.
#[derive(Clone, Debug, Default)]
pub struct PreviewState {
    last_good: Option<CompositeResult>,
}

impl PreviewState {
    /// No preview yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent good composite.
    pub fn current(&self) -> Option<&CompositeResult> {
        self.last_good.as_ref()
    }

    /// Apply a render outcome. Effects-rendering failures keep the previous composite;
    /// every other error is returned.
    pub fn apply(&mut self, outcome: TokenResult<CompositeResult>) -> TokenResult<PreviewUpdate> {
        match outcome {
            Ok(result) => {
                self.last_good = Some(result);
                Ok(PreviewUpdate::Updated)
            }
            Err(err) if err.is_recoverable_render_failure() => {
                tracing::warn!(error = %err, "preview render failed, keeping previous image");
                Ok(PreviewUpdate::KeptPrevious)
            }
            Err(err) => Err(err),
        }
    }

    /// Drop the current preview.
    pub fn clear(&mut self) -> Option<CompositeResult> {
        self.last_good.take()
    }

    /// Current preview or an error when none was rendered yet.
    pub fn require(&self) -> TokenResult<&CompositeResult> {
        self.current()
            .ok_or_else(|| TokenError::validation("no preview has been rendered"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/session.rs"]
mod tests;
