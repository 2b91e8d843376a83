/// What a frame task asks of the loop once it has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Drew a frame; run again on the next display refresh.
    Reschedule,
    /// Nothing is playing; the loop ends here.
    Finished,
}

/// Single pending-frame slot driven by the window redraw cycle.
///
/// Scheduling while a frame is already pending coalesces into that frame,
/// so repeated `play` never yields two loops running side by side.
#[derive(Debug, Default)]
pub struct FrameLoop {
    queued: bool,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self) {
        self.queued = true;
    }

    pub fn is_queued(&self) -> bool {
        self.queued
    }

    /// Runs the pending frame task, if any. Returns `None` when no frame was due.
    pub fn run_pending<F>(&mut self, task: F) -> Option<FrameOutcome>
    where
        F: FnOnce() -> FrameOutcome,
    {
        if !std::mem::take(&mut self.queued) {
            return None;
        }

        let outcome = task();
        if outcome == FrameOutcome::Reschedule {
            self.queued = true;
        }
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_runs_until_scheduled() {
        let mut frames = FrameLoop::new();
        let mut ran = false;
        assert_eq!(frames.run_pending(|| {
            ran = true;
            FrameOutcome::Reschedule
        }), None);
        assert!(!ran);
    }

    #[test]
    fn test_reschedule_and_finish() {
        let mut frames = FrameLoop::new();
        frames.schedule();
        frames.schedule();

        assert_eq!(frames.run_pending(|| FrameOutcome::Reschedule), Some(FrameOutcome::Reschedule));
        assert!(frames.is_queued());

        assert_eq!(frames.run_pending(|| FrameOutcome::Finished), Some(FrameOutcome::Finished));
        assert!(!frames.is_queued());
        assert_eq!(frames.run_pending(|| FrameOutcome::Reschedule), None);
    }
}
