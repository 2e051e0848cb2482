//! Coalescing of bursty recompute/save requests.
//!
//! A [`CoalescingTask`] only records that work is pending. Whoever drives the
//! event loop (a timer, a UI tick, the end of a command) calls
//! [`CoalescingTask::take`] and runs the work once, however many requests
//! arrived in between.

#[derive(Debug, Default, Clone)]
pub struct CoalescingTask {
    name: &'static str,
    pending: bool,
    requests: u64,
    runs: u64,
}

impl CoalescingTask {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Requests a trailing run. A newer request supersedes a pending one.
    pub fn schedule(&mut self) {
        self.pending = true;
        self.requests += 1;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Clears the pending flag, returning whether a run is due.
    pub fn take(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.runs += 1;
        tracing::debug!(
            task = self.name,
            requests = self.requests,
            runs = self.runs,
            "coalesced run"
        );
        true
    }

    /// Drops a pending request without running it (the work was done inline).
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }
}
