//! Periodic clock refresh.
//!
//! The firmware runs one cooperative main loop, so the "timer" is a deadline
//! that the loop polls with the current monotonic millisecond count (the same
//! `next_poll_ms` pattern the loop uses for other periodic reads). Callbacks run
//! inline on the UI context and must not block.

/// Cadence of the clock update.
pub const CLOCK_PERIOD_MS: u64 = 1000;

/// The armed periodic task. Exists only while the scheduler is armed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerHandle {
    period_ms: u64,
    next_due_ms: u64,
}

impl SchedulerHandle {
    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn next_due_ms(&self) -> u64 {
        self.next_due_ms
    }
}

#[derive(Debug, Default)]
pub struct ClockScheduler {
    handle: Option<SchedulerHandle>,
}

impl ClockScheduler {
    pub const fn new() -> Self {
        Self { handle: None }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&SchedulerHandle> {
        self.handle.as_ref()
    }

    /// Arm with the default cadence and run `on_tick` once right away so the
    /// face is never a full period stale. Re-arming an armed scheduler only
    /// restarts its phase.
    pub fn arm(&mut self, now_ms: u64, on_tick: impl FnOnce()) {
        self.arm_with_period(now_ms, CLOCK_PERIOD_MS, on_tick);
    }

    pub fn arm_with_period(&mut self, now_ms: u64, period_ms: u64, on_tick: impl FnOnce()) {
        let period_ms = period_ms.max(1);
        self.handle = Some(SchedulerHandle {
            period_ms,
            next_due_ms: now_ms.saturating_add(period_ms),
        });
        on_tick();
    }

    /// Run `on_tick` if a period has elapsed. A loop that stalled across several
    /// periods gets one catch-up tick and the deadline stays on the original
    /// phase. Returns whether the callback ran.
    pub fn poll(&mut self, now_ms: u64, on_tick: impl FnOnce()) -> bool {
        let Some(handle) = self.handle.as_mut() else {
            return false;
        };
        if now_ms < handle.next_due_ms {
            return false;
        }
        let missed = (now_ms - handle.next_due_ms) / handle.period_ms + 1;
        handle.next_due_ms = handle
            .next_due_ms
            .saturating_add(missed.saturating_mul(handle.period_ms));
        on_tick();
        true
    }

    /// Cancel future ticks. Safe to call when already disarmed; returns whether
    /// a handle was actually released.
    pub fn disarm(&mut self) -> bool {
        self.handle.take().is_some()
    }
}
