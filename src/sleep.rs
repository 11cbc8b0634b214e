//! Sleep/wake toggle driven by the wake button interrupt.
//!
//! The GPIO handler runs preemptively with respect to the main loop, so the
//! only work it does is a handful of atomic stores: flip the sleep flag, swap
//! the active display surface and post deferred-work bits. Panel power and the
//! clock resync are done later on the main loop by whoever takes the bits.
//!
//! No debounce: every qualifying edge toggles exactly once.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Value of the active surface while the display is asleep.
pub const NO_SURFACE: u8 = u8::MAX;

/// Panel power has to follow `is_asleep()`.
pub const WORK_DISPLAY_POWER: u8 = 0x01;
/// Clock should be refreshed out of cadence.
pub const WORK_RESYNC_CLOCK: u8 = 0x02;

#[derive(Debug)]
pub struct SleepToggleBridge {
    asleep: AtomicBool,
    active_surface: AtomicU8,
    pending: AtomicU8,
    surface_count: u8,
}

impl SleepToggleBridge {
    pub const fn new(surface_count: u8) -> Self {
        Self {
            asleep: AtomicBool::new(false),
            active_surface: AtomicU8::new(if surface_count > 0 { 0 } else { NO_SURFACE }),
            pending: AtomicU8::new(0),
            surface_count,
        }
    }

    /// Interrupt-context entry point. Cannot fail, does not allocate.
    ///
    /// Sleeping clears the active surface; waking reactivates surface 0, the
    /// next available one in registration order.
    #[inline(always)]
    pub fn on_falling_edge(&self) {
        let was_asleep = self.asleep.fetch_xor(true, Ordering::AcqRel);
        if was_asleep {
            // surface 0 stands in for the toolkit's "next display"
            let next = if self.surface_count > 0 { 0 } else { NO_SURFACE };
            self.active_surface.store(next, Ordering::Release);
            self.pending
                .fetch_or(WORK_DISPLAY_POWER | WORK_RESYNC_CLOCK, Ordering::Release);
        } else {
            self.active_surface.store(NO_SURFACE, Ordering::Release);
            self.pending.fetch_or(WORK_DISPLAY_POWER, Ordering::Release);
        }
    }

    pub fn is_asleep(&self) -> bool {
        self.asleep.load(Ordering::Acquire)
    }

    pub fn active_surface(&self) -> Option<u8> {
        match self.active_surface.load(Ordering::Acquire) {
            NO_SURFACE => None,
            idx => Some(idx),
        }
    }

    /// Main-context side: collect and clear the posted work bits.
    pub fn take_deferred(&self) -> u8 {
        self.pending.swap(0, Ordering::AcqRel)
    }
}

/// Input that can be armed as a falling-edge interrupt source for the bridge.
pub trait WakeSource {
    type Error: core::fmt::Debug;

    fn listen_falling_edge(&mut self) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn edges_strictly_alternate(n in 0usize..200, pre_toggle in any::<bool>()) {
            let bridge = SleepToggleBridge::new(1);
            if pre_toggle {
                bridge.on_falling_edge();
            }
            let initial = bridge.is_asleep();
            for _ in 0..n {
                bridge.on_falling_edge();
            }
            prop_assert_eq!(bridge.is_asleep(), initial ^ (n % 2 == 1));
        }
    }

    #[test]
    fn surface_follows_sleep_state() {
        let bridge = SleepToggleBridge::new(2);
        assert_eq!(bridge.active_surface(), Some(0));
        bridge.on_falling_edge();
        assert!(bridge.is_asleep());
        assert_eq!(bridge.active_surface(), None);
        bridge.on_falling_edge();
        assert!(!bridge.is_asleep());
        assert_eq!(bridge.active_surface(), Some(0));
    }

    #[test]
    fn no_surface_to_wake() {
        let bridge = SleepToggleBridge::new(0);
        bridge.on_falling_edge();
        bridge.on_falling_edge();
        assert!(!bridge.is_asleep());
        assert_eq!(bridge.active_surface(), None);
    }

    #[test]
    fn work_bits_accumulate_until_taken() {
        let bridge = SleepToggleBridge::new(1);
        assert_eq!(bridge.take_deferred(), 0);
        bridge.on_falling_edge();
        assert_eq!(bridge.take_deferred(), WORK_DISPLAY_POWER);
        bridge.on_falling_edge();
        bridge.on_falling_edge();
        bridge.on_falling_edge();
        assert_eq!(bridge.take_deferred(), WORK_DISPLAY_POWER | WORK_RESYNC_CLOCK);
        assert_eq!(bridge.take_deferred(), 0);
    }
}
