//! Wake button interrupt plumbing.
//!
//! The pin lives in a `critical_section` mutex so both the GPIO handler and the
//! app (which arms it) can reach it. The handler only clears the interrupt and
//! calls the edge callback; there is no debounce, every falling edge counts.

use esp_backtrace as _;

use core::cell::RefCell;
use critical_section::Mutex;

// ESP-HAL imports
use esp_hal::gpio::{Event, Input};

use crate::sleep::WakeSource;

pub struct WakeButton<'a> {
    pub input: Mutex<RefCell<Option<Input<'a>>>>,
    pub name: &'static str,
}

#[derive(Debug)]
pub enum WakeButtonError {
    // pin was never handed to the button state
    NotInstalled,
}

impl WakeSource for &WakeButton<'_> {
    type Error = WakeButtonError;

    fn listen_falling_edge(&mut self) -> Result<(), Self::Error> {
        critical_section::with(|cs| {
            let mut binding = self.input.borrow_ref_mut(cs);
            let input = binding.as_mut().ok_or(WakeButtonError::NotInstalled)?;
            input.listen(Event::FallingEdge);
            Ok(())
        })
    }
}

// Handle wake button edges; call from the GPIO interrupt handler
#[inline(always)]
pub fn handle_wake_edge(btn: &WakeButton, on_edge: impl FnOnce()) {
    critical_section::with(|cs| {
        let mut binding = btn.input.borrow_ref_mut(cs);
        let Some(input) = binding.as_mut() else {
            return;
        };

        // Check if interrupt is actually pending
        if !input.is_interrupt_set() {
            return;
        }
        input.clear_interrupt();
        on_edge();
    });
}
