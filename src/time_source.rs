//! Time source boundary.
//!
//! The clock only ever needs two things from the real-time clock: a one-shot
//! `begin` that tells it whether the chip is usable, and a `now` read that
//! yields a [`TimeReading`] snapshot. Everything about the bus protocol lives
//! behind the trait (see `rtc_pcf85063`).

/// One snapshot of the wall clock, as read from the time source.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeReading {
    pub hour: u8,    // 0-23
    pub minute: u8,  // 0-59
    pub second: u8,  // 0-59
    pub day: u8,     // 1-31
    pub weekday: u8, // 0-6, 0 = Sunday
    pub month: u8,   // 1-12
}

impl TimeReading {
    /// Range check on every field. Readings that fail this are never projected
    /// into the UI (the label tables are indexed by `weekday` and `month`).
    pub fn is_valid(&self) -> bool {
        self.hour < 24
            && self.minute < 60
            && self.second < 60
            && (1..=31).contains(&self.day)
            && self.weekday < 7
            && (1..=12).contains(&self.month)
    }
}

pub trait TimeSource {
    type Error: core::fmt::Debug;

    /// Initialize the chip. An error here means the clock stays static.
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Read the current date and time.
    fn now(&mut self) -> Result<TimeReading, Self::Error>;
}
