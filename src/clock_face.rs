//! Projection of a [`TimeReading`] onto the clock face.
//!
//! Hand angles are in tenths of a degree (3600 = full turn), the unit the
//! image-rotation primitive takes. Labels are rendered into fixed-capacity
//! `heapless` strings so the update path never allocates.

use core::fmt::Write;

use heapless::String;

use crate::time_source::TimeReading;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub type TimeLabel = String<8>;
pub type DateLabel = String<16>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Hand {
    Hour,
    Minute,
    Second,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Label {
    Time,
    Date,
}

/// UI primitives the clock update needs. Implemented by the watch face
/// renderer on hardware and by recording fakes in tests.
pub trait ClockFace {
    fn set_hand_angle(&mut self, hand: Hand, tenths: u16);
    fn set_label_text(&mut self, label: Label, text: &str);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HandAngles {
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

impl HandAngles {
    pub fn from_reading(t: &TimeReading) -> Self {
        Self {
            hour: hour_angle(t.hour, t.minute),
            minute: minute_angle(t.minute),
            second: second_angle(t.second),
        }
    }
}

/// 12-hour face: 300 per hour plus 5 per minute of fine offset.
#[inline]
pub fn hour_angle(hour: u8, minute: u8) -> u16 {
    (hour % 12) as u16 * 300 + minute as u16 * 5
}

#[inline]
pub fn minute_angle(minute: u8) -> u16 {
    minute as u16 * 60
}

#[inline]
pub fn second_angle(second: u8) -> u16 {
    second as u16 * 60
}

/// Zero-padded `HH:MM`.
pub fn format_time(hour: u8, minute: u8) -> TimeLabel {
    let mut s = TimeLabel::new();
    // 5 bytes always fit
    let _ = write!(s, "{:02}:{:02}", hour, minute);
    s
}

/// `Www DD Mmm`, e.g. `Sun 12 Dec`. Out-of-range indices render as `???`.
pub fn format_date(weekday: u8, day: u8, month: u8) -> DateLabel {
    let wd = WEEKDAYS.get(weekday as usize).copied().unwrap_or("???");
    let mo = (month as usize)
        .checked_sub(1)
        .and_then(|i| MONTHS.get(i))
        .copied()
        .unwrap_or("???");
    let mut s = DateLabel::new();
    let _ = write!(s, "{} {:02} {}", wd, day, mo);
    s
}

/// Push one reading to every hand and label.
pub fn apply_reading(face: &mut impl ClockFace, t: &TimeReading) {
    let angles = HandAngles::from_reading(t);
    face.set_hand_angle(Hand::Hour, angles.hour);
    face.set_hand_angle(Hand::Minute, angles.minute);
    face.set_hand_angle(Hand::Second, angles.second);
    face.set_label_text(Label::Time, &format_time(t.hour, t.minute));
    face.set_label_text(Label::Date, &format_date(t.weekday, t.day, t.month));
}
