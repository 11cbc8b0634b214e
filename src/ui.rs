//! Watch face rendering and the software animation engine.
//!
//! This module provides:
//! - `WatchFace`, the UI-toolkit side of the clock: widget properties, the
//!   hand/label primitives and a fixed slot table of running tweens
//! - `draw`, which renders the face onto any embedded-graphics target
//!
//! Animation handles carry a slot generation. A finished or deleted tween bumps
//! its slot's generation, so a stale handle can never stop whatever reuses the
//! slot later.

use core::f32::consts::PI;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10},
        MonoTextStyle,
    },
    pixelcolor::Rgb565,
    prelude::{DrawTarget, Point, Primitive, RgbColor},
    primitives::{Circle, Line, PrimitiveStyle},
    text::{Alignment, Text},
    Drawable,
};
use libm::{cosf, sinf};

use crate::animation::{
    AnimationDescriptor, AnimationError, AnimationHandle, AnimationHost, Property, Repeat, Widget,
};
use crate::app::ClockUi;
use crate::clock_face::{ClockFace, DateLabel, Hand, Label, TimeLabel};
use crate::recorder::ResourceHandle;

// Display configuration, (0,0) is top-left corner
pub const RESOLUTION: u32 = 240; // 240x240 display
pub const CENTER: i32 = RESOLUTION as i32 / 2;

pub const ANIMATION_SLOTS: usize = 16;

const HOUR_LEN: f32 = 55.0;
const MINUTE_LEN: f32 = 80.0;
const SECOND_LEN: f32 = 95.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WidgetProps {
    pub y: i32,
    pub opacity: u8,
    pub angle: u16,
}

impl WidgetProps {
    const INITIAL: WidgetProps = WidgetProps { y: 0, opacity: 255, angle: 0 };
}

#[derive(Copy, Clone, Debug)]
struct Tween {
    anim: AnimationDescriptor,
    target: Widget,
    started_ms: u64,
    delay_ms: u32,
    generation: u16,
}

pub struct WatchFace {
    props: [WidgetProps; 6],
    time_text: TimeLabel,
    date_text: DateLabel,
    slots: [Option<Tween>; ANIMATION_SLOTS],
    generations: [u16; ANIMATION_SLOTS],
    now_ms: u64,
    dirty: bool,
}

impl Default for WatchFace {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchFace {
    pub fn new() -> Self {
        Self {
            props: [WidgetProps::INITIAL; 6],
            time_text: TimeLabel::new(),
            date_text: DateLabel::new(),
            slots: [None; ANIMATION_SLOTS],
            generations: [0; ANIMATION_SLOTS],
            now_ms: 0,
            dirty: true,
        }
    }

    pub fn props(&self, widget: Widget) -> WidgetProps {
        self.props[widget.index()]
    }

    pub fn time_text(&self) -> &str {
        &self.time_text
    }

    pub fn date_text(&self) -> &str {
        &self.date_text
    }

    pub fn running_animations(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns whether anything changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }

    /// Move the animation clock to `now_ms` and apply every running tween.
    pub fn advance(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        for idx in 0..ANIMATION_SLOTS {
            let Some(tween) = self.slots[idx] else { continue };
            let since_start = now_ms.saturating_sub(tween.started_ms);

            if since_start < tween.delay_ms as u64 {
                if tween.anim.early_apply {
                    self.apply(tween.target, tween.anim.property, tween.anim.start);
                }
                continue;
            }

            let run = since_start - tween.delay_ms as u64;
            let duration = tween.anim.duration_ms as u64;
            match tween.anim.repeat {
                Repeat::Infinite if duration > 0 => {
                    let value = tween.anim.value_at((run % duration) as u32);
                    self.apply(tween.target, tween.anim.property, value);
                }
                _ if run >= duration => {
                    self.apply(tween.target, tween.anim.property, tween.anim.end);
                    self.free_slot(idx);
                }
                _ => {
                    let value = tween.anim.value_at(run as u32);
                    self.apply(tween.target, tween.anim.property, value);
                }
            }
        }
    }

    fn apply(&mut self, target: Widget, property: Property, value: i32) {
        let p = &mut self.props[target.index()];
        let before = *p;
        match property {
            Property::Y => p.y = value,
            Property::Opacity => p.opacity = value.clamp(0, 255) as u8,
            Property::ImageAngle => p.angle = value.rem_euclid(3600) as u16,
        }
        if *p != before {
            self.dirty = true;
        }
    }

    fn free_slot(&mut self, idx: usize) {
        self.slots[idx] = None;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
    }

    /// Render the whole face.
    pub fn draw<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        display.clear(Rgb565::BLACK)?;

        // dial
        Circle::new(Point::new(CENTER - 115, CENTER - 115), 230)
            .into_styled(PrimitiveStyle::with_stroke(Rgb565::new(8, 16, 8), 3))
            .draw(display)?;

        self.draw_hand(display, Widget::HourHand, HOUR_LEN, Rgb565::WHITE, 6)?;
        self.draw_hand(display, Widget::MinuteHand, MINUTE_LEN, Rgb565::WHITE, 4)?;
        self.draw_hand(display, Widget::SecondHand, SECOND_LEN, Rgb565::RED, 2)?;

        Circle::new(Point::new(CENTER - 5, CENTER - 5), 10)
            .into_styled(PrimitiveStyle::with_fill(Rgb565::WHITE))
            .draw(display)?;

        let time = self.props(Widget::TimeLabel);
        Text::with_alignment(
            &self.time_text,
            Point::new(CENTER, CENTER + 50 + time.y),
            MonoTextStyle::new(&FONT_10X20, faded(Rgb565::WHITE, time.opacity)),
            Alignment::Center,
        )
        .draw(display)?;

        let date = self.props(Widget::DateLabel);
        Text::with_alignment(
            &self.date_text,
            Point::new(CENTER, CENTER + 72 + date.y),
            MonoTextStyle::new(&FONT_6X10, faded(Rgb565::CYAN, date.opacity)),
            Alignment::Center,
        )
        .draw(display)?;

        let dot = self.props(Widget::ScrollDot);
        Circle::new(Point::new(CENTER - 4, RESOLUTION as i32 - 24 + dot.y), 8)
            .into_styled(PrimitiveStyle::with_fill(faded(Rgb565::WHITE, dot.opacity)))
            .draw(display)?;

        self.dirty = false;
        Ok(())
    }

    fn draw_hand<D>(&self, display: &mut D, widget: Widget, len: f32, color: Rgb565, width: u32) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let p = self.props(widget);
        if p.opacity == 0 {
            return Ok(());
        }
        let rad = p.angle as f32 * PI / 1800.0;
        let tip = Point::new(
            CENTER + (len * sinf(rad)) as i32,
            CENTER - (len * cosf(rad)) as i32,
        );
        Line::new(Point::new(CENTER, CENTER), tip)
            .into_styled(PrimitiveStyle::with_stroke(faded(color, p.opacity), width))
            .draw(display)
    }
}

// Opacity blended against the black background
fn faded(c: Rgb565, opacity: u8) -> Rgb565 {
    let scale = |v: u8| ((v as u16 * opacity as u16) / 255) as u8;
    Rgb565::new(scale(c.r()), scale(c.g()), scale(c.b()))
}

fn hand_widget(hand: Hand) -> Widget {
    match hand {
        Hand::Hour => Widget::HourHand,
        Hand::Minute => Widget::MinuteHand,
        Hand::Second => Widget::SecondHand,
    }
}

impl ClockFace for WatchFace {
    fn set_hand_angle(&mut self, hand: Hand, tenths: u16) {
        self.apply(hand_widget(hand), Property::ImageAngle, tenths as i32);
    }

    fn set_label_text(&mut self, label: Label, text: &str) {
        let changed = match label {
            Label::Time => copy_text(&mut self.time_text, text),
            Label::Date => copy_text(&mut self.date_text, text),
        };
        self.dirty |= changed;
    }
}

// Truncates on overflow. Returns whether the stored text changed.
fn copy_text<const N: usize>(dst: &mut heapless::String<N>, text: &str) -> bool {
    if dst.as_str() == text {
        return false;
    }
    dst.clear();
    for ch in text.chars() {
        if dst.push(ch).is_err() {
            break;
        }
    }
    true
}

impl AnimationHost for WatchFace {
    fn start_animation(
        &mut self,
        target: Widget,
        anim: &AnimationDescriptor,
        delay_ms: u32,
    ) -> Result<AnimationHandle, AnimationError> {
        let idx = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(AnimationError::NoFreeSlot)?;
        let generation = self.generations[idx];
        self.slots[idx] = Some(Tween {
            anim: *anim,
            target,
            started_ms: self.now_ms,
            delay_ms,
            generation,
        });
        if anim.early_apply {
            self.apply(target, anim.property, anim.start);
        }
        Ok(ResourceHandle(((generation as u32) << 8) | idx as u32))
    }

    fn delete_animation(&mut self, handle: AnimationHandle) {
        let idx = (handle.0 & 0xFF) as usize;
        let generation = (handle.0 >> 8) as u16;
        let live = self
            .slots
            .get(idx)
            .and_then(|s| s.as_ref())
            .is_some_and(|t| t.generation == generation);
        if live {
            self.free_slot(idx);
        }
    }
}

impl ClockUi for WatchFace {
    fn build_screen(&mut self) {
        self.props = [WidgetProps::INITIAL; 6];
        self.time_text.clear();
        self.date_text.clear();
        let _ = self.time_text.push_str("--:--");
        self.dirty = true;
    }
}
