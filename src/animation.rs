//! Intro animations as data.
//!
//! Each animation the screen plays is one [`AnimationDescriptor`]; the groups
//! below are the tables the watch face uses, and [`run_animation_group`] is the
//! only code that starts them. Every start happens inside its own recording
//! bracket so teardown can delete whatever is still running.

use log::{debug, warn};

use crate::recorder::{ResourceHandle, ResourceRecorder};

/// Animations are tracked through the recorder, so their handles are resources.
pub type AnimationHandle = ResourceHandle;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Widget {
    HourHand,
    MinuteHand,
    SecondHand,
    TimeLabel,
    DateLabel,
    ScrollDot,
}

impl Widget {
    pub const ALL: [Widget; 6] = [
        Widget::HourHand,
        Widget::MinuteHand,
        Widget::SecondHand,
        Widget::TimeLabel,
        Widget::DateLabel,
        Widget::ScrollDot,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Property {
    /// Vertical offset in pixels
    Y,
    /// 0 = transparent, 255 = opaque
    Opacity,
    /// Tenths of a degree
    ImageAngle,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseOut,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Repeat {
    Once,
    Infinite,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AnimationDescriptor {
    pub property: Property,
    pub duration_ms: u32,
    pub start: i32,
    pub end: i32,
    pub easing: Easing,
    /// Added to the delay the caller passes in
    pub delay_ms: u32,
    pub repeat: Repeat,
    /// Write `start` to the target while still waiting out the delay
    pub early_apply: bool,
}

impl AnimationDescriptor {
    const fn new(property: Property, duration_ms: u32, start: i32, end: i32, easing: Easing) -> Self {
        Self {
            property,
            duration_ms,
            start,
            end,
            easing,
            delay_ms: 0,
            repeat: Repeat::Once,
            early_apply: false,
        }
    }

    const fn early(mut self) -> Self {
        self.early_apply = true;
        self
    }

    const fn forever(mut self) -> Self {
        self.repeat = Repeat::Infinite;
        self
    }

    /// Property value `elapsed_ms` into the run (delay already excluded).
    pub fn value_at(&self, elapsed_ms: u32) -> i32 {
        if self.duration_ms == 0 || elapsed_ms >= self.duration_ms {
            return self.end;
        }
        // progress in 1/1024ths
        let t = ((elapsed_ms as i64) << 10) / self.duration_ms as i64;
        let eased = match self.easing {
            Easing::Linear => t,
            Easing::EaseOut => {
                // 1 - (1 - t)^3
                let inv = 1024 - t;
                1024 - ((inv * inv * inv) >> 20)
            }
        };
        let span = (self.end - self.start) as i64;
        self.start + ((span * eased) >> 10) as i32
    }
}

use Easing::{EaseOut, Linear};
use Property::{ImageAngle, Opacity, Y};

pub static UPANIM: [AnimationDescriptor; 2] = [
    AnimationDescriptor::new(Y, 200, -30, 0, EaseOut),
    AnimationDescriptor::new(Opacity, 100, 0, 255, Linear).early(),
];

pub static HOUR: [AnimationDescriptor; 2] = [
    AnimationDescriptor::new(ImageAngle, 1000, 0, 2800, EaseOut),
    AnimationDescriptor::new(Opacity, 300, 0, 255, Linear).early(),
];

pub static MIN: [AnimationDescriptor; 2] = [
    AnimationDescriptor::new(ImageAngle, 1000, 0, 2100, EaseOut),
    AnimationDescriptor::new(Opacity, 200, 0, 255, Linear).early(),
];

pub static SEC: [AnimationDescriptor; 2] = [
    AnimationDescriptor::new(ImageAngle, 60_000, 0, 3600, Linear).forever(),
    AnimationDescriptor::new(Opacity, 1000, 0, 255, Linear).early(),
];

pub static SCROLLDOT: [AnimationDescriptor; 1] = [AnimationDescriptor::new(Y, 300, 30, -8, EaseOut).early()];

#[derive(Debug)]
pub struct AnimationGroup {
    pub name: &'static str,
    pub steps: &'static [AnimationDescriptor],
}

pub static UPANIM_GROUP: AnimationGroup = AnimationGroup { name: "upanim", steps: &UPANIM };
pub static HOUR_GROUP: AnimationGroup = AnimationGroup { name: "hour", steps: &HOUR };
pub static MIN_GROUP: AnimationGroup = AnimationGroup { name: "min", steps: &MIN };
pub static SEC_GROUP: AnimationGroup = AnimationGroup { name: "sec", steps: &SEC };
pub static SCROLLDOT_GROUP: AnimationGroup = AnimationGroup { name: "scrolldot", steps: &SCROLLDOT };

/// One line of the screen's intro: play `group` on `target` after `delay_ms`.
#[derive(Debug)]
pub struct IntroStep {
    pub group: &'static AnimationGroup,
    pub target: Widget,
    pub delay_ms: u32,
}

pub static INTRO_PLAN: [IntroStep; 6] = [
    IntroStep { group: &HOUR_GROUP, target: Widget::HourHand, delay_ms: 0 },
    IntroStep { group: &MIN_GROUP, target: Widget::MinuteHand, delay_ms: 0 },
    IntroStep { group: &SEC_GROUP, target: Widget::SecondHand, delay_ms: 0 },
    IntroStep { group: &UPANIM_GROUP, target: Widget::TimeLabel, delay_ms: 0 },
    IntroStep { group: &UPANIM_GROUP, target: Widget::DateLabel, delay_ms: 100 },
    IntroStep { group: &SCROLLDOT_GROUP, target: Widget::ScrollDot, delay_ms: 0 },
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AnimationError {
    NoFreeSlot,
}

/// The toolkit side of animations.
pub trait AnimationHost {
    fn start_animation(
        &mut self,
        target: Widget,
        anim: &AnimationDescriptor,
        delay_ms: u32,
    ) -> Result<AnimationHandle, AnimationError>;

    /// Stop and free an animation. Handles of animations that already finished
    /// must be accepted and ignored.
    fn delete_animation(&mut self, handle: AnimationHandle);
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupOutcome {
    pub started: u8,
    pub skipped: u8,
}

/// Start every animation of `group` on `target`, each in its own recording
/// bracket. A step that cannot be bracketed or started is logged and skipped;
/// the remaining steps still run.
pub fn run_animation_group(
    group: &AnimationGroup,
    target: Widget,
    delay_ms: u32,
    recorder: &mut ResourceRecorder,
    host: &mut impl AnimationHost,
) -> GroupOutcome {
    let mut out = GroupOutcome::default();

    for anim in group.steps {
        let mut bracket = match recorder.bracket() {
            Ok(b) => b,
            Err(e) => {
                warn!("Start record resource failed ({}): {}", group.name, e);
                out.skipped += 1;
                continue;
            }
        };

        let handle = match host.start_animation(target, anim, delay_ms.saturating_add(anim.delay_ms)) {
            Ok(h) => h,
            Err(e) => {
                warn!("Animation {} on {:?} not started: {:?}", group.name, target, e);
                out.skipped += 1;
                continue;
            }
        };

        // Untracked animations would outlive the screen, so drop them now.
        if let Err(e) = bracket.record(handle) {
            warn!("Animation {} on {:?} not recorded: {}", group.name, target, e);
            host.delete_animation(handle);
            out.skipped += 1;
            continue;
        }

        if let Err(e) = bracket.finish() {
            warn!("End record resource failed ({}): {}", group.name, e);
        }
        out.started += 1;
    }

    debug!("Group {} on {:?}: {:?}", group.name, target, out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{RecordingError, MANIFEST_CAPACITY};

    #[derive(Default)]
    struct FakeHost {
        next: u32,
        started: std::vec::Vec<(Widget, Property, u32)>,
        deleted: std::vec::Vec<u32>,
        refuse: std::vec::Vec<Property>,
    }

    impl AnimationHost for FakeHost {
        fn start_animation(
            &mut self,
            target: Widget,
            anim: &AnimationDescriptor,
            delay_ms: u32,
        ) -> Result<AnimationHandle, AnimationError> {
            if self.refuse.contains(&anim.property) {
                return Err(AnimationError::NoFreeSlot);
            }
            self.next += 1;
            self.started.push((target, anim.property, delay_ms));
            Ok(ResourceHandle(self.next))
        }

        fn delete_animation(&mut self, handle: AnimationHandle) {
            self.deleted.push(handle.0);
        }
    }

    #[test]
    fn each_step_gets_its_own_bracket() {
        let mut rec = ResourceRecorder::new();
        let mut host = FakeHost::default();
        let out = run_animation_group(&MIN_GROUP, Widget::MinuteHand, 50, &mut rec, &mut host);
        assert_eq!(out, GroupOutcome { started: 2, skipped: 0 });
        assert_eq!(rec.bracket_count(), 2);
        assert_eq!(rec.len(), 2);
        assert!(!rec.is_recording());
        assert_eq!(
            host.started,
            [(Widget::MinuteHand, ImageAngle, 50), (Widget::MinuteHand, Opacity, 50)]
        );
    }

    #[test]
    fn open_bracket_skips_the_group_without_starting_anything() {
        let mut rec = ResourceRecorder::new();
        rec.start_recording().unwrap();
        let mut host = FakeHost::default();
        let out = run_animation_group(&UPANIM_GROUP, Widget::DateLabel, 0, &mut rec, &mut host);
        assert_eq!(out, GroupOutcome { started: 0, skipped: 2 });
        assert!(host.started.is_empty());
        assert_eq!(rec.end_recording(), Ok(0));
    }

    #[test]
    fn failed_start_does_not_stop_the_rest() {
        let mut rec = ResourceRecorder::new();
        let mut host = FakeHost { refuse: vec![ImageAngle], ..Default::default() };
        let out = run_animation_group(&SEC_GROUP, Widget::SecondHand, 0, &mut rec, &mut host);
        assert_eq!(out, GroupOutcome { started: 1, skipped: 1 });
        assert_eq!(rec.len(), 1);
        assert!(!rec.is_recording());
    }

    #[test]
    fn unrecordable_animation_is_deleted_immediately() {
        let mut rec = ResourceRecorder::new();
        {
            let mut b = rec.bracket().unwrap();
            for i in 0..MANIFEST_CAPACITY as u32 {
                b.record(ResourceHandle(1000 + i)).unwrap();
            }
        }
        assert_eq!(rec.start_recording(), Ok(()));
        assert_eq!(rec.record(ResourceHandle(0)), Err(RecordingError::ManifestFull));
        rec.end_recording().unwrap();

        let mut host = FakeHost::default();
        let out = run_animation_group(&SCROLLDOT_GROUP, Widget::ScrollDot, 0, &mut rec, &mut host);
        assert_eq!(out, GroupOutcome { started: 0, skipped: 1 });
        assert_eq!(host.deleted, [1]);
    }

    // (property, duration, start, end, easing, repeat, early_apply)
    type Row = (Property, u32, i32, i32, Easing, Repeat, bool);

    fn rows(steps: &[AnimationDescriptor]) -> std::vec::Vec<Row> {
        steps
            .iter()
            .map(|a| (a.property, a.duration_ms, a.start, a.end, a.easing, a.repeat, a.early_apply))
            .collect()
    }

    #[test]
    fn group_tables_match_the_generated_screen() {
        use Repeat::{Infinite, Once};
        assert_eq!(
            rows(&UPANIM),
            [(Y, 200, -30, 0, EaseOut, Once, false), (Opacity, 100, 0, 255, Linear, Once, true)]
        );
        assert_eq!(
            rows(&HOUR),
            [(ImageAngle, 1000, 0, 2800, EaseOut, Once, false), (Opacity, 300, 0, 255, Linear, Once, true)]
        );
        assert_eq!(
            rows(&MIN),
            [(ImageAngle, 1000, 0, 2100, EaseOut, Once, false), (Opacity, 200, 0, 255, Linear, Once, true)]
        );
        assert_eq!(
            rows(&SEC),
            [(ImageAngle, 60_000, 0, 3600, Linear, Infinite, false), (Opacity, 1000, 0, 255, Linear, Once, true)]
        );
        assert_eq!(rows(&SCROLLDOT), [(Y, 300, 30, -8, EaseOut, Once, true)]);
        let groups: [&[AnimationDescriptor]; 5] = [&UPANIM, &HOUR, &MIN, &SEC, &SCROLLDOT];
        assert!(groups.iter().flat_map(|g| g.iter()).all(|a| a.delay_ms == 0));
    }

    #[test]
    fn hour_group_fades_the_hand_in() {
        let mut rec = ResourceRecorder::new();
        let mut host = FakeHost::default();
        let out = run_animation_group(&HOUR_GROUP, Widget::HourHand, 0, &mut rec, &mut host);
        assert_eq!(out, GroupOutcome { started: 2, skipped: 0 });
        assert_eq!(rec.bracket_count(), 2);
        assert_eq!(host.started, [(Widget::HourHand, ImageAngle, 0), (Widget::HourHand, Opacity, 0)]);
    }

    #[test]
    fn intro_plan_fits_the_manifest() {
        let total: usize = INTRO_PLAN.iter().map(|s| s.group.steps.len()).sum();
        assert!(total <= MANIFEST_CAPACITY);
    }

    #[test]
    fn linear_and_ease_out_hit_their_endpoints() {
        let lin = &SEC[0];
        assert_eq!(lin.value_at(0), 0);
        assert_eq!(lin.value_at(30_000), 1800);
        assert_eq!(lin.value_at(60_000), 3600);

        let ease = &HOUR[0];
        assert_eq!(ease.value_at(0), 0);
        assert_eq!(ease.value_at(1000), 2800);
        assert_eq!(ease.value_at(5000), 2800);
        // ease-out is ahead of linear halfway through
        assert!(ease.value_at(500) > 1400);
    }

    #[test]
    fn decreasing_ranges_interpolate_downward() {
        let dot = &SCROLLDOT[0];
        assert_eq!(dot.value_at(0), 30);
        assert_eq!(dot.value_at(300), -8);
        let mid = dot.value_at(150);
        assert!(mid < 30 && mid > -8);
    }
}
