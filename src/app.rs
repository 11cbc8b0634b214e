//! Clock app lifecycle.
//!
//! `start` brings up the RTC, builds the screen (recording every intro
//! animation), arms the 1 s clock refresh and arms the wake button. `stop`
//! disarms the refresh, tells the host the app closed and releases the recorded
//! animations. Both are driven from the main loop; the only thing the wake
//! interrupt touches is the shared [`SleepToggleBridge`].
//!
//! ```text
//! Uninitialized --start ok--> Running --stop ok--> Stopped
//!       ^  |
//!       +--+ start failed
//! ```

use core::fmt;

use log::{debug, error, info, warn};

use crate::animation::{run_animation_group, AnimationHost, INTRO_PLAN};
use crate::clock_face::{apply_reading, ClockFace};
use crate::recorder::ResourceRecorder;
use crate::registry::{AppConfig, HostError, HostFramework, HostedApp, APP_NAME};
use crate::scheduler::ClockScheduler;
use crate::sleep::{SleepToggleBridge, WakeSource, WORK_DISPLAY_POWER, WORK_RESYNC_CLOCK};
use crate::time_source::TimeSource;

/// Everything the clock needs from the UI toolkit.
pub trait ClockUi: ClockFace + AnimationHost {
    /// Build the static widget tree. Assumed not to fail.
    fn build_screen(&mut self);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AppState {
    Uninitialized,
    Running,
    Stopped,
}

#[derive(Debug)]
pub enum AppError {
    /// `start` on an instance that already ran
    InvalidState(AppState),
    /// wake button could not be armed as an interrupt source
    WakeSource,
    /// host refused the close notification
    Notify(HostError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidState(s) => write!(f, "cannot start from {:?}", s),
            AppError::WakeSource => f.write_str("wake button interrupt setup failed"),
            AppError::Notify(e) => write!(f, "notify core closed failed: {:?}", e),
        }
    }
}

/// Panel power transition the firmware has to apply after a wake-button edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayPower {
    On,
    Off,
}

pub struct ClockApp<'a, R, U, W>
where
    R: TimeSource,
    U: ClockUi,
    W: WakeSource,
{
    config: AppConfig,
    state: AppState,
    rtc: R,
    rtc_ready: bool,
    ui: U,
    wake: W,
    sleep: &'a SleepToggleBridge,
    recorder: ResourceRecorder,
    scheduler: ClockScheduler,
}

impl<'a, R, U, W> ClockApp<'a, R, U, W>
where
    R: TimeSource,
    U: ClockUi,
    W: WakeSource,
{
    pub fn new(config: AppConfig, rtc: R, ui: U, wake: W, sleep: &'a SleepToggleBridge) -> Self {
        Self {
            config,
            state: AppState::Uninitialized,
            rtc,
            rtc_ready: false,
            ui,
            wake,
            sleep,
            recorder: ResourceRecorder::new(),
            scheduler: ClockScheduler::new(),
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// True when the RTC came up and the face shows live time.
    pub fn is_clock_live(&self) -> bool {
        self.scheduler.is_armed()
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn recorder(&self) -> &ResourceRecorder {
        &self.recorder
    }

    pub fn start(&mut self, now_ms: u64) -> Result<(), AppError> {
        if self.state != AppState::Uninitialized {
            return Err(AppError::InvalidState(self.state));
        }
        debug!("Run");

        self.rtc_ready = match self.rtc.begin() {
            Ok(()) => true,
            Err(e) => {
                warn!("RTC init failed, clock stays static: {:?}", e);
                false
            }
        };

        self.ui.build_screen();
        for step in INTRO_PLAN.iter() {
            run_animation_group(step.group, step.target, step.delay_ms, &mut self.recorder, &mut self.ui);
        }
        debug!("Recorded {} intro animations", self.recorder.len());

        if self.rtc_ready {
            let (rtc, ui, sleep) = (&mut self.rtc, &mut self.ui, self.sleep);
            self.scheduler.arm(now_ms, || refresh_clock(rtc, ui, sleep));
        }

        if let Err(e) = self.wake.listen_falling_edge() {
            error!("Wake button setup failed: {:?}", e);
            self.teardown();
            return Err(AppError::WakeSource);
        }

        self.state = AppState::Running;
        info!("{} started (live clock: {})", APP_NAME, self.rtc_ready);
        Ok(())
    }

    /// Drive the periodic refresh. Returns whether a tick ran.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.state != AppState::Running {
            return false;
        }
        let (rtc, ui, sleep) = (&mut self.rtc, &mut self.ui, self.sleep);
        self.scheduler.poll(now_ms, || refresh_clock(rtc, ui, sleep))
    }

    /// Main-loop half of the wake button: pick up what the interrupt posted.
    pub fn service_deferred(&mut self) -> Option<DisplayPower> {
        let work = self.sleep.take_deferred();
        if work == 0 {
            return None;
        }
        let asleep = self.sleep.is_asleep();

        if work & WORK_RESYNC_CLOCK != 0 && self.state == AppState::Running && self.scheduler.is_armed() {
            refresh_clock(&mut self.rtc, &mut self.ui, self.sleep);
        }

        if work & WORK_DISPLAY_POWER == 0 {
            return None;
        }
        let power = if asleep { DisplayPower::Off } else { DisplayPower::On };
        info!("Display {:?}", power);
        Some(power)
    }

    pub fn stop(&mut self, host: &mut impl HostFramework) -> Result<(), AppError> {
        if self.state != AppState::Running {
            debug!("Back ignored in {:?}", self.state);
            return Ok(());
        }
        debug!("Back");

        if self.scheduler.disarm() {
            debug!("Clock timer deleted");
        }

        host.notify_closed(APP_NAME).map_err(|e| {
            error!("Notify core closed failed: {:?}", e);
            AppError::Notify(e)
        })?;

        self.release_resources();
        self.state = AppState::Stopped;
        info!("{} stopped", APP_NAME);
        Ok(())
    }

    fn release_resources(&mut self) {
        let ui = &mut self.ui;
        let n = self.recorder.release_all(|h| ui.delete_animation(h));
        if n > 0 {
            debug!("Released {} recorded resources", n);
        }
    }

    fn teardown(&mut self) {
        self.scheduler.disarm();
        self.release_resources();
    }
}

impl<R, U, W> HostedApp for ClockApp<'_, R, U, W>
where
    R: TimeSource,
    U: ClockUi,
    W: WakeSource,
{
    fn name(&self) -> &'static str {
        APP_NAME
    }

    fn config(&self) -> AppConfig {
        self.config
    }

    fn is_running(&self) -> bool {
        self.state == AppState::Running
    }
}

impl<R, U, W> Drop for ClockApp<'_, R, U, W>
where
    R: TimeSource,
    U: ClockUi,
    W: WakeSource,
{
    fn drop(&mut self) {
        self.teardown();
    }
}

// One clock update. Skipped while the display sleeps; the wake path resyncs.
fn refresh_clock<R: TimeSource, U: ClockFace>(rtc: &mut R, ui: &mut U, sleep: &SleepToggleBridge) {
    if sleep.is_asleep() {
        return;
    }
    match rtc.now() {
        Ok(t) if t.is_valid() => apply_reading(ui, &t),
        Ok(t) => warn!("RTC reading out of range, keeping last face: {:?}", t),
        Err(e) => warn!("RTC read failed: {:?}", e),
    }
}
