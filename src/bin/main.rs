//! Squareline Clock
//! ========================================
//! needs to be run in WSL2 terminal
//! source ~/export-esp.sh
//! cargo run --release --features devkit-esp32s3-disp128
//! ========================================
//!
//! Analog + digital clock driven by a PCF85063 RTC.
//! The BOOT button toggles display sleep.

//% CHIPS: esp32s3
//% FEATURES: esp-hal/unstable

#![no_std]
#![no_main]

// Define the application description, which is placed in a special section of the binary.
// This is used by the bootloader to verify the application.
// The macro automatically fills in the fields.
esp_bootloader_esp_idf::esp_app_desc!();

// Module imports
use squareline_clock::{
    app::ClockApp,
    display::{set_display_power, setup_display},
    input::{handle_wake_edge, WakeButton},
    registry::{AppConfig, AppRegistry},
    rtc_pcf85063::Pcf85063,
    sleep::SleepToggleBridge,
    ui::WatchFace,
    wiring::{init_board_pins, BoardPins},
};

// Core imports
use core::cell::RefCell;
use critical_section::Mutex;
use esp_backtrace as _;

// ESP-HAL imports
use esp_hal::{
    handler,
    i2c::master::{Config as I2cConfig, I2c},
    main, ram,
    time::Rate,
    timer::systimer::{SystemTimer, Unit},
    Config,
};

use log::{error, info, LevelFilter};

// Shared between the GPIO handler and the main loop
static WAKE_BUTTON: WakeButton<'static> = WakeButton {
    input: Mutex::new(RefCell::new(None)),
    name: "Wake",
};

// One display surface on this board
static SLEEP: SleepToggleBridge = SleepToggleBridge::new(1);

// Interrupt handler
#[handler]
#[ram]
fn handler() {
    handle_wake_edge(&WAKE_BUTTON, || SLEEP.on_falling_edge());
}

fn now_ms() -> u64 {
    let t = SystemTimer::unit_value(Unit::Unit0);
    t.saturating_mul(1000) / SystemTimer::ticks_per_second()
}

#[main]
fn main() -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);

    // Initialize peripherals
    let peripherals = esp_hal::init(Config::default());

    // one call gives you IO handler + all your role pins from wiring.rs
    let (mut io, pins) = init_board_pins(peripherals);

    let BoardPins {
        wake_btn,
        mut lcd_bl,
        display_pins,
        rtc_bus,
    } = pins;

    // Stash the wake pin for the handler before interrupts go live
    critical_section::with(|cs| {
        WAKE_BUTTON.input.borrow_ref_mut(cs).replace(wake_btn);
    });
    io.set_interrupt_handler(handler);

    // main never returns, so the SPI scratch buffer can live on its stack
    let mut display_buf = [0u8; 1024];
    let mut display = match setup_display(display_pins, &mut display_buf) {
        Ok(d) => d,
        Err(e) => panic!("Display init failed: {:?}", e),
    };

    // -------------------- RTC --------------------
    let i2c = I2c::new(rtc_bus.i2c0, I2cConfig::default().with_frequency(Rate::from_khz(400)))
        .expect("static I2C config")
        .with_sda(rtc_bus.sda)
        .with_scl(rtc_bus.scl);
    let rtc = Pcf85063::new(i2c);

    // -------------------- App --------------------
    let mut registry = AppRegistry::new();
    let app = registry
        .request_instance(AppConfig::default(), move |config| {
            ClockApp::new(config, rtc, WatchFace::new(), &WAKE_BUTTON, &SLEEP)
        })
        .expect("empty registry always builds");

    let boot_ms = now_ms();
    app.ui_mut().advance(boot_ms);
    if let Err(e) = app.start(boot_ms) {
        error!("Clock app start failed: {}", e);
    }
    info!("Clock live: {}", app.is_clock_live());

    // Main loop: animations, clock cadence, deferred sleep/wake work, redraw
    loop {
        let now = now_ms();

        app.ui_mut().advance(now);
        app.poll(now);

        if let Some(power) = app.service_deferred() {
            if let Err(e) = set_display_power(&mut display, &mut lcd_bl, power) {
                error!("Display power change failed: {:?}", e);
            }
        }

        if SLEEP.is_asleep() {
            continue;
        }

        let face = app.ui_mut();
        if face.take_dirty() {
            if let Err(e) = face.draw(&mut display) {
                error!("Draw failed: {:?}", e);
            }
        }
    }
}
