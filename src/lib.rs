#![cfg_attr(not(test), no_std)]

pub mod animation;
pub mod app;
pub mod clock_face;
pub mod recorder;
pub mod registry;
pub mod rtc_pcf85063;
pub mod scheduler;
pub mod sleep;
pub mod time_source;
pub mod ui;

cfg_if::cfg_if! {
    if #[cfg(feature = "esp32s3")] {
        pub mod input;
        pub mod wiring;
    }
}

#[cfg(feature = "devkit-esp32s3-disp128")]
pub mod display;
