//! Display setup and power control.
//
// - `setup_display` brings up the GC9A01 (240x240, D/C) through mipidsi.
// - `set_display_power` applies the sleep/wake transitions the app hands back
//   from the wake button, outside of interrupt context.

use esp_backtrace as _;

use esp_hal::{
    gpio::Output,
    spi::master::{Config as SpiConfig, Spi},
    spi::Mode,
    time::Rate,
    Blocking,
};

use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use mipidsi::interface::SpiInterface;
use mipidsi::{
    models::GC9A01,
    options::{ColorInversion, ColorOrder, Orientation, Rotation},
    Builder as DisplayBuilder,
};

use crate::app::DisplayPower;
use crate::ui::RESOLUTION;
use crate::wiring::DisplayPins;

// A tiny busy-wait delay that satisfies embedded-hal 1.0 DelayNs.
pub struct SpinDelay;

impl embedded_hal::delay::DelayNs for SpinDelay {
    #[inline]
    fn delay_ns(&mut self, ns: u32) {
        let mut n = ns / 50 + 1;
        while n != 0 { core::hint::spin_loop(); n -= 1; }
    }
    #[inline]
    fn delay_us(&mut self, us: u32) { for _ in 0..us { self.delay_ns(1_000); } }
    #[inline]
    fn delay_ms(&mut self, ms: u32) { for _ in 0..ms { self.delay_us(1_000); } }
}

pub type DisplayType<'a> = mipidsi::Display<
    SpiInterface<'a,
        ExclusiveDevice<Spi<'a, Blocking>, Output<'a>, NoDelay>,
        Output<'a>,
    >,
    GC9A01,
    Output<'a>,
>;

#[derive(Debug)]
pub enum DisplayError {
    SpiConfig,
    ChipSelect,
    PanelInit,
    Bus,
}

pub fn setup_display<'a>(
    display_pins: DisplayPins<'a>,
    display_buf: &'a mut [u8],
) -> Result<DisplayType<'a>, DisplayError> {
    let DisplayPins {
        spi2,
        spi_sck,
        spi_mosi,
        lcd_cs,
        lcd_dc,
        mut lcd_rst,
    } = display_pins;

    // Hardware reset
    lcd_rst.set_low();
    for _ in 0..10000 { core::hint::spin_loop(); }
    lcd_rst.set_high();

    // SPI @ 40 MHz, Mode 0
    let spi_cfg = SpiConfig::default()
        .with_frequency(Rate::from_hz(40_000_000))
        .with_mode(Mode::_0);

    let spi = Spi::new(spi2, spi_cfg)
        .map_err(|_| DisplayError::SpiConfig)?
        .with_sck(spi_sck)
        .with_mosi(spi_mosi);

    // SPI device + DisplayInterface (needs D/C and a buffer)
    let spi_dev = ExclusiveDevice::new(spi, lcd_cs, NoDelay).map_err(|_| DisplayError::ChipSelect)?;
    let di = SpiInterface::new(spi_dev, lcd_dc, display_buf);
    let mut delay = SpinDelay;

    DisplayBuilder::new(GC9A01, di)
        .display_size(RESOLUTION as u16, RESOLUTION as u16)
        .display_offset(0, 0)
        .orientation(Orientation::new().rotate(Rotation::Deg180))
        .invert_colors(ColorInversion::Inverted)
        .color_order(ColorOrder::Bgr)
        .reset_pin(lcd_rst)
        .init(&mut delay)
        .map_err(|_| DisplayError::PanelInit)
}

/// Backlight goes off before panel sleep and on after panel wake.
pub fn set_display_power(
    display: &mut DisplayType<'_>,
    backlight: &mut Output<'_>,
    power: DisplayPower,
) -> Result<(), DisplayError> {
    let mut delay = SpinDelay;
    match power {
        DisplayPower::Off => {
            backlight.set_low();
            display.sleep(&mut delay).map_err(|_| DisplayError::Bus)
        }
        DisplayPower::On => {
            display.wake(&mut delay).map_err(|_| DisplayError::Bus)?;
            backlight.set_high();
            Ok(())
        }
    }
}
