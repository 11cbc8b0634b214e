// This module handles board-specific pin mappings and initialization.
//! The following wiring is assumed (ESP32-S3 devkit + 1.28" GC9A01 round LCD):
//! - WAKE BUTTON => GPIO0 (BOOT button, active low, internal pull-up)
//! - LCD SCK  => GPIO10
//! - LCD MOSI => GPIO11
//! - LCD CS   => GPIO9
//! - LCD DC   => GPIO8
//! - LCD RST  => GPIO14
//! - LCD BL   => GPIO2
//! - RTC SDA  => GPIO6
//! - RTC SCL  => GPIO7
//! - GND => GND
//! - 3.3V => 3.3V
//! The PCF85063 breakout carries its own I2C pull-ups.

use esp_backtrace as _;
use esp_hal::gpio::{Input, InputConfig, Io, Level, Output, OutputConfig, Pull};
use esp_hal::peripherals::{Peripherals, GPIO10, GPIO11, GPIO6, GPIO7, I2C0, SPI2};

pub struct DisplayPins<'a> {
    pub spi2: SPI2<'a>,
    pub spi_sck: GPIO10<'a>,
    pub spi_mosi: GPIO11<'a>,
    pub lcd_cs: Output<'a>,
    pub lcd_dc: Output<'a>,
    pub lcd_rst: Output<'a>,
}

pub struct RtcBusPins<'a> {
    pub i2c0: I2C0<'a>,
    pub sda: GPIO6<'a>,
    pub scl: GPIO7<'a>,
}

pub struct BoardPins<'a> {
    pub wake_btn: Input<'a>,
    pub lcd_bl: Output<'a>,
    pub display_pins: DisplayPins<'a>,
    pub rtc_bus: RtcBusPins<'a>,
}

pub fn init_board_pins<'a>(p: Peripherals) -> (Io<'a>, BoardPins<'a>) {
    let io = Io::new(p.IO_MUX);

    // wake button; interrupt is armed later by the app
    let wake_btn = Input::new(p.GPIO0, InputConfig::default().with_pull(Pull::Up));

    // LCD control pins, GPIO10/11 stay raw for the SPI driver
    let lcd_cs  = Output::new(p.GPIO9,  Level::High, OutputConfig::default());
    let lcd_dc  = Output::new(p.GPIO8,  Level::Low,  OutputConfig::default());
    let lcd_rst = Output::new(p.GPIO14, Level::High, OutputConfig::default());
    let lcd_bl  = Output::new(p.GPIO2,  Level::High, OutputConfig::default());

    (
        io,
        BoardPins {
            wake_btn,
            lcd_bl,
            display_pins: DisplayPins {
                spi2: p.SPI2,
                spi_sck: p.GPIO10,
                spi_mosi: p.GPIO11,
                lcd_cs,
                lcd_dc,
                lcd_rst,
            },
            rtc_bus: RtcBusPins {
                i2c0: p.I2C0,
                sda: p.GPIO6,
                scl: p.GPIO7,
            },
        },
    )
}
