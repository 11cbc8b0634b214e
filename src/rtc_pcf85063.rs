// RTC driver for PCF85063A/PCF85063TP real-time clock chips.
// Datasheet: https://files.waveshare.com/wiki/common/Pcf85063atl1118-NdPQpTGE-loeW7GbZ7.pdf

use embedded_hal::i2c::I2c;

use crate::time_source::{TimeReading, TimeSource};

pub const DEFAULT_I2C_ADDR: u8 = 0x51;

const REG_CONTROL_1: u8 = 0x00;
const REG_SECONDS: u8 = 0x04; // sec, min, hour, day, weekday, month, year

const CONTROL_1_STOP: u8 = 0x20; // RTC clock stopped
const SECONDS_OS: u8 = 0x80; // oscillator stopped, time unreliable

#[derive(Debug)]
pub enum RtcError<E> {
    Bus(E),
    OscillatorStopped,
    InvalidReading,
}

impl<E> From<E> for RtcError<E> {
    fn from(e: E) -> Self {
        RtcError::Bus(e)
    }
}

pub struct Pcf85063<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> Pcf85063<I2C>
where
    I2C: I2c<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self { i2c, address: DEFAULT_I2C_ADDR }
    }

    pub fn into_inner(self) -> I2C {
        self.i2c
    }

    // Probe the chip and make sure the clock is counting.
    fn init(&mut self) -> Result<(), RtcError<E>> {
        let ctrl = self.read_reg(REG_CONTROL_1)?;
        if ctrl & CONTROL_1_STOP != 0 {
            self.i2c.write(self.address, &[REG_CONTROL_1, ctrl & !CONTROL_1_STOP])?;
        }

        // OS flag survives until the time is written, so a set flag means
        // the chip lost power since it was last set.
        if self.read_reg(REG_SECONDS)? & SECONDS_OS != 0 {
            return Err(RtcError::OscillatorStopped);
        }
        Ok(())
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, E> {
        let mut out = [0u8];
        self.i2c.write_read(self.address, &[reg], &mut out)?;
        Ok(out[0])
    }

    pub fn read_datetime(&mut self) -> Result<TimeReading, RtcError<E>> {
        let mut buf = [0u8; 7];
        self.i2c.write_read(self.address, &[REG_SECONDS], &mut buf)?;
        let reading = TimeReading {
            second: bcd_decode(buf[0] & 0x7F),
            minute: bcd_decode(buf[1] & 0x7F),
            hour: bcd_decode(buf[2] & 0x3F),
            day: bcd_decode(buf[3] & 0x3F),
            weekday: buf[4] & 0x07,
            month: bcd_decode(buf[5] & 0x1F),
        };
        if !reading.is_valid() {
            return Err(RtcError::InvalidReading);
        }
        Ok(reading)
    }

    // Set datetime. Writing the seconds register also clears the OS flag.
    pub fn set_datetime(&mut self, dt: &TimeReading, year: u16) -> Result<(), RtcError<E>> {
        if !dt.is_valid() {
            return Err(RtcError::InvalidReading);
        }
        let data = [
            REG_SECONDS,
            bcd_encode(dt.second),
            bcd_encode(dt.minute),
            bcd_encode(dt.hour),
            bcd_encode(dt.day),
            dt.weekday,
            bcd_encode(dt.month),
            bcd_encode((year % 100) as u8),
        ];
        self.i2c.write(self.address, &data)?;
        Ok(())
    }
}

impl<I2C, E> TimeSource for Pcf85063<I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    type Error = RtcError<E>;

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.init()
    }

    fn now(&mut self) -> Result<TimeReading, Self::Error> {
        self.read_datetime()
    }
}

// BCD encode/decode helpers
fn bcd_decode(v: u8) -> u8 {
    (v & 0x0F) + ((v >> 4) * 10)
}

// BCD encode
fn bcd_encode(v: u8) -> u8 {
    ((v / 10) << 4) | (v % 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    // Register file behind a fake bus: first written byte sets the pointer.
    struct FakeBus {
        regs: [u8; 0x12],
        present: bool,
    }

    impl FakeBus {
        fn new() -> Self {
            Self { regs: [0; 0x12], present: true }
        }
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
            if !self.present || address != DEFAULT_I2C_ADDR {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            let mut ptr = 0usize;
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        if let Some((reg, rest)) = bytes.split_first() {
                            ptr = *reg as usize;
                            for b in rest {
                                self.regs[ptr] = *b;
                                ptr += 1;
                            }
                        }
                    }
                    Operation::Read(buf) => {
                        for b in buf.iter_mut() {
                            *b = self.regs[ptr];
                            ptr += 1;
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn bcd_helpers_agree() {
        assert_eq!(bcd_decode(0x59), 59);
        assert_eq!(bcd_encode(59), 0x59);
        assert_eq!(bcd_decode(bcd_encode(7)), 7);
    }

    #[test]
    fn decodes_time_registers() {
        let mut bus = FakeBus::new();
        // 21:07:45, Friday 12 Dec
        bus.regs[0x04..0x0B].copy_from_slice(&[0x45, 0x07, 0x21, 0x12, 5, 0x12, 0x25]);
        let mut rtc = Pcf85063::new(bus);
        rtc.begin().unwrap();
        let t = rtc.now().unwrap();
        assert_eq!(t, TimeReading { hour: 21, minute: 7, second: 45, day: 12, weekday: 5, month: 12 });
    }

    #[test]
    fn begin_restarts_stopped_clock() {
        let mut bus = FakeBus::new();
        bus.regs[REG_CONTROL_1 as usize] = CONTROL_1_STOP | 0x01;
        bus.regs[0x07] = 0x01;
        bus.regs[0x09] = 0x01;
        let mut rtc = Pcf85063::new(bus);
        rtc.begin().unwrap();
        assert_eq!(rtc.into_inner().regs[REG_CONTROL_1 as usize], 0x01);
    }

    #[test]
    fn begin_fails_on_oscillator_stop_or_missing_chip() {
        let mut bus = FakeBus::new();
        bus.regs[0x04] = SECONDS_OS;
        let mut rtc = Pcf85063::new(bus);
        assert!(matches!(rtc.begin(), Err(RtcError::OscillatorStopped)));

        let mut gone = FakeBus::new();
        gone.present = false;
        let mut rtc = Pcf85063::new(gone);
        assert!(matches!(rtc.begin(), Err(RtcError::Bus(_))));
    }

    #[test]
    fn set_then_read_clears_oscillator_flag() {
        let mut bus = FakeBus::new();
        bus.regs[0x04] = SECONDS_OS;
        let mut rtc = Pcf85063::new(bus);
        let t = TimeReading { hour: 0, minute: 58, second: 0, day: 12, weekday: 5, month: 12 };
        rtc.set_datetime(&t, 2025).unwrap();
        rtc.begin().unwrap();
        assert_eq!(rtc.now().unwrap(), t);
        assert_eq!(rtc.into_inner().regs[0x0A], 0x25);
    }

    #[test]
    fn garbage_registers_are_rejected() {
        let mut bus = FakeBus::new();
        // month 0 never comes out of a running chip
        bus.regs[0x04..0x0B].copy_from_slice(&[0x00, 0x00, 0x00, 0x01, 0, 0x00, 0x25]);
        let mut rtc = Pcf85063::new(bus);
        assert!(matches!(rtc.now(), Err(RtcError::InvalidReading)));
    }
}
