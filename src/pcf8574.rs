#![allow(dead_code)]
//! Nibble/byte transaction encoder for the PCF8574 backpack.
//!
//! The HD44780's 4 bit parallel bus is emulated through the expander's eight
//! quasi-bidirectional pins, so every logical byte costs two nibble
//! transfers, and every nibble transfer costs three I2C writes (data
//! presented, enable high, enable low) plus the controller's latch delay.

use bitfield::bitfield;
use embedded_hal::{delay::DelayNs, i2c};

use crate::Error;

// Pin mapping of the common PCF8574 backpack wiring:
//
//                 +--------------------------------+
// expander ->     | P7  P6  P5  P4  P3  P2  P1  P0 |
//                 +--------------------------------+
//                   |   |   |   |   |   |   |   |
//                 +--------------------------------+
// LCD module ->   | D7  D6  D5  D4   K   E  RW  RS |
//                 +--------------------------------+
bitfield! {
    pub struct ExpanderPins(u8);
    impl Debug;
    pub rs, set_rs: 0, 0;
    pub rw, set_rw: 1, 1;
    pub enable, set_enable: 2, 2;
    pub backlight, set_backlight: 3, 3;
    pub data, set_data: 7, 4;
}

/// The write-only expander bus carrying one HD44780 behind a PCF8574.
///
/// Owns the I2C peripheral, the target address, the delay provider, and the
/// locally asserted backlight bit that rides along on every transaction.
pub struct Pcf8574Bus<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    i2c: I2C,
    address: u8,
    delay: DELAY,
    backlight: bool,
}

impl<I2C, DELAY> Pcf8574Bus<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    pub fn new(i2c: I2C, address: u8, delay: DELAY) -> Self {
        Self {
            i2c,
            address,
            delay,
            backlight: true,
        }
    }

    /// Whether the backlight bit is currently asserted on transactions.
    pub fn backlight(&self) -> bool {
        self.backlight
    }

    /// Set the backlight bit carried on every subsequent transaction byte.
    /// Takes effect on the next expander write; no traffic of its own.
    pub fn set_backlight(&mut self, on: bool) {
        self.backlight = on;
    }

    pub fn delay(&mut self) -> &mut DELAY {
        &mut self.delay
    }

    /// returns the I2C peripheral. needed for finishing test mocks
    #[cfg(test)]
    pub fn i2c(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    fn write_pins(&mut self, pins: u8) -> Result<(), Error<I2C>> {
        self.i2c
            .write(self.address, &[pins])
            .map_err(Error::I2c)
    }

    /// Transfer one nibble to the controller with an enable pulse.
    ///
    /// The data and control lines are presented with enable low, then enable
    /// is raised for at least 1 us and dropped again; the controller latches
    /// on the falling edge and needs 50 us to settle before the next
    /// transfer. Any failing I2C write aborts the pulse immediately.
    pub fn write_nibble(&mut self, rs: bool, nibble: u8) -> Result<(), Error<I2C>> {
        let mut pins = ExpanderPins(0);
        pins.set_data(nibble & 0x0F);
        pins.set_backlight(self.backlight as u8);
        pins.set_rw(0);
        pins.set_rs(rs as u8);

        self.write_pins(pins.0)?;

        pins.set_enable(1);
        self.write_pins(pins.0)?;
        self.delay.delay_us(1);

        pins.set_enable(0);
        self.write_pins(pins.0)?;
        self.delay.delay_us(50);

        Ok(())
    }

    /// Transfer a full byte as two nibbles, high nibble first per the
    /// HD44780 4 bit protocol.
    pub fn write_byte(&mut self, rs: bool, value: u8) -> Result<(), Error<I2C>> {
        self.write_nibble(rs, value >> 4)?;
        self.write_nibble(rs, value & 0x0F)
    }

    /// Write a command byte to the instruction register.
    pub fn send_command(&mut self, command: u8) -> Result<(), Error<I2C>> {
        self.write_byte(false, command)
    }

    /// Write a data byte to the data register (CGRAM or DDRAM, depending on
    /// the prior address command).
    pub fn write_data(&mut self, value: u8) -> Result<(), Error<I2C>> {
        self.write_byte(true, value)
    }
}
