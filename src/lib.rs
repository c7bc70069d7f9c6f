//! This Rust `embedded-hal`-based library drives a [HD44780](https://en.wikipedia.org/wiki/Hitachi_HD44780_LCD_controller)
//! compatible 16x2 character display through a PCF8574-based "I2C backpack" in an embedded, `no_std` environment.
//! These adapters are ubiquitous on eBay and AliExpress and have no clear branding; some character display makers
//! integrate the PCF8574T directly on the display board. The most common pin wiring connects the display's 4-bit
//! data pins to P4-P7 of the PCF8574, with RS, RW and enable on P0-P2 and the backlight transistor on P3. This
//! library supports that configuration.
//!
//! Key features include:
//! - Convenient high-level API for controlling the display
//! - Line wrapping from the end of row 0 to row 1 and back while printing
//! - Support for custom characters
//! - Backlight control
//! - `core::fmt::Write` implementation for easy use with the `write!` macro
//! - Compatible with the `embedded-hal` traits v1.0 and later
//! - Optional support for the `defmt` and `ufmt` logging frameworks
//!
//! ## Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! lcd1602-pcf8574 = { version = "0.1", features = ["defmt"] }
//! ```
//! The `features = ["defmt"]` line is optional and enables the `defmt` feature, which allows the library's errors
//! to be used with the `defmt` logging framework. Another optional feature is `features = ["ufmt"]`, which enables
//! the `ufmt` feature, allowing the `uwriteln!` and `uwrite!` macros to be used.
//!
//! Then create the driver with your board's I2C peripheral and delay provider:
//! ```rust
//! use lcd1602_pcf8574::Lcd1602;
//!
//! // board setup
//! let i2c = ...; // I2C peripheral
//! let delay = ...; // DelayNs implementation
//!
//! // backpack at the factory default address 0x27
//! let mut lcd = Lcd1602::new(i2c, delay);
//! // or with the A0..A2 jumpers set
//! let mut lcd = Lcd1602::new_with_address(i2c, 0x20, delay);
//! ```
//! Initialize the display:
//! ```rust
//! if let Err(e) = lcd.init() {
//!    panic!("Error initializing LCD: {}", e);
//! }
//! ```
//! Use the display:
//! ```rust
//! // set up the display
//! lcd.backlight(true)?.clear()?.home()?;
//! // print a message
//! lcd.print("Hello, world!")?;
//! // can also use the `core::fmt::write!` macro
//! use core::fmt::Write;
//!
//! write!(lcd, "Hello, world!")?;
//! ```
//! The configuration methods return a `Result` that wraps the display object in `Ok()`, allowing for easy chaining
//! of commands. For example:
//! ```rust
//! lcd.backlight(true)?.clear()?.home()?;
//! ```
//! Printing methods instead return a [`PrintOutcome`]: the adapter is write-only, so once a wrap repositioning
//! command fails the driver can no longer know where the controller's cursor really is.
//! `Ok(PrintOutcome::CursorDesynced)` reports exactly that case; recover by repositioning with `set_cursor`,
//! `clear` or `home`.
#![no_std]

use core::fmt::Display;

use embedded_hal::i2c;

pub mod commands;
mod driver;
mod pcf8574;

pub use driver::{Lcd1602, COLS, DEFAULT_I2C_ADDRESS, ROWS};
pub use pcf8574::Pcf8574Bus;

/// Errors that can occur when driving the display
#[derive(Debug)]
pub enum Error<I2C>
where
    I2C: i2c::I2c,
{
    /// I2C error returned from the underlying I2C implementation
    I2c(I2C::Error),
    /// Row is out of range
    RowOutOfRange,
    /// Column is out of range
    ColumnOutOfRange,
    /// Custom character slot is out of range
    GlyphSlotOutOfRange,
    /// Formatting error
    Formatting(core::fmt::Error),
}

/// How a print call left the cursor.
///
/// Distinct from [`Error`]: both variants mean every requested character
/// reached the display.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PrintOutcome {
    /// All characters written, shadow cursor in sync with the controller.
    Printed,
    /// All characters written, but the wrap repositioning command failed,
    /// so the controller's cursor no longer matches the driver's. Printing
    /// again before repositioning lands characters at unpredictable
    /// addresses.
    CursorDesynced,
}

impl<I2C> From<core::fmt::Error> for Error<I2C>
where
    I2C: i2c::I2c,
{
    fn from(err: core::fmt::Error) -> Self {
        Error::Formatting(err)
    }
}

impl<I2C> From<&Error<I2C>> for &'static str
where
    I2C: i2c::I2c,
{
    fn from(err: &Error<I2C>) -> Self {
        match err {
            Error::I2c(_) => "I2C error",
            Error::RowOutOfRange => "Row out of range",
            Error::ColumnOutOfRange => "Column out of range",
            Error::GlyphSlotOutOfRange => "Custom character slot out of range",
            Error::Formatting(_) => "Formatting error",
        }
    }
}

#[cfg(feature = "defmt")]
impl<I2C> defmt::Format for Error<I2C>
where
    I2C: i2c::I2c,
{
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl<I2C> ufmt::uDisplay for Error<I2C>
where
    I2C: i2c::I2c,
{
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl<I2C> Display for Error<I2C>
where
    I2C: i2c::I2c,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

#[cfg(test)]
mod lib_tests {
    extern crate std;
    use super::*;
    use embedded_hal_mock::eh1::i2c::Mock as I2cMock;
    use std::string::String;

    #[test]
    fn test_error_messages() {
        use core::fmt::Write;

        let err: Error<I2cMock> = Error::ColumnOutOfRange;
        let mut rendered = String::new();
        write!(rendered, "{}", err).unwrap();
        assert_eq!(rendered, "Column out of range");

        let msg: &'static str = (&Error::<I2cMock>::GlyphSlotOutOfRange).into();
        assert_eq!(msg, "Custom character slot out of range");
    }

    #[test]
    fn test_formatting_error_conversion() {
        let err: Error<I2cMock> = core::fmt::Error.into();
        assert!(matches!(err, Error::Formatting(_)));
    }
}
