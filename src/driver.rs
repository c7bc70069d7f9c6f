//! High level driver session for a 16x2 display.
//!
//! `Lcd1602` owns the expander bus and mirrors the pieces of controller
//! state that cannot be read back over a write-only adapter: the display
//! control flags and the cursor position. Every command goes out through
//! the bus; the shadow state is only committed once the command byte has
//! been written successfully.

use embedded_hal::{delay::DelayNs, i2c};

use crate::commands;
use crate::pcf8574::Pcf8574Bus;
use crate::{Error, PrintOutcome};

/// Factory-default address of the common PCF8574 backpack (A0..A2 open).
pub const DEFAULT_I2C_ADDRESS: u8 = 0x27;

/// Visible columns per row.
pub const COLS: u8 = 16;
/// Visible rows.
pub const ROWS: u8 = 2;

// DDRAM row stride used for cursor addressing. The controller's second
// line actually starts at 0x40; this driver keeps the decimal stride its
// displays have always been driven with.
const ROW_STRIDE: u8 = 40;

/// Driver session for one HD44780 16x2 display behind a PCF8574 backpack.
///
/// The controller powers up with unknown state; nothing useful can be done
/// with a fresh `Lcd1602` until [`init`](Lcd1602::init) has run.
pub struct Lcd1602<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    bus: Pcf8574Bus<I2C, DELAY>,
    // shadow of the display control register
    display_on: bool,
    cursor_on: bool,
    blink_on: bool,
    // shadow of the cursor position, zero-indexed
    cursor_col: u8,
    cursor_row: u8,
}

impl<I2C, DELAY> Lcd1602<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    /// Creates a driver session using the backpack's factory default
    /// address `0x27`.
    pub fn new(i2c: I2C, delay: DELAY) -> Self {
        Self::new_with_address(i2c, DEFAULT_I2C_ADDRESS, delay)
    }

    /// Creates a driver session for a backpack with a non-default address
    /// (A0..A2 solder jumpers set).
    pub fn new_with_address(i2c: I2C, address: u8, delay: DELAY) -> Self {
        Self {
            bus: Pcf8574Bus::new(i2c, address, delay),
            display_on: true,
            cursor_on: false,
            blink_on: false,
            cursor_col: 0,
            cursor_row: 0,
        }
    }

    /// Initializes the controller into 4 bit mode and a known state:
    /// display on, cursor and blink off, cleared, cursor home, entry mode
    /// increment without display shift.
    ///
    /// Follows the HD44780 reset-by-instruction sequence. The first three
    /// transfers are raw nibbles because the controller may wake up in
    /// either bus width; only after the fourth nibble is the 4 bit
    /// protocol established and full command bytes become possible.
    pub fn init(&mut self) -> Result<&mut Self, Error<I2C>> {
        // power-on ramp
        self.bus.delay().delay_ms(20);

        // reset-by-instruction: three times "function set 8 bit"
        self.bus.write_nibble(false, 0x03)?;
        self.bus.delay().delay_ms(5);
        self.bus.write_nibble(false, 0x03)?;
        self.bus.delay().delay_us(120);
        self.bus.write_nibble(false, 0x03)?;

        // switch to 4 bit bus
        self.bus.write_nibble(false, 0x02)?;

        // 4 bit bus, 2 lines, 5x8 font
        self.bus
            .send_command(commands::function_set(false, true, false))?;
        self.bus.send_command(commands::display_control(
            self.display_on,
            self.cursor_on,
            self.blink_on,
        ))?;
        self.clear()?;
        self.bus
            .send_command(commands::entry_mode_set(true, false))?;
        self.home()?;
        Ok(self)
    }

    /// Clears the entire display and homes the cursor.
    pub fn clear(&mut self) -> Result<&mut Self, Error<I2C>> {
        self.bus.send_command(commands::LCD_CMD_CLEARDISPLAY)?;
        self.cursor_col = 0;
        self.cursor_row = 0;
        // clear is the slowest instruction the controller has
        self.bus.delay().delay_ms(2);
        Ok(self)
    }

    /// Returns the cursor to (0, 0) without touching DDRAM contents.
    pub fn home(&mut self) -> Result<&mut Self, Error<I2C>> {
        self.bus.send_command(commands::LCD_CMD_RETURNHOME)?;
        self.cursor_col = 0;
        self.cursor_row = 0;
        self.bus.delay().delay_ms(2);
        Ok(self)
    }

    /// Moves the cursor to a zero-indexed (column, row) position.
    ///
    /// The coordinates are validated before any bus traffic; an
    /// out-of-range request leaves both the display and the shadow state
    /// untouched.
    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<&mut Self, Error<I2C>> {
        if col >= COLS {
            return Err(Error::ColumnOutOfRange);
        }
        if row >= ROWS {
            return Err(Error::RowOutOfRange);
        }
        self.bus
            .send_command(commands::set_ddram_address(ROW_STRIDE * row + col))?;
        self.cursor_col = col;
        self.cursor_row = row;
        Ok(self)
    }

    /// Writes one character code at the cursor and advances the shadow
    /// cursor, wrapping from the end of row 0 to row 1 and from the end of
    /// row 1 back to (0, 0).
    ///
    /// The code is the raw controller value: 0x20..=0x7F map to the ASCII
    /// ROM glyphs, 0x00..=0x07 to the CGRAM slots.
    ///
    /// `Ok(PrintOutcome::CursorDesynced)` means the character made it to
    /// the display but the wrap repositioning command failed, so the real
    /// cursor no longer matches the shadow. Reposition with
    /// [`set_cursor`](Lcd1602::set_cursor), [`clear`](Lcd1602::clear) or
    /// [`home`](Lcd1602::home) before printing more.
    pub fn print_char(&mut self, code: u8) -> Result<PrintOutcome, Error<I2C>> {
        self.bus.write_data(code)?;
        self.cursor_col = self.cursor_col.wrapping_add(1);

        if self.cursor_col == COLS {
            let wrap_row = if self.cursor_row == 0 { 1 } else { 0 };
            if self.set_cursor(0, wrap_row).is_err() {
                return Ok(PrintOutcome::CursorDesynced);
            }
        }
        Ok(PrintOutcome::Printed)
    }

    /// Prints a string at the cursor, character by character, wrapping
    /// across rows.
    ///
    /// Characters are truncated to their low byte, so only ASCII (and raw
    /// CGRAM codes smuggled through `char`) render meaningfully. Printing
    /// halts at the first character that does not complete cleanly and the
    /// outcome of that character is returned.
    pub fn print(&mut self, text: &str) -> Result<PrintOutcome, Error<I2C>> {
        for c in text.chars() {
            match self.print_char(c as u8)? {
                PrintOutcome::Printed => {}
                desynced => return Ok(desynced),
            }
        }
        Ok(PrintOutcome::Printed)
    }

    /// Prints raw controller character codes at the cursor. Same halting
    /// behavior as [`print`](Lcd1602::print).
    pub fn print_bytes(&mut self, bytes: &[u8]) -> Result<PrintOutcome, Error<I2C>> {
        for &code in bytes {
            match self.print_char(code)? {
                PrintOutcome::Printed => {}
                desynced => return Ok(desynced),
            }
        }
        Ok(PrintOutcome::Printed)
    }

    /// Turns the whole display on or off. DDRAM contents are retained
    /// while off.
    pub fn show_display(&mut self, on: bool) -> Result<&mut Self, Error<I2C>> {
        self.bus.send_command(commands::display_control(
            on,
            self.cursor_on,
            self.blink_on,
        ))?;
        self.display_on = on;
        Ok(self)
    }

    /// Shows or hides the underline cursor.
    pub fn show_cursor(&mut self, on: bool) -> Result<&mut Self, Error<I2C>> {
        self.bus.send_command(commands::display_control(
            self.display_on,
            on,
            self.blink_on,
        ))?;
        self.cursor_on = on;
        Ok(self)
    }

    /// Enables or disables blinking of the character cell at the cursor.
    pub fn blink_cursor(&mut self, on: bool) -> Result<&mut Self, Error<I2C>> {
        self.bus.send_command(commands::display_control(
            self.display_on,
            self.cursor_on,
            on,
        ))?;
        self.blink_on = on;
        Ok(self)
    }

    /// Switches the backpack's backlight transistor on or off.
    ///
    /// The backlight pin is not a controller register, so the new level is
    /// carried out by re-sending the current display control command with
    /// the updated backlight bit on the expander. If that write fails the
    /// flag reverts to its previous value and the error is propagated.
    pub fn backlight(&mut self, on: bool) -> Result<&mut Self, Error<I2C>> {
        let previous = self.bus.backlight();
        self.bus.set_backlight(on);
        if let Err(e) = self.bus.send_command(commands::display_control(
            self.display_on,
            self.cursor_on,
            self.blink_on,
        )) {
            self.bus.set_backlight(previous);
            return Err(e);
        }
        Ok(self)
    }

    /// Whether the backlight flag is currently asserted.
    pub fn is_backlight_on(&self) -> bool {
        self.bus.backlight()
    }

    /// Shifts the entire display window one position left without moving
    /// the cursor relative to DDRAM.
    pub fn scroll_display_left(&mut self) -> Result<&mut Self, Error<I2C>> {
        self.bus.send_command(commands::shift(true, false))?;
        Ok(self)
    }

    /// Shifts the entire display window one position right.
    pub fn scroll_display_right(&mut self) -> Result<&mut Self, Error<I2C>> {
        self.bus.send_command(commands::shift(true, true))?;
        Ok(self)
    }

    /// Stores an 8 byte 5x8 glyph bitmap in a CGRAM slot and restores the
    /// cursor to its pre-call DDRAM position.
    ///
    /// Slots 0 through 6 are accepted. Slot 7 is physically present on the
    /// controller and printable through
    /// [`print_custom_char`](Lcd1602::print_custom_char), but this driver
    /// has never allowed storing into it and changing that now would break
    /// code relying on the rejection.
    pub fn create_char(&mut self, slot: u8, bitmap: [u8; 8]) -> Result<&mut Self, Error<I2C>> {
        if slot >= 7 {
            return Err(Error::GlyphSlotOutOfRange);
        }
        self.bus
            .send_command(commands::set_cgram_address(slot << 3))?;
        for row in bitmap {
            self.bus.write_data(row)?;
        }
        // leave the address counter back in DDRAM at the shadow cursor
        self.set_cursor(self.cursor_col, self.cursor_row)?;
        Ok(self)
    }

    /// Prints the glyph stored in a CGRAM slot (0..=7) at the cursor.
    pub fn print_custom_char(&mut self, slot: u8) -> Result<PrintOutcome, Error<I2C>> {
        if slot >= 8 {
            return Err(Error::GlyphSlotOutOfRange);
        }
        self.print_char(slot)
    }

    /// The shadow cursor position as (column, row).
    ///
    /// After `Ok(PrintOutcome::CursorDesynced)` the column reads 16, one
    /// past the last visible cell, until the cursor is repositioned.
    pub fn cursor_position(&self) -> (u8, u8) {
        (self.cursor_col, self.cursor_row)
    }

    /// returns the I2C peripheral. needed for finishing test mocks
    #[cfg(test)]
    pub fn i2c(&mut self) -> &mut I2C {
        self.bus.i2c()
    }
}

/// Implements the `core::fmt::Write` trait, enabling the `write!` macro.
///
/// A partial print, including a trailing cursor desync, surfaces as
/// `core::fmt::Error` since the formatting machinery cannot carry the
/// richer outcome.
impl<I2C, DELAY> core::fmt::Write for Lcd1602<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        match self.print(s) {
            Ok(PrintOutcome::Printed) => Ok(()),
            _ => Err(core::fmt::Error),
        }
    }
}

#[cfg(feature = "ufmt")]
impl<I2C, DELAY> ufmt::uWrite for Lcd1602<I2C, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    type Error = Error<I2C>;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        match self.print(s)? {
            PrintOutcome::Printed => Ok(()),
            PrintOutcome::CursorDesynced => Err(Error::Formatting(core::fmt::Error)),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
    };
    use std::vec::Vec;

    const ADDR: u8 = DEFAULT_I2C_ADDRESS;
    const BACKLIGHT: u8 = 0b0000_1000;
    const ENABLE: u8 = 0b0000_0100;
    const RS: u8 = 0b0000_0001;

    /// The three expander writes of one enable pulse for an already
    /// composed pin byte (enable bit clear).
    fn pulse(pins: u8) -> [I2cTransaction; 3] {
        [
            I2cTransaction::write(ADDR, std::vec![pins]),
            I2cTransaction::write(ADDR, std::vec![pins | ENABLE]),
            I2cTransaction::write(ADDR, std::vec![pins]),
        ]
    }

    fn nibble_writes(rs: bool, nibble: u8, backlight: bool) -> [I2cTransaction; 3] {
        let pins = (nibble << 4)
            | if backlight { BACKLIGHT } else { 0 }
            | if rs { RS } else { 0 };
        pulse(pins)
    }

    fn byte_writes(rs: bool, value: u8, backlight: bool) -> Vec<I2cTransaction> {
        let mut transactions = Vec::new();
        transactions.extend(nibble_writes(rs, value >> 4, backlight));
        transactions.extend(nibble_writes(rs, value & 0x0F, backlight));
        transactions
    }

    /// Every expander write of a full `init()`, in order.
    fn init_transactions() -> Vec<I2cTransaction> {
        let mut transactions = Vec::new();
        // reset-by-instruction nibbles, then the 4 bit switch
        transactions.extend(nibble_writes(false, 0x03, true));
        transactions.extend(nibble_writes(false, 0x03, true));
        transactions.extend(nibble_writes(false, 0x03, true));
        transactions.extend(nibble_writes(false, 0x02, true));
        // function set: 4 bit, 2 lines, 5x8
        transactions.extend(byte_writes(false, 0x28, true));
        // display control: display on, cursor off, blink off
        transactions.extend(byte_writes(false, 0x0C, true));
        // clear
        transactions.extend(byte_writes(false, 0x01, true));
        // entry mode: increment, no shift
        transactions.extend(byte_writes(false, 0x06, true));
        // home
        transactions.extend(byte_writes(false, 0x02, true));
        transactions
    }

    fn init_lcd(
        extra: &[I2cTransaction],
    ) -> Lcd1602<I2cMock, NoopDelay> {
        let mut transactions = init_transactions();
        transactions.extend_from_slice(extra);
        let mut lcd = Lcd1602::new(I2cMock::new(&transactions), NoopDelay::new());
        lcd.init().unwrap();
        lcd
    }

    #[test]
    fn test_init_sequence() {
        let mut lcd = init_lcd(&[]);
        assert_eq!(lcd.cursor_position(), (0, 0));
        assert!(lcd.is_backlight_on());
        lcd.i2c().done();
    }

    #[test]
    fn test_init_aborts_on_first_failed_write() {
        let transactions = [I2cTransaction::write(ADDR, std::vec![0b0011_1000])
            .with_error(embedded_hal::i2c::ErrorKind::Other)];
        let mut lcd = Lcd1602::new(I2cMock::new(&transactions), NoopDelay::new());

        assert!(matches!(lcd.init(), Err(Error::I2c(_))));
        lcd.i2c().done();
    }

    #[test]
    fn test_set_cursor_sends_ddram_address() {
        // (5, 1) -> DDRAM address 45 -> command 0xAD
        let mut lcd = init_lcd(&byte_writes(false, 0xAD, true));

        assert!(lcd.set_cursor(5, 1).is_ok());
        assert_eq!(lcd.cursor_position(), (5, 1));
        lcd.i2c().done();
    }

    #[test]
    fn test_set_cursor_rejects_out_of_range_without_traffic() {
        let mut lcd = init_lcd(&[]);

        assert!(matches!(lcd.set_cursor(16, 0), Err(Error::ColumnOutOfRange)));
        assert!(matches!(lcd.set_cursor(0, 2), Err(Error::RowOutOfRange)));
        assert_eq!(lcd.cursor_position(), (0, 0));
        lcd.i2c().done();
    }

    #[test]
    fn test_print_advances_cursor() {
        let mut lcd = init_lcd(&byte_writes(true, b'A', true));

        assert!(matches!(lcd.print("A"), Ok(PrintOutcome::Printed)));
        assert_eq!(lcd.cursor_position(), (1, 0));
        lcd.i2c().done();
    }

    #[test]
    fn test_print_wraps_to_second_row() {
        let mut extra = Vec::new();
        for c in b'A'..=b'P' {
            extra.extend(byte_writes(true, c, true));
        }
        // wrap reposition to (0, 1): DDRAM address 40 -> command 0xA8
        extra.extend(byte_writes(false, 0xA8, true));
        let mut lcd = init_lcd(&extra);

        assert!(matches!(
            lcd.print("ABCDEFGHIJKLMNOP"),
            Ok(PrintOutcome::Printed)
        ));
        assert_eq!(lcd.cursor_position(), (0, 1));
        lcd.i2c().done();
    }

    #[test]
    fn test_print_wraps_from_second_row_to_home() {
        let mut extra = Vec::new();
        for _ in 0..16 {
            extra.extend(byte_writes(true, b'x', true));
        }
        extra.extend(byte_writes(false, 0xA8, true)); // to (0, 1)
        for _ in 0..16 {
            extra.extend(byte_writes(true, b'x', true));
        }
        extra.extend(byte_writes(false, 0x80, true)); // back to (0, 0)
        let mut lcd = init_lcd(&extra);

        let text = core::str::from_utf8(&[b'x'; 32]).unwrap();
        assert!(matches!(lcd.print(text), Ok(PrintOutcome::Printed)));
        assert_eq!(lcd.cursor_position(), (0, 0));
        lcd.i2c().done();
    }

    #[test]
    fn test_print_halts_on_cursor_desync() {
        let mut extra = Vec::new();
        for _ in 0..16 {
            extra.extend(byte_writes(true, b'y', true));
        }
        // first expander write of the wrap reposition fails
        extra.push(
            I2cTransaction::write(ADDR, std::vec![0b1010_1000])
                .with_error(embedded_hal::i2c::ErrorKind::Other),
        );
        let mut lcd = init_lcd(&extra);

        let text = core::str::from_utf8(&[b'y'; 20]).unwrap();
        // all sixteen characters landed; the reposition did not
        assert!(matches!(lcd.print(text), Ok(PrintOutcome::CursorDesynced)));
        assert_eq!(lcd.cursor_position(), (16, 0));
        lcd.i2c().done();
    }

    #[test]
    fn test_print_data_write_failure_is_an_error() {
        let extra = [I2cTransaction::write(ADDR, std::vec![0b0100_1001])
            .with_error(embedded_hal::i2c::ErrorKind::Other)];
        let mut lcd = init_lcd(&extra);

        assert!(matches!(lcd.print("Hi"), Err(Error::I2c(_))));
        lcd.i2c().done();
    }

    #[test]
    fn test_create_char_stores_and_restores_cursor() {
        let bitmap = [0x0A, 0x15, 0x0A, 0x15, 0x0A, 0x15, 0x0A, 0x15];
        let mut extra = Vec::new();
        // set cursor to (3, 0) first: DDRAM address 3 -> command 0x83
        extra.extend(byte_writes(false, 0x83, true));
        // CGRAM slot 3 -> address 24 -> command 0x58
        extra.extend(byte_writes(false, 0x58, true));
        for row in bitmap {
            extra.extend(byte_writes(true, row, true));
        }
        // restore to the shadow cursor (3, 0)
        extra.extend(byte_writes(false, 0x83, true));
        let mut lcd = init_lcd(&extra);

        lcd.set_cursor(3, 0).unwrap();
        assert!(lcd.create_char(3, bitmap).is_ok());
        assert_eq!(lcd.cursor_position(), (3, 0));
        lcd.i2c().done();
    }

    #[test]
    fn test_create_char_rejects_slot_seven() {
        let mut lcd = init_lcd(&[]);

        assert!(matches!(
            lcd.create_char(7, [0; 8]),
            Err(Error::GlyphSlotOutOfRange)
        ));
        lcd.i2c().done();
    }

    #[test]
    fn test_print_custom_char_accepts_all_eight_slots() {
        let mut lcd = init_lcd(&byte_writes(true, 7, true));

        assert!(matches!(
            lcd.print_custom_char(7),
            Ok(PrintOutcome::Printed)
        ));
        assert!(matches!(
            lcd.print_custom_char(8),
            Err(Error::GlyphSlotOutOfRange)
        ));
        lcd.i2c().done();
    }

    #[test]
    fn test_backlight_off_clears_bit_on_later_traffic() {
        let mut extra = Vec::new();
        // display control resend without the backlight bit
        extra.extend(byte_writes(false, 0x0C, false));
        // a subsequent print also goes out dark
        extra.extend(byte_writes(true, b'A', false));
        let mut lcd = init_lcd(&extra);

        assert!(lcd.backlight(false).is_ok());
        assert!(!lcd.is_backlight_on());
        assert!(matches!(lcd.print("A"), Ok(PrintOutcome::Printed)));
        lcd.i2c().done();
    }

    #[test]
    fn test_backlight_flag_reverts_on_bus_failure() {
        // first expander write of the display control resend, dark
        let extra = [I2cTransaction::write(ADDR, std::vec![0b0000_0000])
            .with_error(embedded_hal::i2c::ErrorKind::Other)];
        let mut lcd = init_lcd(&extra);

        assert!(matches!(lcd.backlight(false), Err(Error::I2c(_))));
        assert!(lcd.is_backlight_on());
        lcd.i2c().done();
    }

    #[test]
    fn test_display_control_toggles_chain() {
        let mut extra = Vec::new();
        extra.extend(byte_writes(false, 0x0E, true)); // + cursor
        extra.extend(byte_writes(false, 0x0F, true)); // + blink
        extra.extend(byte_writes(false, 0x0B, true)); // - display
        let mut lcd = init_lcd(&extra);

        assert!(lcd
            .show_cursor(true)
            .and_then(|lcd| lcd.blink_cursor(true))
            .and_then(|lcd| lcd.show_display(false))
            .is_ok());
        lcd.i2c().done();
    }

    #[test]
    fn test_toggle_failure_leaves_shadow_unchanged() {
        let mut extra = Vec::new();
        // show_cursor(true) fails on its first expander write
        extra.push(
            I2cTransaction::write(ADDR, std::vec![0b0000_1000])
                .with_error(embedded_hal::i2c::ErrorKind::Other),
        );
        // the next display control command still encodes cursor off
        extra.extend(byte_writes(false, 0x0D, true));
        let mut lcd = init_lcd(&extra);

        assert!(lcd.show_cursor(true).is_err());
        assert!(lcd.blink_cursor(true).is_ok());
        lcd.i2c().done();
    }

    #[test]
    fn test_scroll_commands() {
        let mut extra = Vec::new();
        extra.extend(byte_writes(false, 0x18, true));
        extra.extend(byte_writes(false, 0x1C, true));
        let mut lcd = init_lcd(&extra);

        assert!(lcd.scroll_display_left().is_ok());
        assert!(lcd.scroll_display_right().is_ok());
        assert_eq!(lcd.cursor_position(), (0, 0));
        lcd.i2c().done();
    }

    #[test]
    fn test_write_macro() {
        use core::fmt::Write;

        let mut extra = Vec::new();
        for c in b"T=42" {
            extra.extend(byte_writes(true, *c, true));
        }
        let mut lcd = init_lcd(&extra);

        assert!(write!(lcd, "T={}", 42).is_ok());
        assert_eq!(lcd.cursor_position(), (4, 0));
        lcd.i2c().done();
    }
}
