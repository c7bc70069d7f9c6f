//! HD44780 instruction set, expressed as pure bit-field builders.
//!
//! These functions only pack bits; they perform no I/O and no range
//! validation. Callers are expected to validate semantic ranges (cursor
//! coordinates, CGRAM slots) before building a command byte.

// commands
pub const LCD_CMD_CLEARDISPLAY: u8 = 0x01; //  Clear display, set cursor position to zero
pub const LCD_CMD_RETURNHOME: u8 = 0x02; //  Set cursor position to zero
pub const LCD_CMD_ENTRYMODESET: u8 = 0x04; //  Sets the entry mode
pub const LCD_CMD_DISPLAYCONTROL: u8 = 0x08; //  Display on/off, cursor, blink
pub const LCD_CMD_CURSORSHIFT: u8 = 0x10; //  Moves the cursor or shifts the display
pub const LCD_CMD_FUNCTIONSET: u8 = 0x20; //  Bus width, line count, font
pub const LCD_CMD_SETCGRAMADDR: u8 = 0x40; //  Sets the CGRAM (character generator RAM) address
pub const LCD_CMD_SETDDRAMADDR: u8 = 0x80; //  Sets the DDRAM (display data RAM) address

// flags for display entry mode
const LCD_FLAG_ENTRYINCREMENT: u8 = 0x02; //  Cursor moves right after a write
const LCD_FLAG_ENTRYSHIFT: u8 = 0x01; //  Display shifts instead of the cursor

// flags for display on/off control
const LCD_FLAG_DISPLAYON: u8 = 0x04; //  Turns the display on
const LCD_FLAG_CURSORON: u8 = 0x02; //  Turns the cursor on
const LCD_FLAG_BLINKON: u8 = 0x01; //  Turns on the blinking cursor

// flags for cursor/display shift
const LCD_FLAG_DISPLAYMOVE: u8 = 0x08; //  Shift the display rather than the cursor
const LCD_FLAG_MOVERIGHT: u8 = 0x04; //  Shift to the right

// flags for function set
const LCD_FLAG_8BITMODE: u8 = 0x10; //  8 bit bus
const LCD_FLAG_2LINE: u8 = 0x08; //  2 line mode
const LCD_FLAG_5x10_DOTS: u8 = 0x04; //  10 pixel high font

/// Entry Mode Set: cursor move direction and display shift on write.
pub const fn entry_mode_set(increment: bool, shift: bool) -> u8 {
    LCD_CMD_ENTRYMODESET
        | if increment { LCD_FLAG_ENTRYINCREMENT } else { 0 }
        | if shift { LCD_FLAG_ENTRYSHIFT } else { 0 }
}

/// Display Control: display, cursor, and blink visibility.
pub const fn display_control(display_on: bool, cursor_on: bool, blink_on: bool) -> u8 {
    LCD_CMD_DISPLAYCONTROL
        | if display_on { LCD_FLAG_DISPLAYON } else { 0 }
        | if cursor_on { LCD_FLAG_CURSORON } else { 0 }
        | if blink_on { LCD_FLAG_BLINKON } else { 0 }
}

/// Cursor/Display Shift: moves the cursor or shifts the display window
/// without touching DDRAM contents.
pub const fn shift(display_shift: bool, right: bool) -> u8 {
    LCD_CMD_CURSORSHIFT
        | if display_shift { LCD_FLAG_DISPLAYMOVE } else { 0 }
        | if right { LCD_FLAG_MOVERIGHT } else { 0 }
}

/// Function Set: bus width, line count, and font height.
pub const fn function_set(eight_bit_bus: bool, two_lines: bool, tall_font: bool) -> u8 {
    LCD_CMD_FUNCTIONSET
        | if eight_bit_bus { LCD_FLAG_8BITMODE } else { 0 }
        | if two_lines { LCD_FLAG_2LINE } else { 0 }
        | if tall_font { LCD_FLAG_5x10_DOTS } else { 0 }
}

/// Set CGRAM Address. The address is masked to the controller's 6 bit
/// CGRAM address space (8 glyph slots of 8 bytes each).
pub const fn set_cgram_address(address: u8) -> u8 {
    LCD_CMD_SETCGRAMADDR | (address & 0x3F)
}

/// Set DDRAM Address. The address is masked to the controller's 7 bit
/// DDRAM address space.
pub const fn set_ddram_address(address: u8) -> u8 {
    LCD_CMD_SETDDRAMADDR | (address & 0x7F)
}
