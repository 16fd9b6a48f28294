//! Kenwood operating mode codes.
//!
//! Status (`IF`) and info (`XI`) frames carry the operating mode as a single
//! digit. Codes 1-9 map to a fixed table; 0 and anything larger are invalid
//! and are reported as [`Error::InvalidModeCode`], never defaulted.
//!
//! | Code | Mode  |
//! |------|-------|
//! | 1    | LSB   |
//! | 2    | USB   |
//! | 3    | CW    |
//! | 4    | FM    |
//! | 5    | AM    |
//! | 6    | FSK   |
//! | 7    | CW-R  |
//! | 8    | None  |
//! | 9    | FSK-R |

use std::fmt;

use kwdcat_core::{Error, Result};

/// Human-readable operating mode decoded from a Kenwood mode code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeName {
    Lsb,
    Usb,
    Cw,
    Fm,
    Am,
    Fsk,
    CwR,
    /// Code 8 is unassigned on the rigs this table comes from.
    None,
    FskR,
}

/// Mode table indexed by code; slot 0 is never returned.
const MODE_TABLE: [Option<ModeName>; 10] = [
    Option::None,
    Some(ModeName::Lsb),
    Some(ModeName::Usb),
    Some(ModeName::Cw),
    Some(ModeName::Fm),
    Some(ModeName::Am),
    Some(ModeName::Fsk),
    Some(ModeName::CwR),
    Some(ModeName::None),
    Some(ModeName::FskR),
];

impl ModeName {
    /// Look up the mode for a numeric code in 1-9.
    ///
    /// # Example
    ///
    /// ```
    /// use kwdcat::ModeName;
    ///
    /// assert_eq!(ModeName::from_code(2).unwrap(), ModeName::Usb);
    /// assert!(ModeName::from_code(0).is_err());
    /// ```
    pub fn from_code(code: u8) -> Result<ModeName> {
        MODE_TABLE
            .get(code as usize)
            .copied()
            .flatten()
            .ok_or(Error::InvalidModeCode(code))
    }

    /// Look up the mode for a code digit as it appears in a frame.
    pub fn from_digit(digit: char) -> Result<ModeName> {
        match digit.to_digit(10) {
            Some(code) => ModeName::from_code(code as u8),
            // Not a digit at all; report the raw byte value.
            Option::None => Err(Error::InvalidModeCode(u8::try_from(digit).unwrap_or(u8::MAX))),
        }
    }

    /// The numeric code for this mode.
    pub fn code(self) -> u8 {
        match self {
            ModeName::Lsb => 1,
            ModeName::Usb => 2,
            ModeName::Cw => 3,
            ModeName::Fm => 4,
            ModeName::Am => 5,
            ModeName::Fsk => 6,
            ModeName::CwR => 7,
            ModeName::None => 8,
            ModeName::FskR => 9,
        }
    }

    /// Display label (e.g. `"CW-R"`).
    pub fn label(self) -> &'static str {
        match self {
            ModeName::Lsb => "LSB",
            ModeName::Usb => "USB",
            ModeName::Cw => "CW",
            ModeName::Fm => "FM",
            ModeName::Am => "AM",
            ModeName::Fsk => "FSK",
            ModeName::CwR => "CW-R",
            ModeName::None => "None",
            ModeName::FskR => "FSK-R",
        }
    }
}

impl fmt::Display for ModeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
