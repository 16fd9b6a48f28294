//! Decoders for fixed-grammar Kenwood reply frames.
//!
//! Four reply shapes are understood. Each decoder checks the whole text
//! against an exact grammar first and returns `None` on any mismatch: wrong
//! prefix, wrong length, or a non-digit where digits are required. Nothing is
//! ever partially decoded. Prefixes are matched case-insensitively.
//!
//! | Frame  | Grammar                                      | Length |
//! |--------|----------------------------------------------|--------|
//! | `IF`   | `IF` + 11 digits + 6 any + 17 digits + `0`   | 37     |
//! | `FA/FB`| `FA`/`FB` + 11 digits                        | 13     |
//! | `XI`   | `XI` + 13 digits + `00`                      | 17     |
//! | `PC`   | `PC` + 3 digits (000-100)                    | 5      |
//!
//! Frequencies travel as 11 zero-padded digits in hertz and are decoded to
//! MHz text (`00014050380` becomes `14.050380`). Keeping them as text avoids
//! float rounding of the rig's fixed-point values.

use crate::commands::Vfo;
use crate::mode::ModeName;
use kwdcat_core::Result;

/// Number of digits in a wire frequency field.
pub const FREQUENCY_DIGITS: usize = 11;

/// Digits before the decimal point in a decoded frequency.
const MHZ_DIGITS: usize = 5;

/// Convert a wire frequency field to MHz text.
///
/// Inserts a `.` after the first five digits and strips leading zeros
/// from the result. Returns `None` unless `digits` is exactly 11 ASCII
/// digits.
///
/// # Example
///
/// ```
/// use kwdcat::frames::frequency_from_digits;
///
/// assert_eq!(frequency_from_digits("00014050380").as_deref(), Some("14.050380"));
/// assert_eq!(frequency_from_digits("00144300000").as_deref(), Some("144.300000"));
/// assert_eq!(frequency_from_digits("0001405038"), None);
/// ```
pub fn frequency_from_digits(digits: &str) -> Option<String> {
    if digits.len() != FREQUENCY_DIGITS || !is_digits(digits.as_bytes()) {
        return None;
    }
    let (mhz, rest) = digits.split_at(MHZ_DIGITS);
    Some(format!("{mhz}.{rest}").trim_start_matches('0').to_string())
}

/// Rebuild the 11-digit wire field from MHz text produced by
/// [`frequency_from_digits`].
///
/// Returns `None` if the text has no decimal point, contains non-digits,
/// or would not fit in 11 digits.
pub fn digits_from_frequency(mhz: &str) -> Option<String> {
    let (int_part, frac_part) = mhz.split_once('.')?;
    if int_part.len() > MHZ_DIGITS
        || !is_digits(int_part.as_bytes())
        || !is_digits(frac_part.as_bytes())
    {
        return None;
    }
    let digits = format!("{int_part:0>width$}{frac_part}", width = MHZ_DIGITS);
    (digits.len() == FREQUENCY_DIGITS).then_some(digits)
}

/// Parse MHz text back to hertz.
pub fn frequency_hz(mhz: &str) -> Option<u64> {
    digits_from_frequency(mhz)?.parse().ok()
}

fn is_digits(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_digit)
}

/// Case-insensitive check of a two-letter prefix. Callers have already
/// checked the length.
fn has_prefix(bytes: &[u8], prefix: &[u8; 2]) -> bool {
    bytes[..2].eq_ignore_ascii_case(prefix)
}

/// Decoded status frame (`IF`).
///
/// Each field is the literal text found at its fixed position in the frame.
/// The accessor methods interpret the single-digit flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFrame {
    /// VFO frequency in MHz text.
    pub frequency: String,
    /// RIT/XIT offset digits.
    pub rit_offset: String,
    /// RIT on/off digit.
    pub rit_on: char,
    /// XIT on/off digit.
    pub xit_on: char,
    /// Receive (`0`) / transmit (`1`) digit.
    pub tx_rx: char,
    /// Operating mode code digit.
    pub mode: char,
    /// VFO selector digit.
    pub vfo: char,
    /// Split on/off digit.
    pub split: char,
}

impl StatusFrame {
    /// Length of a status reply, prefix included, terminator excluded.
    pub const LEN: usize = 37;

    /// Decode a status frame such as
    /// `IF00014050380      040000041020000080`.
    pub fn decode(text: &str) -> Option<StatusFrame> {
        let b = text.as_bytes();
        if b.len() != Self::LEN
            || !has_prefix(b, b"IF")
            || !is_digits(&b[2..13])
            || b[13..19].iter().any(|c| !c.is_ascii() || *c == b'\n')
            || !is_digits(&b[19..36])
            || b[36] != b'0'
        {
            return None;
        }

        Some(StatusFrame {
            frequency: frequency_from_digits(&text[2..13])?,
            rit_offset: text[19..23].to_string(),
            rit_on: b[23] as char,
            xit_on: b[24] as char,
            tx_rx: b[28] as char,
            mode: b[29] as char,
            vfo: b[30] as char,
            split: b[32] as char,
        })
    }

    pub fn rit_enabled(&self) -> bool {
        self.rit_on == '1'
    }

    pub fn xit_enabled(&self) -> bool {
        self.xit_on == '1'
    }

    pub fn transmitting(&self) -> bool {
        self.tx_rx == '1'
    }

    pub fn split_enabled(&self) -> bool {
        self.split == '1'
    }

    /// Operating mode; errors if the frame carries code 0.
    pub fn mode_name(&self) -> Result<ModeName> {
        ModeName::from_digit(self.mode)
    }
}

/// Decoded VFO frequency frame (`FA` or `FB`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfoFrequencyFrame {
    /// Which VFO the frame reports.
    pub vfo: Vfo,
    /// Frequency in MHz text.
    pub frequency: String,
}

impl VfoFrequencyFrame {
    /// Length of a VFO frequency reply, prefix included.
    pub const LEN: usize = 13;

    /// Decode a frame such as `FA00014049680`.
    pub fn decode(text: &str) -> Option<VfoFrequencyFrame> {
        let b = text.as_bytes();
        if b.len() != Self::LEN || !is_digits(&b[2..13]) {
            return None;
        }
        let vfo = if has_prefix(b, b"FA") {
            Vfo::A
        } else if has_prefix(b, b"FB") {
            Vfo::B
        } else {
            return None;
        };

        Some(VfoFrequencyFrame {
            vfo,
            frequency: frequency_from_digits(&text[2..13])?,
        })
    }
}

/// Decoded extended info frame (`XI`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoFrame {
    /// Frequency in MHz text.
    pub frequency: String,
    /// Operating mode code digit.
    pub mode: char,
    /// Data mode digit (`0` off, `1` on).
    pub data: char,
}

impl InfoFrame {
    /// Length of an info reply, prefix included.
    pub const LEN: usize = 17;

    /// Decode a frame such as `XI000140496802000`.
    pub fn decode(text: &str) -> Option<InfoFrame> {
        let b = text.as_bytes();
        if b.len() != Self::LEN
            || !has_prefix(b, b"XI")
            || !is_digits(&b[2..15])
            || &b[15..17] != b"00"
        {
            return None;
        }

        Some(InfoFrame {
            frequency: frequency_from_digits(&text[2..13])?,
            mode: b[13] as char,
            data: b[14] as char,
        })
    }

    pub fn data_mode(&self) -> bool {
        self.data == '1'
    }

    /// Operating mode; errors if the frame carries code 0.
    pub fn mode_name(&self) -> Result<ModeName> {
        ModeName::from_digit(self.mode)
    }
}

/// Decoded output power frame (`PC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerFrame {
    /// Output power setting, 0-100.
    pub power: u8,
}

impl PowerFrame {
    /// Length of a power reply, prefix included.
    pub const LEN: usize = 5;

    /// Highest power level the frame may carry.
    pub const MAX_POWER: u8 = 100;

    /// Decode a frame such as `PC050`.
    pub fn decode(text: &str) -> Option<PowerFrame> {
        let b = text.as_bytes();
        if b.len() != Self::LEN || !has_prefix(b, b"PC") || !is_digits(&b[2..5]) {
            return None;
        }
        let power: u8 = text[2..5].parse().ok()?;
        (power <= Self::MAX_POWER).then_some(PowerFrame { power })
    }
}

/// Any decodable reply frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Status(StatusFrame),
    VfoFrequency(VfoFrequencyFrame),
    Info(InfoFrame),
    Power(PowerFrame),
}

impl Frame {
    /// Decode `text` with whichever grammar its prefix selects.
    pub fn decode(text: &str) -> Option<Frame> {
        let prefix = text.get(..2)?.to_ascii_uppercase();
        match prefix.as_str() {
            "IF" => StatusFrame::decode(text).map(Frame::Status),
            "FA" | "FB" => VfoFrequencyFrame::decode(text).map(Frame::VfoFrequency),
            "XI" => InfoFrame::decode(text).map(Frame::Info),
            "PC" => PowerFrame::decode(text).map(Frame::Power),
            _ => None,
        }
    }
}
