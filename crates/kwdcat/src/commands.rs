//! Kenwood CAT request builders.
//!
//! These functions produce the request text (without terminator) for each
//! operation the session exposes. All functions are pure; the query engine
//! trims and terminates the text before it goes on the wire.
//!
//! Read requests are paired with the length of the reply they expect,
//! counted from the start of the mnemonic with the terminator excluded.
//! Control requests expect no reply (length `0`).

use kwdcat_core::{Error, Result};

use crate::frames::{InfoFrame, PowerFrame, StatusFrame, VfoFrequencyFrame};

/// Expected reply length for a request that is not answered.
pub const NO_REPLY: usize = 0;

/// Largest step count accepted by the `UD` command.
pub const MAX_VFO_STEP: u8 = 99;

/// VFO selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vfo {
    A,
    B,
}

impl Vfo {
    /// Digit used for this VFO in command parameters.
    pub fn digit(self) -> char {
        match self {
            Vfo::A => '0',
            Vfo::B => '1',
        }
    }
}

/// Tuning direction for a VFO step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Digit used for this direction in command parameters.
    pub fn digit(self) -> char {
        match self {
            Direction::Up => '0',
            Direction::Down => '1',
        }
    }
}

fn on_off(on: bool) -> char {
    if on { '1' } else { '0' }
}

// ---------------------------------------------------------------
// Reads
// ---------------------------------------------------------------

/// Read the transceiver status (`IF`), answered by a [`StatusFrame`].
pub fn cmd_read_status() -> (&'static str, usize) {
    ("IF", StatusFrame::LEN)
}

/// Read a VFO frequency (`FA`/`FB`), answered by a [`VfoFrequencyFrame`].
pub fn cmd_read_vfo_frequency(vfo: Vfo) -> (&'static str, usize) {
    let request = match vfo {
        Vfo::A => "FA",
        Vfo::B => "FB",
    };
    (request, VfoFrequencyFrame::LEN)
}

/// Read extended info (`XI`), answered by an [`InfoFrame`].
pub fn cmd_read_info() -> (&'static str, usize) {
    ("XI", InfoFrame::LEN)
}

/// Read the output power setting (`PC`), answered by a [`PowerFrame`].
pub fn cmd_read_power() -> (&'static str, usize) {
    ("PC", PowerFrame::LEN)
}

// ---------------------------------------------------------------
// Controls (no reply)
// ---------------------------------------------------------------

/// Step the frequency up, like the microphone UP key (`UP`).
pub fn cmd_frequency_up() -> String {
    "UP".to_string()
}

/// Step the frequency down, like the microphone DWN key (`DN`).
pub fn cmd_frequency_down() -> String {
    "DN".to_string()
}

/// Step a VFO `steps` increments in `direction` (`UD{vfo}{dir}{steps:02}`).
///
/// # Example
///
/// ```
/// use kwdcat::commands::{cmd_step_vfo, Direction, Vfo};
///
/// assert_eq!(cmd_step_vfo(Vfo::A, Direction::Up, 1).unwrap(), "UD0001");
/// assert_eq!(cmd_step_vfo(Vfo::B, Direction::Down, 25).unwrap(), "UD1125");
/// ```
pub fn cmd_step_vfo(vfo: Vfo, direction: Direction, steps: u8) -> Result<String> {
    if steps > MAX_VFO_STEP {
        return Err(Error::InvalidParameter(format!(
            "VFO step must be 0-{MAX_VFO_STEP}, got {steps}"
        )));
    }
    Ok(format!("UD{}{}{steps:02}", vfo.digit(), direction.digit()))
}

/// Raise the RIT offset one step (`RU`).
pub fn cmd_rit_up() -> String {
    "RU".to_string()
}

/// Lower the RIT offset one step (`RD`).
pub fn cmd_rit_down() -> String {
    "RD".to_string()
}

/// Switch RIT on or off (`RT1`/`RT0`).
pub fn cmd_set_rit(on: bool) -> String {
    format!("RT{}", on_off(on))
}

/// Switch XIT on or off (`XT1`/`XT0`).
pub fn cmd_set_xit(on: bool) -> String {
    format!("XT{}", on_off(on))
}

/// Power the transceiver on or off (`PS1`/`PS0`).
pub fn cmd_set_power(on: bool) -> String {
    format!("PS{}", on_off(on))
}
