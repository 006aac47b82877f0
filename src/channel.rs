//! Speaker channel identifiers, ear tracks and the fixed channel layouts

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Nominal loudspeaker positions of a 7.0 surround layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    /// Front left
    Fl,
    /// Front right
    Fr,
    /// Front center
    Fc,
    /// Back left
    Bl,
    /// Back right
    Br,
    /// Side left
    Sl,
    /// Side right
    Sr,
}

/// All channels in canonical position order
pub const CHANNELS: [Channel; 7] = [
    Channel::Fl,
    Channel::Fr,
    Channel::Fc,
    Channel::Bl,
    Channel::Br,
    Channel::Sl,
    Channel::Sr,
];

/// Which side of the head a position sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Center,
}

impl Channel {
    /// Side of the head this position is nominally on
    pub fn side(self) -> Side {
        match self {
            Channel::Fl | Channel::Bl | Channel::Sl => Side::Left,
            Channel::Fr | Channel::Br | Channel::Sr => Side::Right,
            Channel::Fc => Side::Center,
        }
    }

    /// Expected propagation delay from this position to the near ear, in
    /// milliseconds. Measured constants for a seated listener at reference
    /// distance.
    pub fn expected_delay_ms(self) -> f64 {
        match self {
            Channel::Fl | Channel::Fr => 0.1487,
            Channel::Fc => 0.2557,
            // TODO: confirm back channel delays against a reference measurement
            Channel::Bl | Channel::Br => 0.1487,
            Channel::Sl | Channel::Sr => 0.0417,
        }
    }

    /// Index of this position in [`CHANNELS`]
    pub fn index(self) -> usize {
        match self {
            Channel::Fl => 0,
            Channel::Fr => 1,
            Channel::Fc => 2,
            Channel::Bl => 3,
            Channel::Br => 4,
            Channel::Sl => 5,
            Channel::Sr => 6,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Fl => write!(f, "FL"),
            Channel::Fr => write!(f, "FR"),
            Channel::Fc => write!(f, "FC"),
            Channel::Bl => write!(f, "BL"),
            Channel::Br => write!(f, "BR"),
            Channel::Sl => write!(f, "SL"),
            Channel::Sr => write!(f, "SR"),
        }
    }
}

impl FromStr for Channel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FL" => Ok(Channel::Fl),
            "FR" => Ok(Channel::Fr),
            "FC" => Ok(Channel::Fc),
            "BL" => Ok(Channel::Bl),
            "BR" => Ok(Channel::Br),
            "SL" => Ok(Channel::Sl),
            "SR" => Ok(Channel::Sr),
            _ => Err(ConfigError::UnknownChannel(s.to_string())),
        }
    }
}

/// Ear tracks of a binaural capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ear {
    Left,
    Right,
}

impl fmt::Display for Ear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ear::Left => write!(f, "left"),
            Ear::Right => write!(f, "right"),
        }
    }
}

/// One of the 14 canonical track slots: a position heard by one ear
pub type Slot = (Channel, Ear);

/// The canonical 14-slot track order: position-major, left ear first.
/// Every multichannel output of the pipeline has exactly these tracks.
pub const CANONICAL_ORDER: [Slot; 14] = [
    (Channel::Fl, Ear::Left),
    (Channel::Fl, Ear::Right),
    (Channel::Fr, Ear::Left),
    (Channel::Fr, Ear::Right),
    (Channel::Fc, Ear::Left),
    (Channel::Fc, Ear::Right),
    (Channel::Bl, Ear::Left),
    (Channel::Bl, Ear::Right),
    (Channel::Br, Ear::Left),
    (Channel::Br, Ear::Right),
    (Channel::Sl, Ear::Left),
    (Channel::Sl, Ear::Right),
    (Channel::Sr, Ear::Left),
    (Channel::Sr, Ear::Right),
];

/// Track order expected by HeSuVi. A fixed permutation of
/// [`CANONICAL_ORDER`].
pub const HESUVI_ORDER: [Slot; 14] = [
    (Channel::Fl, Ear::Left),
    (Channel::Fl, Ear::Right),
    (Channel::Sl, Ear::Left),
    (Channel::Sl, Ear::Right),
    (Channel::Bl, Ear::Left),
    (Channel::Bl, Ear::Right),
    (Channel::Fc, Ear::Left),
    (Channel::Fr, Ear::Right),
    (Channel::Fr, Ear::Left),
    (Channel::Sr, Ear::Right),
    (Channel::Sr, Ear::Left),
    (Channel::Br, Ear::Right),
    (Channel::Br, Ear::Left),
    (Channel::Fc, Ear::Right),
];

/// Index of a slot in the canonical order
pub fn canonical_index(slot: Slot) -> usize {
    let (channel, ear) = slot;
    channel.index() * 2
        + match ear {
            Ear::Left => 0,
            Ear::Right => 1,
        }
}

/// Parse a comma separated speaker list such as `"FL,FR,FC"`
pub fn parse_speakers(s: &str) -> Result<Vec<Channel>, ConfigError> {
    s.split(',')
        .map(|name| name.trim().parse())
        .collect()
}
