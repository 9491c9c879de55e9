//! Musical time arithmetic at a fixed 960 ticks-per-quarter-note resolution.
//!
//! Pure and stateless: both the parser (beat positions, durations) and the
//! emitter (bar offsets) go through these functions, so a tick means the same
//! thing on both sides of the pipeline.

use std::fmt;

/// Ticks per quarter note. 960 divides cleanly by every supported
/// subdivision down to 128th notes.
pub const TICKS_PER_QUARTER: u32 = 960;

/// A time signature: beats per bar over a beat unit.
///
/// The unit must be a power of two between 1 and 128 (1 = whole note,
/// 4 = quarter, 128 = 128th).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub beats: u8,
    pub unit: u8,
}

impl Signature {
    pub fn new(beats: u8, unit: u8) -> Option<Self> {
        if beats == 0 || unit == 0 || !unit.is_power_of_two() {
            return None;
        }
        Some(Self { beats, unit })
    }

    /// The common-time default, 4/4.
    pub const fn common() -> Self {
        Self { beats: 4, unit: 4 }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.unit)
    }
}

/// A note duration code. 256th notes are deliberately not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Duration {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
    SixtyFourth,
    HundredTwentyEighth,
}

impl Duration {
    /// Map a numeric duration code (1, 2, 4, 8, ... 128) to a `Duration`.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Whole),
            2 => Some(Self::Half),
            4 => Some(Self::Quarter),
            8 => Some(Self::Eighth),
            16 => Some(Self::Sixteenth),
            32 => Some(Self::ThirtySecond),
            64 => Some(Self::SixtyFourth),
            128 => Some(Self::HundredTwentyEighth),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Whole => 1,
            Self::Half => 2,
            Self::Quarter => 4,
            Self::Eighth => 8,
            Self::Sixteenth => 16,
            Self::ThirtySecond => 32,
            Self::SixtyFourth => 64,
            Self::HundredTwentyEighth => 128,
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Whole => "whole",
            Self::Half => "half",
            Self::Quarter => "quarter",
            Self::Eighth => "8th",
            Self::Sixteenth => "16th",
            Self::ThirtySecond => "32nd",
            Self::SixtyFourth => "64th",
            Self::HundredTwentyEighth => "128th",
        };
        f.write_str(name)
    }
}

/// Tick length of one beat-unit note under the given signature
/// (the "unit": a quarter note in x/4, an eighth in x/8, ...).
pub fn unit_ticks(signature: Signature) -> u32 {
    TICKS_PER_QUARTER * 4 / u32::from(signature.unit)
}

/// Tick length of a duration code under the given signature.
///
/// Derived in two steps: the signature's beat unit fixes a base tick length,
/// then the requested code scales relative to it (doubling for coarser codes,
/// halving for finer ones). This keeps a duration code's meaning stable
/// across bars of different signatures within one track.
pub fn ticks_for_duration(signature: Signature, duration: Duration) -> u32 {
    let unit = unit_ticks(signature);
    match duration {
        Duration::Whole => unit * 4,
        Duration::Half => unit * 2,
        Duration::Quarter => unit,
        Duration::Eighth => unit / 2,
        Duration::Sixteenth => unit / 4,
        Duration::ThirtySecond => unit / 8,
        Duration::SixtyFourth => unit / 16,
        Duration::HundredTwentyEighth => unit / 32,
    }
}

/// Bar-relative tick offset of a beat position.
///
/// `beat` is 1-based; `fraction` is the sub-beat offset in [0, 1), scaled by
/// one subdivision of the signature's beat unit.
pub fn ticks_for_beat(signature: Signature, beat: u8, fraction: f64) -> u32 {
    let subdivision = TICKS_PER_QUARTER / u32::from(signature.unit);
    let delta = (fraction * f64::from(subdivision)) as u32;
    u32::from(beat - 1) * TICKS_PER_QUARTER + delta
}

/// Tick length of one full bar under the given signature.
pub fn ticks_per_bar(signature: Signature) -> u32 {
    u32::from(signature.beats) * TICKS_PER_QUARTER
}
