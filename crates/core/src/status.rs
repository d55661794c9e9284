//! Exit-code protocol
//!
//! A terminating generation hands exactly one byte to its parent through its
//! exit status. Two numeric spaces share that byte:
//! - anonymous rewind distances (`0..=254`, plus `255` meaning "all")
//! - named-checkpoint codes allocated by the [`Registry`](crate::Registry)
//!
//! The observer cannot tell which protocol produced a byte; that is decided by
//! which kind of checkpoint is waiting on the generation.

use crate::{Result, RewError};
use std::fmt;
use std::str::FromStr;

/// Byte value reserved for "rewind every generation down to the root"
pub const ALL_SENTINEL: u8 = u8::MAX;

/// One byte carried from a terminated generation to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusByte(u8);

impl StatusByte {
    /// Status reported by a generation that ran to completion
    pub const CLEAN: StatusByte = StatusByte(0);

    pub const fn new(byte: u8) -> Self {
        Self(byte)
    }

    /// Decode a process exit code
    ///
    /// Exit codes outside a byte never come from the engine and are rejected.
    pub fn from_exit_code(code: i32) -> Result<Self> {
        u8::try_from(code)
            .map(Self)
            .map_err(|_| RewError::InvalidStatus(code))
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Exit code to terminate with
    pub fn exit_code(self) -> i32 {
        i32::from(self.0)
    }
}

impl From<u8> for StatusByte {
    fn from(byte: u8) -> Self {
        Self(byte)
    }
}

impl fmt::Display for StatusByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How many checkpoint levels to discard, counted from the active generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Distance {
    /// Discard this many levels (`0..=254`)
    Levels(u8),
    /// Discard every generation down to the root
    All,
}

impl Distance {
    pub const ZERO: Distance = Distance::Levels(0);
    pub const ONE: Distance = Distance::Levels(1);

    /// Whether this rewind lands where it is issued
    pub fn is_zero(self) -> bool {
        self == Distance::ZERO
    }

    /// Interpret the status a descendant terminated with
    pub fn from_status(status: StatusByte) -> Self {
        Self::from(status.get())
    }

    /// Status to terminate with so the parent continues this rewind
    ///
    /// `All` is re-emitted unchanged so every ancestor keeps unwinding.
    /// A zero distance never terminates anything and maps to the clean status.
    pub fn next_hop(self) -> StatusByte {
        match self {
            Distance::All => StatusByte(ALL_SENTINEL),
            Distance::Levels(n) => StatusByte(n.saturating_sub(1)),
        }
    }
}

impl Default for Distance {
    fn default() -> Self {
        Distance::ONE
    }
}

impl From<u8> for Distance {
    fn from(levels: u8) -> Self {
        if levels == ALL_SENTINEL {
            Distance::All
        } else {
            Distance::Levels(levels)
        }
    }
}

impl TryFrom<i64> for Distance {
    type Error = RewError;

    /// Accepts `-1..=255`; both `-1` and `255` mean [`Distance::All`]
    fn try_from(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(Distance::All),
            0..=255 => Ok(Distance::from(value as u8)),
            _ => Err(RewError::InvalidDistance(value)),
        }
    }
}

impl FromStr for Distance {
    type Err = RewError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Distance::All);
        }
        let value: i64 = s
            .parse()
            .map_err(|_| RewError::UnparsableDistance(s.to_string()))?;
        Distance::try_from(value)
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Levels(n) => write!(f, "{}", n),
            Distance::All => write!(f, "all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_hop_decrements() {
        assert_eq!(Distance::ONE.next_hop(), StatusByte::CLEAN);
        assert_eq!(Distance::Levels(3).next_hop(), StatusByte::new(2));
        assert_eq!(Distance::Levels(254).next_hop(), StatusByte::new(253));
    }

    #[test]
    fn test_all_is_re_emitted_unchanged() {
        let hop = Distance::All.next_hop();
        assert_eq!(hop.get(), ALL_SENTINEL);
        assert_eq!(Distance::from_status(hop), Distance::All);
    }

    #[test]
    fn test_input_conversion() {
        assert_eq!(Distance::try_from(-1i64).unwrap(), Distance::All);
        assert_eq!(Distance::try_from(255i64).unwrap(), Distance::All);
        assert_eq!(Distance::try_from(0i64).unwrap(), Distance::ZERO);
        assert_eq!(Distance::try_from(7i64).unwrap(), Distance::Levels(7));
        assert!(matches!(
            Distance::try_from(256i64),
            Err(RewError::InvalidDistance(256))
        ));
        assert!(Distance::try_from(-2i64).is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!("all".parse::<Distance>().unwrap(), Distance::All);
        assert_eq!(" ALL ".parse::<Distance>().unwrap(), Distance::All);
        assert_eq!("-1".parse::<Distance>().unwrap(), Distance::All);
        assert_eq!("2".parse::<Distance>().unwrap(), Distance::Levels(2));
        assert!("two".parse::<Distance>().is_err());
        assert!("1000".parse::<Distance>().is_err());
    }

    #[test]
    fn test_exit_code_bounds() {
        assert_eq!(StatusByte::from_exit_code(0).unwrap(), StatusByte::CLEAN);
        assert_eq!(StatusByte::from_exit_code(255).unwrap().get(), 255);
        assert!(StatusByte::from_exit_code(256).is_err());
        assert!(StatusByte::from_exit_code(-1).is_err());
    }

    #[test]
    fn test_default_distance_is_one() {
        assert_eq!(Distance::default(), Distance::ONE);
        assert!(!Distance::default().is_zero());
        assert!(Distance::ZERO.is_zero());
    }
}
