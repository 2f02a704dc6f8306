//! Standards bitmask.
//!
//! The same numeric table id or descriptor tag means different things under
//! different broadcast standards. [`Standards`] is the set of standards an
//! identifier is known to belong to. An empty set ([`Standards::NONE`]) means
//! "unknown or ambiguous", never "invalid".

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::UnknownStandard;

bitflags! {
    /// Set of broadcast standards.
    ///
    /// Bits that have no name are retained, so masks produced by a newer
    /// version of this crate pass through unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Standards: u16 {
        /// ISO/IEC 13818-1 (MPEG-2 Systems).
        const MPEG = 0x0001;
        /// ETSI DVB.
        const DVB = 0x0002;
        /// ANSI/SCTE (cable).
        const SCTE = 0x0004;
        /// ATSC (North America).
        const ATSC = 0x0008;
        /// ARIB ISDB (Japan and derivatives).
        const ISDB = 0x0010;
        /// Japanese specific parts of ISDB.
        const JAPAN = 0x0020;
        /// ABNT ISDB-Tb (Brazil).
        const ABNT = 0x0040;

        const _ = !0;
    }
}

impl Standards {
    /// No standard known.
    pub const NONE: Standards = Standards::empty();

    /// Every named standard, in bit order.
    pub const KNOWN: [(Standards, &'static str); 7] = [
        (Standards::MPEG, "MPEG"),
        (Standards::DVB, "DVB"),
        (Standards::SCTE, "SCTE"),
        (Standards::ATSC, "ATSC"),
        (Standards::ISDB, "ISDB"),
        (Standards::JAPAN, "JAPAN"),
        (Standards::ABNT, "ABNT"),
    ];

    /// Returns true if at least one standard is shared with `other`.
    ///
    /// Always false when either side is [`Standards::NONE`].
    pub fn has_any_of(self, other: Standards) -> bool {
        self.intersects(other)
    }

    /// True for [`Standards::NONE`].
    pub fn is_none(self) -> bool {
        self.is_empty()
    }

    /// Names of the standards in this set.
    pub fn names(self) -> Vec<&'static str> {
        Self::KNOWN
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Parse a comma separated list of standard names, e.g. `"DVB, ISDB"`.
    ///
    /// An empty string yields [`Standards::NONE`].
    pub fn parse_list(list: &str) -> Result<Standards, UnknownStandard> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .try_fold(Standards::NONE, |acc, name| Ok(acc | name.parse::<Standards>()?))
    }
}

impl Default for Standards {
    fn default() -> Self {
        Standards::NONE
    }
}

impl FromStr for Standards {
    type Err = UnknownStandard;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("none") {
            return Ok(Standards::NONE);
        }
        Self::KNOWN
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s))
            .map(|(flag, _)| *flag)
            .ok_or_else(|| UnknownStandard(s.to_string()))
    }
}

impl fmt::Display for Standards {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let named = Self::KNOWN
            .iter()
            .fold(Standards::NONE, |acc, (flag, _)| acc | *flag);
        let mut parts: Vec<String> = self.names().into_iter().map(String::from).collect();
        let unknown = self.bits() & !named.bits();
        if unknown != 0 {
            parts.push(format!("0x{:04X}", unknown));
        }
        f.write_str(&parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_identity_of_or() {
        assert_eq!(Standards::NONE | Standards::ATSC, Standards::ATSC);
        assert_eq!(Standards::ISDB | Standards::NONE, Standards::ISDB);
    }

    #[test]
    fn test_none_never_matches() {
        assert!(!Standards::NONE.has_any_of(Standards::all()));
        assert!(!Standards::DVB.has_any_of(Standards::NONE));
        assert!(!Standards::NONE.has_any_of(Standards::NONE));
        assert!((Standards::DVB | Standards::ISDB).has_any_of(Standards::ISDB));
        assert!(!Standards::ATSC.has_any_of(Standards::ISDB));
    }

    #[test]
    fn test_unknown_bits_pass_through() {
        let future = Standards::from_bits_retain(0x8000) | Standards::DVB;
        assert_eq!(future.bits(), 0x8002);
        assert!(future.has_any_of(Standards::DVB));
        assert_eq!(future.to_string(), "DVB, 0x8000");
    }

    #[test]
    fn test_display() {
        assert_eq!(Standards::NONE.to_string(), "none");
        assert_eq!((Standards::ISDB | Standards::DVB).to_string(), "DVB, ISDB");
    }

    #[test]
    fn test_parse() {
        assert_eq!("atsc".parse::<Standards>().unwrap(), Standards::ATSC);
        assert_eq!(
            Standards::parse_list("DVB, isdb").unwrap(),
            Standards::DVB | Standards::ISDB
        );
        assert_eq!(Standards::parse_list("").unwrap(), Standards::NONE);
        assert!(Standards::parse_list("DVB, DAB").is_err());
    }
}
