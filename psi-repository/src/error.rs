//! Error types for the PSI repository.

use std::path::PathBuf;

use thiserror::Error;

use crate::ids::{Did, Tid};
use crate::pid::Pid;

/// A registration call that violates the registry's own invariants.
///
/// This is a programming error in the registering module, never a property
/// of a transport stream. The rejected registration leaves the registry
/// unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Canonical name is empty.
    #[error("Registration with an empty name")]
    EmptyName,

    /// A table registration lists no table id.
    #[error("Table {0} has no table id")]
    NoTableId(&'static str),

    /// A table-specific descriptor lists no owning table.
    #[error("Table-specific descriptor {0} has no owning table id")]
    NoOwningTable(&'static str),

    /// A regular descriptor uses one of the extension tags.
    #[error("Descriptor {name} uses extension tag 0x{tag:02X} without an extension id")]
    ExtensionTag { name: &'static str, tag: Did },

    /// An expected PID does not fit in 13 bits.
    #[error("Table {name} lists invalid PID 0x{pid:04X}")]
    InvalidPid { name: &'static str, pid: Pid },
}

/// Failure to decode a section or descriptor payload into an entity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The section carries a table id this entity does not handle.
    #[error("Unexpected table id 0x{actual:02X} for {name}")]
    UnexpectedTableId { name: &'static str, actual: Tid },

    /// Payload shorter than the fixed part of the structure.
    #[error("{name} too short: need {needed} bytes, got {actual}")]
    TooShort {
        name: &'static str,
        needed: usize,
        actual: usize,
    },

    /// A length field points past the end of the payload.
    #[error("Invalid {field} length in {name}")]
    InvalidLength {
        name: &'static str,
        field: &'static str,
    },
}

/// Raw PSI section parsing failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    /// Less than the 3 bytes of the short header.
    #[error("Section too short for header")]
    TooShort,

    /// Section length smaller than the CRC.
    #[error("Section length too small: {0}")]
    LengthTooSmall(u16),

    /// Fewer bytes than announced by the section length.
    #[error("Incomplete section data: expected {expected} bytes, got {actual}")]
    Incomplete { expected: usize, actual: usize },

    /// Long section without room for the extended header.
    #[error("Section too short for extended header")]
    TooShortForLongHeader,
}

/// A standard name that is not part of [`crate::Standards`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown standard: {0}")]
pub struct UnknownStandard(pub String);

/// Configuration loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration is not valid TOML for [`crate::RepositoryConfig`].
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A standard name in the configuration is unknown.
    #[error(transparent)]
    UnknownStandard(#[from] UnknownStandard),

    /// A PID in the configuration does not fit in 13 bits.
    #[error("Invalid PID in configuration: 0x{0:04X}")]
    InvalidPid(Pid),
}
