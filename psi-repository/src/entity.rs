//! Decodable entities built by registered factories.
//!
//! The registry knows nothing about concrete tables or descriptors. A
//! registration binds an identifier to a factory that returns one of these
//! trait objects; the caller then feeds it the section or payload.

use std::fmt;

use crate::error::DecodeError;
use crate::ids::{Did, Tid};
use crate::registry::Registry;
use crate::section::PsiSection;
use crate::standards::Standards;

/// A PSI/SI table that can be decoded from a section.
pub trait AbstractTable: fmt::Debug + Send {
    /// Table id of the decoded table.
    ///
    /// For tables registered under several ids (NIT actual/other), this is
    /// the id of the last decoded section, or the first registered id.
    fn table_id(&self) -> Tid;

    /// Standards that define this table.
    fn defining_standards(&self) -> Standards;

    /// Canonical name, matching the registered name.
    fn xml_name(&self) -> &'static str;

    /// Decode one section into this table.
    fn deserialize(&mut self, section: &PsiSection<'_>) -> Result<(), DecodeError>;

    /// True once a section was successfully decoded.
    fn is_valid(&self) -> bool;
}

/// A descriptor that can be decoded from its payload.
pub trait AbstractDescriptor: fmt::Debug + Send {
    /// Tag as carried on the wire (0x3F / 0x7F for extension descriptors).
    fn tag(&self) -> Did;

    /// Standards that define this descriptor.
    fn defining_standards(&self) -> Standards;

    /// Canonical name, matching the registered name.
    fn xml_name(&self) -> &'static str;

    /// Decode the payload (the bytes after tag and length).
    fn deserialize(&mut self, payload: &[u8]) -> Result<(), DecodeError>;
}

/// Creates an empty table, ready for [`AbstractTable::deserialize`].
pub type TableFactory = fn() -> Box<dyn AbstractTable>;

/// Creates an empty descriptor, ready for [`AbstractDescriptor::deserialize`].
pub type DescriptorFactory = fn() -> Box<dyn AbstractDescriptor>;

/// Writes a human readable dump of a section, indented by `indent` spaces.
///
/// The registry is the one that resolved the section; nested descriptors are
/// resolved against it.
pub type SectionDisplay =
    fn(&mut dyn fmt::Write, &Registry, &PsiSection<'_>, usize) -> fmt::Result;

/// One-line summary of a section, at most `max_bytes` characters.
pub type SectionLog = fn(&PsiSection<'_>, usize) -> String;

/// Writes a human readable dump of a descriptor payload.
pub type DescriptorDisplay = fn(&mut dyn fmt::Write, &[u8], usize) -> fmt::Result;
