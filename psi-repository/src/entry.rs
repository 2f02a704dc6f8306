//! Registration records and the entries the registry stores.

use std::fmt;

use crate::entity::{
    DescriptorDisplay, DescriptorFactory, SectionDisplay, SectionLog, TableFactory,
};
use crate::error::RegistrationError;
use crate::ids::{did, Did, Pds, Tid};
use crate::pid::{Pid, PID_MAX};
use crate::standards::Standards;

/// Extended descriptor identifier.
///
/// A descriptor tag alone is not enough to know how to decode a descriptor:
/// extension descriptors carry their real id in the payload, tags above
/// 0x80 are private to a private data specifier, and some tables define
/// their own descriptors with tags that collide with the regular ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edid {
    /// Regular descriptor, meaning fixed by its defining standards.
    Standard { tag: Did },
    /// Private descriptor, meaning fixed by the private data specifier.
    Private { tag: Did, pds: Pds },
    /// Descriptor only defined inside the listed tables.
    TableSpecific { tag: Did, tids: &'static [Tid] },
    /// MPEG extension descriptor (tag 0x3F).
    MpegExtension { ext: u8 },
    /// DVB extension descriptor (tag 0x7F).
    DvbExtension { ext: u8 },
}

impl Edid {
    /// Tag as carried on the wire.
    pub fn tag(&self) -> Did {
        match *self {
            Edid::Standard { tag }
            | Edid::Private { tag, .. }
            | Edid::TableSpecific { tag, .. } => tag,
            Edid::MpegExtension { .. } => did::MPEG_EXTENSION,
            Edid::DvbExtension { .. } => did::DVB_EXTENSION,
        }
    }

    /// Index keys this identifier is reachable from.
    pub(crate) fn keys(&self) -> Vec<EdidKey> {
        match *self {
            Edid::Standard { tag } => vec![EdidKey::Standard(tag)],
            Edid::Private { tag, pds } => vec![EdidKey::Private(tag, pds)],
            Edid::TableSpecific { tag, tids } => tids
                .iter()
                .map(|&tid| EdidKey::TableSpecific(tag, tid))
                .collect(),
            Edid::MpegExtension { ext } => vec![EdidKey::MpegExtension(ext)],
            Edid::DvbExtension { ext } => vec![EdidKey::DvbExtension(ext)],
        }
    }
}

impl fmt::Display for Edid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Edid::Standard { tag } => write!(f, "tag 0x{:02X}", tag),
            Edid::Private { tag, pds } => write!(f, "tag 0x{:02X}, pds 0x{:08X}", tag, pds),
            Edid::TableSpecific { tag, tids } => {
                write!(f, "tag 0x{:02X}, table", tag)?;
                for tid in tids {
                    write!(f, " 0x{:02X}", tid)?;
                }
                Ok(())
            }
            Edid::MpegExtension { ext } => write!(f, "MPEG extension 0x{:02X}", ext),
            Edid::DvbExtension { ext } => write!(f, "DVB extension 0x{:02X}", ext),
        }
    }
}

/// Flattened lookup key, one per (tag, qualifier) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum EdidKey {
    Standard(Did),
    Private(Did, Pds),
    TableSpecific(Did, Tid),
    MpegExtension(u8),
    DvbExtension(u8),
}

/// Table registration, as submitted by a table module.
///
/// All fields are `'static` so that registrations can be declared as
/// constants and submitted with `inventory::submit!`.
#[derive(Debug, Clone, Copy)]
pub struct TableRegistration {
    /// Canonical name, e.g. `"PAT"`.
    pub name: &'static str,
    /// Table ids this table is carried under.
    pub tids: &'static [Tid],
    /// Defining standards.
    pub standards: Standards,
    /// Table factory.
    pub factory: TableFactory,
    /// Section display routine.
    pub display: SectionDisplay,
    /// Optional one-line log routine.
    pub log: Option<SectionLog>,
    /// PIDs the table is conventionally carried on, if fixed.
    pub pids: &'static [Pid],
}

impl TableRegistration {
    pub(crate) fn validate(&self) -> Result<(), RegistrationError> {
        if self.name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if self.tids.is_empty() {
            return Err(RegistrationError::NoTableId(self.name));
        }
        if let Some(&pid) = self.pids.iter().find(|&&pid| pid > PID_MAX) {
            return Err(RegistrationError::InvalidPid {
                name: self.name,
                pid,
            });
        }
        Ok(())
    }
}

/// Descriptor registration, as submitted by a descriptor module.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorRegistration {
    /// Canonical name, e.g. `"CA_descriptor"`.
    pub name: &'static str,
    /// Extended descriptor identifier.
    pub edid: Edid,
    /// Defining standards.
    pub standards: Standards,
    /// Descriptor factory.
    pub factory: DescriptorFactory,
    /// Descriptor display routine.
    pub display: DescriptorDisplay,
}

impl DescriptorRegistration {
    pub(crate) fn validate(&self) -> Result<(), RegistrationError> {
        if self.name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        match self.edid {
            Edid::TableSpecific { tids, .. } if tids.is_empty() => {
                Err(RegistrationError::NoOwningTable(self.name))
            }
            Edid::Standard { tag } | Edid::Private { tag, .. } | Edid::TableSpecific { tag, .. }
                if tag == did::MPEG_EXTENSION || tag == did::DVB_EXTENSION =>
            {
                Err(RegistrationError::ExtensionTag {
                    name: self.name,
                    tag,
                })
            }
            _ => Ok(()),
        }
    }
}

inventory::collect!(TableRegistration);
inventory::collect!(DescriptorRegistration);

/// Anything the resolver can choose between.
pub(crate) trait Candidate {
    fn name(&self) -> &'static str;
    fn standards(&self) -> Standards;
}

/// A registered table.
#[derive(Debug, Clone, Copy)]
pub struct TableEntry {
    reg: TableRegistration,
    order: usize,
}

impl TableEntry {
    pub(crate) fn new(reg: TableRegistration, order: usize) -> Self {
        TableEntry { reg, order }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        self.reg.name
    }

    /// Table ids this entry is registered under.
    pub fn tids(&self) -> &'static [Tid] {
        self.reg.tids
    }

    /// Defining standards.
    pub fn standards(&self) -> Standards {
        self.reg.standards
    }

    /// Table factory.
    pub fn factory(&self) -> TableFactory {
        self.reg.factory
    }

    /// Section display routine.
    pub fn display(&self) -> SectionDisplay {
        self.reg.display
    }

    /// Section log routine, if any.
    pub fn log(&self) -> Option<SectionLog> {
        self.reg.log
    }

    /// PIDs the table is conventionally carried on.
    pub fn pids(&self) -> &'static [Pid] {
        self.reg.pids
    }

    /// Position in registration order.
    pub fn order(&self) -> usize {
        self.order
    }
}

impl Candidate for TableEntry {
    fn name(&self) -> &'static str {
        self.reg.name
    }

    fn standards(&self) -> Standards {
        self.reg.standards
    }
}

/// A registered descriptor.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorEntry {
    reg: DescriptorRegistration,
    order: usize,
}

impl DescriptorEntry {
    pub(crate) fn new(reg: DescriptorRegistration, order: usize) -> Self {
        DescriptorEntry { reg, order }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        self.reg.name
    }

    /// Extended descriptor identifier.
    pub fn edid(&self) -> Edid {
        self.reg.edid
    }

    /// Defining standards.
    pub fn standards(&self) -> Standards {
        self.reg.standards
    }

    /// Descriptor factory.
    pub fn factory(&self) -> DescriptorFactory {
        self.reg.factory
    }

    /// Descriptor display routine.
    pub fn display(&self) -> DescriptorDisplay {
        self.reg.display
    }

    /// Position in registration order.
    pub fn order(&self) -> usize {
        self.order
    }
}

impl Candidate for DescriptorEntry {
    fn name(&self) -> &'static str {
        self.reg.name
    }

    fn standards(&self) -> Standards {
        self.reg.standards
    }
}
