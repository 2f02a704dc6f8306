//! PSI/SI tables.
//!
//! Each table module defines the decoded table, its registration constant
//! and its display routine. [`TABLES`] lists the built-in registrations.

use std::fmt;

use psi_repository::{DecodeError, PsiSection, TableRegistration, Tid};

pub mod bit;
pub mod cat;
pub mod cdt;
pub mod ldt;
pub mod mgt;
pub mod nit;
pub mod pat;
pub mod pmt;
pub mod sdt;
pub mod stt;
pub mod tdt;
pub mod tot;
pub mod vct;

pub use bit::Bit;
pub use cat::Cat;
pub use cdt::Cdt;
pub use ldt::Ldt;
pub use mgt::Mgt;
pub use nit::Nit;
pub use pat::Pat;
pub use pmt::Pmt;
pub use sdt::Sdt;
pub use stt::Stt;
pub use tdt::Tdt;
pub use tot::Tot;
pub use vct::{Cvct, Tvct};

/// Built-in table registrations.
pub const TABLES: &[TableRegistration] = &[
    Pat::REGISTRATION,
    Cat::REGISTRATION,
    Pmt::REGISTRATION,
    Nit::REGISTRATION,
    Sdt::REGISTRATION,
    Tdt::REGISTRATION,
    Tot::REGISTRATION,
    Mgt::REGISTRATION,
    Tvct::REGISTRATION,
    Cvct::REGISTRATION,
    Stt::REGISTRATION,
    Ldt::REGISTRATION,
    Cdt::REGISTRATION,
    Bit::REGISTRATION,
];

/// Implements [`psi_repository::AbstractTable`] for a table type that has
/// a `parse` constructor and a `valid` field.
///
/// `fixed` tables always report their single table id; `field` tables
/// report the `table_id` field of the decoded section.
macro_rules! abstract_table {
    (@impl $ty:ty, $name:expr, $standards:expr, $tid:expr) => {
        impl psi_repository::AbstractTable for $ty {
            fn table_id(&self) -> psi_repository::Tid {
                ($tid)(self)
            }

            fn defining_standards(&self) -> psi_repository::Standards {
                $standards
            }

            fn xml_name(&self) -> &'static str {
                $name
            }

            fn deserialize(
                &mut self,
                section: &psi_repository::PsiSection<'_>,
            ) -> Result<(), psi_repository::DecodeError> {
                *self = <$ty>::parse(section)?;
                Ok(())
            }

            fn is_valid(&self) -> bool {
                self.valid
            }
        }
    };
    ($ty:ty, $name:expr, $standards:expr, fixed $tid:expr) => {
        abstract_table!(@impl $ty, $name, $standards, |_this: &$ty| $tid);
    };
    ($ty:ty, $name:expr, $standards:expr, field) => {
        abstract_table!(@impl $ty, $name, $standards, |this: &$ty| this.table_id);
    };
}

pub(crate) use abstract_table;

/// Fail unless the section carries one of `tids`.
pub(crate) fn check_table_id(
    section: &PsiSection<'_>,
    name: &'static str,
    tids: &[Tid],
) -> Result<(), DecodeError> {
    if tids.contains(&section.table_id()) {
        Ok(())
    } else {
        Err(DecodeError::UnexpectedTableId {
            name,
            actual: section.table_id(),
        })
    }
}

/// Fail unless `data` holds at least `needed` bytes.
pub(crate) fn need(data: &[u8], needed: usize, name: &'static str) -> Result<(), DecodeError> {
    if data.len() < needed {
        Err(DecodeError::TooShort {
            name,
            needed,
            actual: data.len(),
        })
    } else {
        Ok(())
    }
}

/// 12-bit length field at `offset`.
pub(crate) fn length12(data: &[u8], offset: usize) -> usize {
    ((data[offset] as usize & 0x0F) << 8) | data[offset + 1] as usize
}

/// 13-bit PID field at `offset`.
pub(crate) fn pid13(data: &[u8], offset: usize) -> u16 {
    ((data[offset] as u16 & 0x1F) << 8) | data[offset + 1] as u16
}

/// Slice `len` bytes at `offset`, or fail with an invalid `field` length.
pub(crate) fn sub<'a>(
    data: &'a [u8],
    offset: usize,
    len: usize,
    name: &'static str,
    field: &'static str,
) -> Result<&'a [u8], DecodeError> {
    data.get(offset..offset + len)
        .ok_or(DecodeError::InvalidLength { name, field })
}

/// Write the line reported when a section cannot be decoded.
pub(crate) fn display_invalid(
    out: &mut dyn fmt::Write,
    indent: usize,
    error: &DecodeError,
) -> fmt::Result {
    writeln!(out, "{:indent$}- Invalid section: {}", "", error, indent = indent)
}

/// Truncate a log line to `max` characters, `0` meaning unlimited.
pub(crate) fn truncate_log(mut line: String, max: usize) -> String {
    if max > 0 && line.chars().count() > max {
        line = line.chars().take(max.saturating_sub(3)).collect();
        line.push_str("...");
    }
    line
}
