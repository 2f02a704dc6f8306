//! MGT (ATSC Master Guide Table).
//!
//! Shares table id 0xC7 with the ISDB LDT.

use std::fmt;

use bytes::Buf;
use psi_repository::{
    pid, tid, AbstractTable, DecodeError, DescriptorContext, PsiSection, Registry, Standards,
    TableRegistration,
};

use super::{abstract_table, check_table_id, display_invalid, need, truncate_log};
use crate::descriptors::display_descriptor_loop;

/// One table announced by the MGT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MgtTableType {
    pub table_type: u16,
    pub pid: u16,
    pub version_number: u8,
    pub number_bytes: u32,
    pub descriptors: Vec<u8>,
}

impl MgtTableType {
    /// Name of the announced table type (A/65 table 6.3).
    pub fn table_type_name(&self) -> &'static str {
        match self.table_type {
            0x0000 => "TVCT (current)",
            0x0001 => "TVCT (next)",
            0x0002 => "CVCT (current)",
            0x0003 => "CVCT (next)",
            0x0004 => "ETT (channel)",
            0x0005 => "DCCSCT",
            0x0100..=0x017F => "EIT",
            0x0200..=0x027F => "ETT (event)",
            0x0301..=0x03FF => "RRT",
            0x1400..=0x14FF => "DCCT",
            _ => "Reserved",
        }
    }
}

/// Decoded MGT.
#[derive(Debug, Clone, Default)]
pub struct Mgt {
    pub protocol_version: u8,
    pub tables: Vec<MgtTableType>,
    pub descriptors: Vec<u8>,
    valid: bool,
}

impl Mgt {
    pub const NAME: &'static str = "MGT";

    pub const REGISTRATION: TableRegistration = TableRegistration {
        name: Self::NAME,
        tids: &[tid::MGT],
        standards: Standards::ATSC,
        factory: Self::create,
        display: Self::display_section,
        log: Some(Self::log_section),
        pids: &[pid::PSIP],
    };

    fn create() -> Box<dyn AbstractTable> {
        Box::new(Self::default())
    }

    pub fn parse(section: &PsiSection<'_>) -> Result<Self, DecodeError> {
        check_table_id(section, Self::NAME, &[tid::MGT])?;

        let mut buf = section.data;
        need(buf, 3, Self::NAME)?;
        let protocol_version = buf.get_u8();
        let tables_defined = buf.get_u16() as usize;

        let mut tables = Vec::with_capacity(tables_defined);
        for _ in 0..tables_defined {
            need(buf, 11, Self::NAME)?;
            let table_type = buf.get_u16();
            let pid = buf.get_u16() & 0x1FFF;
            let version_number = buf.get_u8() & 0x1F;
            let number_bytes = buf.get_u32();
            let length = (buf.get_u16() & 0x0FFF) as usize;
            if buf.remaining() < length {
                return Err(DecodeError::InvalidLength {
                    name: Self::NAME,
                    field: "table type descriptors",
                });
            }
            let descriptors = buf.copy_to_bytes(length).to_vec();
            tables.push(MgtTableType {
                table_type,
                pid,
                version_number,
                number_bytes,
                descriptors,
            });
        }

        need(buf, 2, Self::NAME)?;
        let length = (buf.get_u16() & 0x0FFF) as usize;
        if buf.remaining() < length {
            return Err(DecodeError::InvalidLength {
                name: Self::NAME,
                field: "descriptors",
            });
        }

        Ok(Mgt {
            protocol_version,
            tables,
            descriptors: buf[..length].to_vec(),
            valid: true,
        })
    }

    pub fn display_section(
        out: &mut dyn fmt::Write,
        registry: &Registry,
        section: &PsiSection<'_>,
        indent: usize,
    ) -> fmt::Result {
        let mgt = match Self::parse(section) {
            Ok(mgt) => mgt,
            Err(e) => return display_invalid(out, indent, &e),
        };
        let ctx = DescriptorContext::new()
            .with_table_id(tid::MGT)
            .with_standards(Standards::ATSC);
        writeln!(
            out,
            "{:indent$}Protocol version: {}, number of table types: {}",
            "",
            mgt.protocol_version,
            mgt.tables.len(),
            indent = indent
        )?;
        for t in &mgt.tables {
            writeln!(
                out,
                "{:indent$}- Table type: 0x{:04X} ({}), PID: 0x{:04X} ({}), version: {}, size: {} bytes",
                "",
                t.table_type,
                t.table_type_name(),
                t.pid,
                t.pid,
                t.version_number,
                t.number_bytes,
                indent = indent
            )?;
            display_descriptor_loop(out, registry, &t.descriptors, ctx, indent + 2)?;
        }
        display_descriptor_loop(out, registry, &mgt.descriptors, ctx, indent)
    }

    pub fn log_section(section: &PsiSection<'_>, max: usize) -> String {
        let line = match Self::parse(section) {
            Ok(mgt) => {
                let types: Vec<String> = mgt
                    .tables
                    .iter()
                    .map(|t| format!("0x{:04X}@0x{:04X}", t.table_type, t.pid))
                    .collect();
                format!("{} table types: {}", mgt.tables.len(), types.join(", "))
            }
            Err(e) => e.to_string(),
        };
        truncate_log(line, max)
    }
}

abstract_table!(Mgt, Mgt::NAME, Standards::ATSC, fixed tid::MGT);

#[cfg(test)]
mod tests {
    use super::*;
    use psi_repository::section::build_long_section;

    const MGT_PAYLOAD: [u8; 16] = [
        0x00, // protocol_version
        0x00, 0x01, // tables_defined
        0x00, 0x00, 0xFF, 0xFB, 0xE1, 0x00, 0x00, 0x01, 0x00, 0xF0, 0x00, // TVCT on PSIP
        0xF0, 0x00, // descriptors_length
    ];

    #[test]
    fn test_parse_mgt() {
        let raw = build_long_section(tid::MGT, 0, 1, &MGT_PAYLOAD);
        let section = PsiSection::parse(&raw).unwrap();
        let mgt = Mgt::parse(&section).unwrap();
        assert_eq!(mgt.tables.len(), 1);
        assert_eq!(mgt.tables[0].pid, pid::PSIP);
        assert_eq!(mgt.tables[0].version_number, 1);
        assert_eq!(mgt.tables[0].number_bytes, 0x100);
        assert_eq!(mgt.tables[0].table_type_name(), "TVCT (current)");
    }

    #[test]
    fn test_missing_table_types() {
        let raw = build_long_section(tid::MGT, 0, 1, &[0x00, 0x00, 0x02, 0x00]);
        let section = PsiSection::parse(&raw).unwrap();
        assert!(matches!(Mgt::parse(&section), Err(DecodeError::TooShort { .. })));
    }

    #[test]
    fn test_display() {
        let raw = build_long_section(tid::MGT, 0, 1, &MGT_PAYLOAD);
        let section = PsiSection::parse(&raw).unwrap();
        let mut out = String::new();
        Mgt::display_section(&mut out, &crate::repository().snapshot(), &section, 0).unwrap();
        assert!(out.contains("- Table type: 0x0000 (TVCT (current)), PID: 0x1FFB (8187)"));
    }
}
