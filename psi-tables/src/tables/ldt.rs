//! LDT (ISDB Linked Description Table).
//!
//! Shares table id 0xC7 with the ATSC MGT.

use std::fmt;

use psi_repository::{
    pid, tid, AbstractTable, DecodeError, DescriptorContext, PsiSection, Registry, Standards,
    TableRegistration,
};

use super::{abstract_table, check_table_id, display_invalid, length12, need, truncate_log};
use crate::descriptors::display_descriptor_loop;

/// One linked description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedDescription {
    pub description_id: u16,
    pub descriptors: Vec<u8>,
}

/// Decoded LDT.
#[derive(Debug, Clone, Default)]
pub struct Ldt {
    pub original_service_id: u16,
    pub transport_stream_id: u16,
    pub original_network_id: u16,
    pub descriptions: Vec<LinkedDescription>,
    valid: bool,
}

impl Ldt {
    pub const NAME: &'static str = "LDT";

    pub const REGISTRATION: TableRegistration = TableRegistration {
        name: Self::NAME,
        tids: &[tid::LDT],
        standards: Standards::ISDB,
        factory: Self::create,
        display: Self::display_section,
        log: Some(Self::log_section),
        pids: &[pid::LDT],
    };

    fn create() -> Box<dyn AbstractTable> {
        Box::new(Self::default())
    }

    pub fn parse(section: &PsiSection<'_>) -> Result<Self, DecodeError> {
        check_table_id(section, Self::NAME, &[tid::LDT])?;

        let data = section.data;
        need(data, 4, Self::NAME)?;

        let mut ldt = Ldt {
            original_service_id: section.header.table_id_extension,
            transport_stream_id: u16::from_be_bytes([data[0], data[1]]),
            original_network_id: u16::from_be_bytes([data[2], data[3]]),
            descriptions: Vec::new(),
            valid: true,
        };

        let mut offset = 4;
        while offset + 5 <= data.len() {
            let description_id = u16::from_be_bytes([data[offset], data[offset + 1]]);
            let length = length12(data, offset + 3);
            offset += 5;
            if offset + length > data.len() {
                return Err(DecodeError::InvalidLength {
                    name: Self::NAME,
                    field: "descriptors loop",
                });
            }
            ldt.descriptions.push(LinkedDescription {
                description_id,
                descriptors: data[offset..offset + length].to_vec(),
            });
            offset += length;
        }

        Ok(ldt)
    }

    pub fn display_section(
        out: &mut dyn fmt::Write,
        registry: &Registry,
        section: &PsiSection<'_>,
        indent: usize,
    ) -> fmt::Result {
        let ldt = match Self::parse(section) {
            Ok(ldt) => ldt,
            Err(e) => return display_invalid(out, indent, &e),
        };
        let ctx = DescriptorContext::new()
            .with_table_id(tid::LDT)
            .with_standards(Standards::ISDB);
        writeln!(
            out,
            "{:indent$}Original service id: 0x{:04X} ({}), TS id: 0x{:04X}, Original network id: 0x{:04X}",
            "",
            ldt.original_service_id,
            ldt.original_service_id,
            ldt.transport_stream_id,
            ldt.original_network_id,
            indent = indent
        )?;
        for d in &ldt.descriptions {
            writeln!(out, "{:indent$}- Description id: 0x{:04X}", "", d.description_id, indent = indent)?;
            display_descriptor_loop(out, registry, &d.descriptors, ctx, indent + 2)?;
        }
        Ok(())
    }

    pub fn log_section(section: &PsiSection<'_>, max: usize) -> String {
        let line = match Self::parse(section) {
            Ok(ldt) => format!(
                "Service: 0x{:04X}, {} descriptions",
                ldt.original_service_id,
                ldt.descriptions.len()
            ),
            Err(e) => e.to_string(),
        };
        truncate_log(line, max)
    }
}

abstract_table!(Ldt, Ldt::NAME, Standards::ISDB, fixed tid::LDT);
