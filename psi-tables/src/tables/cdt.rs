//! CDT (ISDB Common Data Table), used to carry broadcaster logos.
//!
//! Shares table id 0xC8 with the ATSC TVCT.

use std::fmt;

use psi_repository::{
    pid, tid, AbstractTable, DecodeError, DescriptorContext, PsiSection, Registry, Standards,
    TableRegistration,
};

use super::{abstract_table, check_table_id, display_invalid, length12, need, sub, truncate_log};
use crate::descriptors::{display_descriptor_loop, hex_dump};

/// Decoded CDT.
#[derive(Debug, Clone, Default)]
pub struct Cdt {
    /// Table id extension.
    pub download_data_id: u16,
    /// Network the data belongs to.
    pub original_network_id: u16,
    /// 0x01 for logo data.
    pub data_type: u8,
    /// Raw descriptor loop.
    pub descriptors: Vec<u8>,
    /// Everything after the descriptor loop.
    pub data_module: Vec<u8>,
    valid: bool,
}

impl Cdt {
    pub const NAME: &'static str = "CDT";

    pub const REGISTRATION: TableRegistration = TableRegistration {
        name: Self::NAME,
        tids: &[tid::CDT],
        standards: Standards::ISDB,
        factory: Self::create,
        display: Self::display_section,
        log: Some(Self::log_section),
        pids: &[pid::CDT],
    };

    fn create() -> Box<dyn AbstractTable> {
        Box::new(Self::default())
    }

    pub fn parse(section: &PsiSection<'_>) -> Result<Self, DecodeError> {
        check_table_id(section, Self::NAME, &[tid::CDT])?;

        let data = section.data;
        need(data, 5, Self::NAME)?;
        let length = length12(data, 3);
        let descriptors = sub(data, 5, length, Self::NAME, "descriptors loop")?.to_vec();

        Ok(Cdt {
            download_data_id: section.header.table_id_extension,
            original_network_id: u16::from_be_bytes([data[0], data[1]]),
            data_type: data[2],
            descriptors,
            data_module: data[5 + length..].to_vec(),
            valid: true,
        })
    }

    pub fn display_section(
        out: &mut dyn fmt::Write,
        registry: &Registry,
        section: &PsiSection<'_>,
        indent: usize,
    ) -> fmt::Result {
        let cdt = match Self::parse(section) {
            Ok(cdt) => cdt,
            Err(e) => return display_invalid(out, indent, &e),
        };
        writeln!(
            out,
            "{:indent$}Download data id: 0x{:04X}, Original network id: 0x{:04X}, data type: 0x{:02X}",
            "",
            cdt.download_data_id,
            cdt.original_network_id,
            cdt.data_type,
            indent = indent
        )?;
        let ctx = DescriptorContext::new()
            .with_table_id(tid::CDT)
            .with_standards(Standards::ISDB);
        display_descriptor_loop(out, registry, &cdt.descriptors, ctx, indent)?;
        if !cdt.data_module.is_empty() {
            writeln!(out, "{:indent$}Data module ({} bytes):", "", cdt.data_module.len(), indent = indent)?;
            hex_dump(out, &cdt.data_module, indent + 2)?;
        }
        Ok(())
    }

    pub fn log_section(section: &PsiSection<'_>, max: usize) -> String {
        let line = match Self::parse(section) {
            Ok(cdt) => format!(
                "Download id: 0x{:04X}, type: 0x{:02X}, {} bytes",
                cdt.download_data_id,
                cdt.data_type,
                cdt.data_module.len()
            ),
            Err(e) => e.to_string(),
        };
        truncate_log(line, max)
    }
}

abstract_table!(Cdt, Cdt::NAME, Standards::ISDB, fixed tid::CDT);
