//! BIT (ISDB Broadcaster Information Table).

use std::fmt;

use psi_repository::{
    pid, tid, AbstractTable, DecodeError, DescriptorContext, PsiSection, Registry, Standards,
    TableRegistration,
};

use super::{abstract_table, check_table_id, display_invalid, length12, need, sub};
use crate::descriptors::display_descriptor_loop;

/// One broadcaster of the BIT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcaster {
    pub broadcaster_id: u8,
    pub descriptors: Vec<u8>,
}

/// Decoded BIT.
#[derive(Debug, Clone, Default)]
pub struct Bit {
    pub original_network_id: u16,
    pub broadcast_view_propriety: bool,
    pub descriptors: Vec<u8>,
    pub broadcasters: Vec<Broadcaster>,
    valid: bool,
}

impl Bit {
    pub const NAME: &'static str = "BIT";

    pub const REGISTRATION: TableRegistration = TableRegistration {
        name: Self::NAME,
        tids: &[tid::BIT],
        standards: Standards::ISDB,
        factory: Self::create,
        display: Self::display_section,
        log: None,
        pids: &[pid::BIT],
    };

    fn create() -> Box<dyn AbstractTable> {
        Box::new(Self::default())
    }

    pub fn parse(section: &PsiSection<'_>) -> Result<Self, DecodeError> {
        check_table_id(section, Self::NAME, &[tid::BIT])?;

        let data = section.data;
        need(data, 2, Self::NAME)?;
        let first_length = length12(data, 0);
        let descriptors = sub(data, 2, first_length, Self::NAME, "first descriptors")?.to_vec();

        let mut broadcasters = Vec::new();
        let mut offset = 2 + first_length;
        while offset + 3 <= data.len() {
            let broadcaster_id = data[offset];
            let length = length12(data, offset + 1);
            offset += 3;
            let descriptors = sub(data, offset, length, Self::NAME, "broadcaster descriptors")?;
            broadcasters.push(Broadcaster {
                broadcaster_id,
                descriptors: descriptors.to_vec(),
            });
            offset += length;
        }

        Ok(Bit {
            original_network_id: section.header.table_id_extension,
            broadcast_view_propriety: data[0] & 0x10 != 0,
            descriptors,
            broadcasters,
            valid: true,
        })
    }

    pub fn display_section(
        out: &mut dyn fmt::Write,
        registry: &Registry,
        section: &PsiSection<'_>,
        indent: usize,
    ) -> fmt::Result {
        let bit = match Self::parse(section) {
            Ok(bit) => bit,
            Err(e) => return display_invalid(out, indent, &e),
        };
        let ctx = DescriptorContext::new()
            .with_table_id(tid::BIT)
            .with_standards(Standards::ISDB);
        writeln!(
            out,
            "{:indent$}Original network id: 0x{:04X} ({}), broadcast view propriety: {}",
            "",
            bit.original_network_id,
            bit.original_network_id,
            bit.broadcast_view_propriety,
            indent = indent
        )?;
        display_descriptor_loop(out, registry, &bit.descriptors, ctx, indent)?;
        for b in &bit.broadcasters {
            writeln!(out, "{:indent$}- Broadcaster id: 0x{:02X}", "", b.broadcaster_id, indent = indent)?;
            display_descriptor_loop(out, registry, &b.descriptors, ctx, indent + 2)?;
        }
        Ok(())
    }
}

abstract_table!(Bit, Bit::NAME, Standards::ISDB, fixed tid::BIT);
