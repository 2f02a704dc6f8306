//! NIT (Network Information Table).
//!
//! The NIT is transmitted on PID 0x0010 and describes the network and the
//! transport streams it carries.

use std::fmt;

use psi_repository::{
    did, pid, tid, AbstractTable, DecodeError, DescriptorContext, PsiSection, Registry, Standards,
    TableRegistration, Tid,
};

use super::{abstract_table, check_table_id, display_invalid, length12, need, sub, truncate_log};
use crate::descriptors::{display_descriptor_loop, find_descriptor, NetworkNameDescriptor};

const STANDARDS: Standards = Standards::DVB.union(Standards::ISDB);

/// Transport stream entry in the NIT.
#[derive(Debug, Clone, Default)]
pub struct NitTransportStream {
    /// Transport stream ID.
    pub transport_stream_id: u16,
    /// Original network ID.
    pub original_network_id: u16,
    /// Transport descriptors (raw).
    pub descriptors: Vec<u8>,
}

/// Decoded NIT, actual or other.
#[derive(Debug, Clone)]
pub struct Nit {
    /// NIT actual or NIT other.
    pub table_id: Tid,
    /// Network ID.
    pub network_id: u16,
    /// Version number.
    pub version_number: u8,
    /// Network name (from descriptor).
    pub network_name: Option<String>,
    /// Network descriptors (raw).
    pub network_descriptors: Vec<u8>,
    /// Transport stream loop.
    pub transport_streams: Vec<NitTransportStream>,
    valid: bool,
}

impl Default for Nit {
    fn default() -> Self {
        Nit {
            table_id: tid::NIT_ACT,
            network_id: 0,
            version_number: 0,
            network_name: None,
            network_descriptors: Vec::new(),
            transport_streams: Vec::new(),
            valid: false,
        }
    }
}

impl Nit {
    pub const NAME: &'static str = "NIT";

    pub const REGISTRATION: TableRegistration = TableRegistration {
        name: Self::NAME,
        tids: &[tid::NIT_ACT, tid::NIT_OTH],
        standards: STANDARDS,
        factory: Self::create,
        display: Self::display_section,
        log: Some(Self::log_section),
        pids: &[pid::NIT],
    };

    fn create() -> Box<dyn AbstractTable> {
        Box::new(Self::default())
    }

    /// Decode a NIT section.
    pub fn parse(section: &PsiSection<'_>) -> Result<Self, DecodeError> {
        check_table_id(section, Self::NAME, &[tid::NIT_ACT, tid::NIT_OTH])?;

        let data = section.data;
        need(data, 2, Self::NAME)?;

        let network_descriptors_length = length12(data, 0);
        let network_descriptors =
            sub(data, 2, network_descriptors_length, Self::NAME, "network descriptors")?.to_vec();

        let ts_loop_offset = 2 + network_descriptors_length;
        need(data, ts_loop_offset + 2, Self::NAME)?;

        let network_name = find_descriptor(&network_descriptors, did::NETWORK_NAME)
            .and_then(|d| NetworkNameDescriptor::parse(d).ok())
            .map(|n| n.network_name);

        let mut nit = Nit {
            table_id: section.table_id(),
            network_id: section.header.table_id_extension,
            version_number: section.header.version_number,
            network_name,
            network_descriptors,
            transport_streams: Vec::new(),
            valid: true,
        };

        let ts_loop_length = length12(data, ts_loop_offset);
        let mut offset = ts_loop_offset + 2;
        let ts_loop_end = offset + ts_loop_length;

        while offset + 6 <= ts_loop_end && offset + 6 <= data.len() {
            let transport_stream_id = u16::from_be_bytes([data[offset], data[offset + 1]]);
            let original_network_id = u16::from_be_bytes([data[offset + 2], data[offset + 3]]);
            let ts_descriptors_length = length12(data, offset + 4);

            offset += 6;

            if offset + ts_descriptors_length > data.len() {
                break;
            }

            let descriptors = data[offset..offset + ts_descriptors_length].to_vec();
            offset += ts_descriptors_length;

            nit.transport_streams.push(NitTransportStream {
                transport_stream_id,
                original_network_id,
                descriptors,
            });
        }

        Ok(nit)
    }

    /// Find transport stream by TSID.
    pub fn find_transport_stream(&self, tsid: u16) -> Option<&NitTransportStream> {
        self.transport_streams
            .iter()
            .find(|ts| ts.transport_stream_id == tsid)
    }

    /// Get all transport stream IDs.
    pub fn get_all_tsids(&self) -> Vec<u16> {
        self.transport_streams
            .iter()
            .map(|ts| ts.transport_stream_id)
            .collect()
    }

    /// NIT actual (0x40) as opposed to NIT other (0x41).
    pub fn is_actual(&self) -> bool {
        self.table_id == tid::NIT_ACT
    }

    pub fn display_section(
        out: &mut dyn fmt::Write,
        registry: &Registry,
        section: &PsiSection<'_>,
        indent: usize,
    ) -> fmt::Result {
        let nit = match Self::parse(section) {
            Ok(nit) => nit,
            Err(e) => return display_invalid(out, indent, &e),
        };
        let ctx = DescriptorContext::new().with_table_id(nit.table_id);
        writeln!(
            out,
            "{:indent$}Network id: 0x{:04X} ({}), {}",
            "",
            nit.network_id,
            nit.network_id,
            if nit.is_actual() { "actual" } else { "other" },
            indent = indent
        )?;
        display_descriptor_loop(out, registry, &nit.network_descriptors, ctx, indent)?;
        for ts in &nit.transport_streams {
            writeln!(
                out,
                "{:indent$}TS id: 0x{:04X} ({}), Original network id: 0x{:04X} ({})",
                "",
                ts.transport_stream_id,
                ts.transport_stream_id,
                ts.original_network_id,
                ts.original_network_id,
                indent = indent
            )?;
            display_descriptor_loop(out, registry, &ts.descriptors, ctx, indent + 2)?;
        }
        Ok(())
    }

    pub fn log_section(section: &PsiSection<'_>, max: usize) -> String {
        let line = match Self::parse(section) {
            Ok(nit) => format!(
                "Network: 0x{:04X}{}, {} TS",
                nit.network_id,
                nit.network_name.map(|n| format!(" \"{}\"", n)).unwrap_or_default(),
                nit.transport_streams.len()
            ),
            Err(e) => e.to_string(),
        };
        truncate_log(line, max)
    }
}

abstract_table!(Nit, Nit::NAME, STANDARDS, field);
