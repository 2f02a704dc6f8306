//! SDT (Service Description Table).
//!
//! The SDT is transmitted on PID 0x0011 and contains information about
//! services (channels) in a transport stream.

use std::fmt;

use psi_repository::{
    did, pid, tid, AbstractTable, DecodeError, DescriptorContext, PsiSection, Registry, Standards,
    TableRegistration, Tid,
};

use super::{abstract_table, check_table_id, display_invalid, length12, need, truncate_log};
use crate::descriptors::{display_descriptor_loop, find_descriptor, ServiceDescriptor};

const STANDARDS: Standards = Standards::DVB.union(Standards::ISDB);

/// Service entry in the SDT.
#[derive(Debug, Clone, Default)]
pub struct SdtService {
    /// Service ID (program number).
    pub service_id: u16,
    /// EIT schedule flag.
    pub eit_schedule_flag: bool,
    /// EIT present/following flag.
    pub eit_present_following_flag: bool,
    /// Running status.
    pub running_status: u8,
    /// Free CA mode.
    pub free_ca_mode: bool,
    /// Service descriptors (raw).
    pub descriptors: Vec<u8>,
    /// Parsed service descriptor.
    pub service_descriptor: Option<ServiceDescriptor>,
}

impl SdtService {
    /// Get service name (from service descriptor).
    pub fn get_service_name(&self) -> Option<&str> {
        self.service_descriptor
            .as_ref()
            .map(|d| d.service_name.as_str())
    }

    /// Get provider name (from service descriptor).
    pub fn get_provider_name(&self) -> Option<&str> {
        self.service_descriptor
            .as_ref()
            .map(|d| d.provider_name.as_str())
    }

    /// Get running status name.
    pub fn running_status_name(&self) -> &'static str {
        match self.running_status {
            0 => "Undefined",
            1 => "Not running",
            2 => "Starts in a few seconds",
            3 => "Pausing",
            4 => "Running",
            5..=7 => "Reserved",
            _ => "Unknown",
        }
    }
}

/// Decoded SDT, actual or other.
#[derive(Debug, Clone)]
pub struct Sdt {
    /// SDT actual or SDT other.
    pub table_id: Tid,
    /// Transport stream ID.
    pub transport_stream_id: u16,
    /// Original network ID.
    pub original_network_id: u16,
    /// Version number.
    pub version_number: u8,
    /// Services.
    pub services: Vec<SdtService>,
    valid: bool,
}

impl Default for Sdt {
    fn default() -> Self {
        Sdt {
            table_id: tid::SDT_ACT,
            transport_stream_id: 0,
            original_network_id: 0,
            version_number: 0,
            services: Vec::new(),
            valid: false,
        }
    }
}

impl Sdt {
    pub const NAME: &'static str = "SDT";

    pub const REGISTRATION: TableRegistration = TableRegistration {
        name: Self::NAME,
        tids: &[tid::SDT_ACT, tid::SDT_OTH],
        standards: STANDARDS,
        factory: Self::create,
        display: Self::display_section,
        log: Some(Self::log_section),
        pids: &[pid::SDT],
    };

    fn create() -> Box<dyn AbstractTable> {
        Box::new(Self::default())
    }

    /// Decode a SDT section.
    pub fn parse(section: &PsiSection<'_>) -> Result<Self, DecodeError> {
        check_table_id(section, Self::NAME, &[tid::SDT_ACT, tid::SDT_OTH])?;

        let data = section.data;
        need(data, 3, Self::NAME)?;

        let mut sdt = Sdt {
            table_id: section.table_id(),
            transport_stream_id: section.header.table_id_extension,
            original_network_id: u16::from_be_bytes([data[0], data[1]]),
            version_number: section.header.version_number,
            services: Vec::new(),
            valid: true,
        };

        // data[2] is reserved
        let mut offset = 3;
        while offset + 5 <= data.len() {
            let service_id = u16::from_be_bytes([data[offset], data[offset + 1]]);
            let eit_schedule_flag = data[offset + 2] & 0x02 != 0;
            let eit_present_following_flag = data[offset + 2] & 0x01 != 0;
            let running_status = (data[offset + 3] >> 5) & 0x07;
            let free_ca_mode = data[offset + 3] & 0x10 != 0;
            let descriptors_length = length12(data, offset + 3);

            offset += 5;

            if offset + descriptors_length > data.len() {
                break;
            }

            let descriptors = data[offset..offset + descriptors_length].to_vec();
            offset += descriptors_length;

            let service_descriptor = find_descriptor(&descriptors, did::SERVICE)
                .and_then(|d| ServiceDescriptor::parse(d).ok());

            sdt.services.push(SdtService {
                service_id,
                eit_schedule_flag,
                eit_present_following_flag,
                running_status,
                free_ca_mode,
                descriptors,
                service_descriptor,
            });
        }

        Ok(sdt)
    }

    /// Find service by service ID.
    pub fn find_service(&self, service_id: u16) -> Option<&SdtService> {
        self.services.iter().find(|s| s.service_id == service_id)
    }

    /// Get all service IDs.
    pub fn get_all_service_ids(&self) -> Vec<u16> {
        self.services.iter().map(|s| s.service_id).collect()
    }

    /// Get service name by service ID.
    pub fn get_service_name(&self, service_id: u16) -> Option<&str> {
        self.find_service(service_id)
            .and_then(|s| s.get_service_name())
    }

    /// SDT actual (0x42) as opposed to SDT other (0x46).
    pub fn is_actual(&self) -> bool {
        self.table_id == tid::SDT_ACT
    }

    pub fn display_section(
        out: &mut dyn fmt::Write,
        registry: &Registry,
        section: &PsiSection<'_>,
        indent: usize,
    ) -> fmt::Result {
        let sdt = match Self::parse(section) {
            Ok(sdt) => sdt,
            Err(e) => return display_invalid(out, indent, &e),
        };
        let ctx = DescriptorContext::new().with_table_id(sdt.table_id);
        writeln!(
            out,
            "{:indent$}TS id: 0x{:04X} ({}), Original network id: 0x{:04X} ({}), {}",
            "",
            sdt.transport_stream_id,
            sdt.transport_stream_id,
            sdt.original_network_id,
            sdt.original_network_id,
            if sdt.is_actual() { "actual" } else { "other" },
            indent = indent
        )?;
        for s in &sdt.services {
            writeln!(
                out,
                "{:indent$}Service id: 0x{:04X} ({}), EITs: {}, EITp/f: {}, CA mode: {}, status: {}",
                "",
                s.service_id,
                s.service_id,
                s.eit_schedule_flag,
                s.eit_present_following_flag,
                if s.free_ca_mode { "controlled" } else { "free" },
                s.running_status_name(),
                indent = indent
            )?;
            display_descriptor_loop(out, registry, &s.descriptors, ctx, indent + 2)?;
        }
        Ok(())
    }

    pub fn log_section(section: &PsiSection<'_>, max: usize) -> String {
        let line = match Self::parse(section) {
            Ok(sdt) => {
                let names: Vec<String> = sdt
                    .services
                    .iter()
                    .map(|s| format!("0x{:04X}:{}", s.service_id, s.get_service_name().unwrap_or("?")))
                    .collect();
                format!("TS: 0x{:04X}, {}", sdt.transport_stream_id, names.join(", "))
            }
            Err(e) => e.to_string(),
        };
        truncate_log(line, max)
    }
}

abstract_table!(Sdt, Sdt::NAME, STANDARDS, field);

#[cfg(test)]
mod tests {
    use super::*;
    use psi_repository::section::build_long_section;

    const SDT_PAYLOAD: [u8; 23] = [
        // Original network ID = 0x7FE0
        0x7F, 0xE0,
        // Reserved byte
        0xFF,
        // Service entry: service_id=0x0101
        0x01, 0x01,
        // flags (EIT schedule=0, EIT p/f=1)
        0x01,
        // running_status=4 (running), free_ca=0, descriptors_length=12
        0x80, 0x0C,
        // Service descriptor: tag=0x48, length=10
        0x48, 0x0A,
        // service_type=0x01
        0x01,
        // provider_name_length=3, "ABC"
        0x03, b'A', b'B', b'C',
        // service_name_length=4, "CH01"
        0x04, b'C', b'H', b'0', b'1',
        // Truncated trailing service entry
        0x01, 0x02, 0x01,
    ];

    #[test]
    fn test_parse_sdt() {
        let raw = build_long_section(tid::SDT_ACT, 0x7FE1, 1, &SDT_PAYLOAD);
        let section = PsiSection::parse(&raw).unwrap();
        let sdt = Sdt::parse(&section).unwrap();

        assert_eq!(sdt.transport_stream_id, 0x7FE1);
        assert_eq!(sdt.original_network_id, 0x7FE0);
        assert_eq!(sdt.get_all_service_ids(), vec![0x0101]);

        let service = &sdt.services[0];
        assert!(!service.eit_schedule_flag);
        assert!(service.eit_present_following_flag);
        assert_eq!(service.running_status_name(), "Running");
        assert!(!service.free_ca_mode);
        assert_eq!(service.get_provider_name(), Some("ABC"));
        assert_eq!(sdt.get_service_name(0x0101), Some("CH01"));
    }

    #[test]
    fn test_display_and_log() {
        let raw = build_long_section(tid::SDT_OTH, 0x7FE1, 1, &SDT_PAYLOAD);
        let section = PsiSection::parse(&raw).unwrap();
        let mut out = String::new();
        Sdt::display_section(&mut out, &crate::repository().snapshot(), &section, 0).unwrap();
        assert!(out.contains("Original network id: 0x7FE0 (32736), other"));
        assert!(out.contains("  - service_descriptor, tag 0x48, 10 bytes"));
        assert!(out.contains("Service: \"CH01\", Provider: \"ABC\""));
        assert_eq!(Sdt::log_section(&section, 0), "TS: 0x7FE1, 0x0101:CH01");
    }
}
