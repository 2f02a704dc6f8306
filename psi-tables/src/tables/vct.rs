//! ATSC Virtual Channel Tables, terrestrial (TVCT) and cable (CVCT).
//!
//! TVCT shares table id 0xC8 with the ISDB CDT. Both VCTs have the same
//! layout; the cable one defines two extra flags.

use std::fmt;

use bytes::Buf;
use psi_repository::{
    pid, tid, AbstractTable, DecodeError, DescriptorContext, PsiSection, Registry, Standards,
    TableRegistration, Tid,
};

use super::{abstract_table, check_table_id, display_invalid, need, truncate_log};
use crate::descriptors::display_descriptor_loop;

/// One virtual channel.
///
/// `path_select` and `out_of_band` are only carried by a CVCT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualChannel {
    pub short_name: String,
    pub major_channel_number: u16,
    pub minor_channel_number: u16,
    pub modulation_mode: u8,
    pub carrier_frequency: u32,
    pub channel_tsid: u16,
    pub program_number: u16,
    pub etm_location: u8,
    pub access_controlled: bool,
    pub hidden: bool,
    pub path_select: bool,
    pub out_of_band: bool,
    pub hide_guide: bool,
    pub service_type: u8,
    pub source_id: u16,
    pub descriptors: Vec<u8>,
}

/// Body shared by both VCTs.
#[derive(Debug, Clone, Default)]
pub struct Vct {
    pub transport_stream_id: u16,
    pub version_number: u8,
    pub protocol_version: u8,
    pub channels: Vec<VirtualChannel>,
    pub descriptors: Vec<u8>,
}

impl Vct {
    fn parse(section: &PsiSection<'_>, name: &'static str, table_id: Tid) -> Result<Self, DecodeError> {
        check_table_id(section, name, &[table_id])?;

        let mut buf = section.data;
        need(buf, 2, name)?;
        let protocol_version = buf.get_u8();
        let num_channels = buf.get_u8() as usize;

        let mut channels = Vec::with_capacity(num_channels);
        for _ in 0..num_channels {
            need(buf, 32, name)?;
            let short_name = decode_utf16(&buf[..14]);
            buf.advance(14);
            let numbers = buf.get_uint(3) as u32;
            let modulation_mode = buf.get_u8();
            let carrier_frequency = buf.get_u32();
            let channel_tsid = buf.get_u16();
            let program_number = buf.get_u16();
            let flags = buf.get_u16();
            let source_id = buf.get_u16();
            let length = (buf.get_u16() & 0x03FF) as usize;
            if buf.remaining() < length {
                return Err(DecodeError::InvalidLength {
                    name,
                    field: "channel descriptors",
                });
            }
            let descriptors = buf.copy_to_bytes(length).to_vec();

            channels.push(VirtualChannel {
                short_name,
                major_channel_number: ((numbers >> 10) & 0x03FF) as u16,
                minor_channel_number: (numbers & 0x03FF) as u16,
                modulation_mode,
                carrier_frequency,
                channel_tsid,
                program_number,
                etm_location: (flags >> 14) as u8,
                access_controlled: flags & 0x2000 != 0,
                hidden: flags & 0x1000 != 0,
                path_select: flags & 0x0800 != 0,
                out_of_band: flags & 0x0400 != 0,
                hide_guide: flags & 0x0200 != 0,
                service_type: (flags & 0x003F) as u8,
                source_id,
                descriptors,
            });
        }

        need(buf, 2, name)?;
        let length = (buf.get_u16() & 0x03FF) as usize;
        if buf.remaining() < length {
            return Err(DecodeError::InvalidLength {
                name,
                field: "additional descriptors",
            });
        }

        Ok(Vct {
            transport_stream_id: section.header.table_id_extension,
            version_number: section.header.version_number,
            protocol_version,
            channels,
            descriptors: buf[..length].to_vec(),
        })
    }

    fn display(
        out: &mut dyn fmt::Write,
        registry: &Registry,
        section: &PsiSection<'_>,
        indent: usize,
        name: &'static str,
        table_id: Tid,
    ) -> fmt::Result {
        let vct = match Self::parse(section, name, table_id) {
            Ok(vct) => vct,
            Err(e) => return display_invalid(out, indent, &e),
        };
        let ctx = DescriptorContext::new()
            .with_table_id(table_id)
            .with_standards(Standards::ATSC);
        writeln!(
            out,
            "{:indent$}Transport stream id: 0x{:04X} ({}), protocol version: {}, {} channels",
            "",
            vct.transport_stream_id,
            vct.transport_stream_id,
            vct.protocol_version,
            vct.channels.len(),
            indent = indent
        )?;
        for ch in &vct.channels {
            writeln!(
                out,
                "{:indent$}- Channel {}.{}, short name: \"{}\"",
                "",
                ch.major_channel_number,
                ch.minor_channel_number,
                ch.short_name,
                indent = indent
            )?;
            writeln!(
                out,
                "{:indent$}TS id: 0x{:04X}, program number: 0x{:04X} ({}), source id: 0x{:04X}, service type: 0x{:02X}",
                "",
                ch.channel_tsid,
                ch.program_number,
                ch.program_number,
                ch.source_id,
                ch.service_type,
                indent = indent + 2
            )?;
            display_descriptor_loop(out, registry, &ch.descriptors, ctx, indent + 2)?;
        }
        display_descriptor_loop(out, registry, &vct.descriptors, ctx, indent)
    }

    fn log(section: &PsiSection<'_>, max: usize, name: &'static str, table_id: Tid) -> String {
        let line = match Self::parse(section, name, table_id) {
            Ok(vct) => {
                let channels: Vec<String> = vct
                    .channels
                    .iter()
                    .map(|c| format!("{}.{} {}", c.major_channel_number, c.minor_channel_number, c.short_name))
                    .collect();
                format!("TS: 0x{:04X}, {}", vct.transport_stream_id, channels.join(", "))
            }
            Err(e) => e.to_string(),
        };
        truncate_log(line, max)
    }
}

/// Seven UTF-16BE code units, NUL padded.
fn decode_utf16(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

macro_rules! vct_table {
    ($ty:ident, $name:literal, $tid:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Default)]
        pub struct $ty {
            pub vct: Vct,
            valid: bool,
        }

        impl $ty {
            pub const NAME: &'static str = $name;

            pub const REGISTRATION: TableRegistration = TableRegistration {
                name: Self::NAME,
                tids: &[$tid],
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
                Ok($ty {
                    vct: Vct::parse(section, Self::NAME, $tid)?,
                    valid: true,
                })
            }

            pub fn display_section(
                out: &mut dyn fmt::Write,
                registry: &Registry,
                section: &PsiSection<'_>,
                indent: usize,
            ) -> fmt::Result {
                Vct::display(out, registry, section, indent, Self::NAME, $tid)
            }

            pub fn log_section(section: &PsiSection<'_>, max: usize) -> String {
                Vct::log(section, max, Self::NAME, $tid)
            }
        }

        abstract_table!($ty, $ty::NAME, Standards::ATSC, fixed $tid);
    };
}

vct_table!(Tvct, "TVCT", tid::TVCT, "Terrestrial Virtual Channel Table.");
vct_table!(Cvct, "CVCT", tid::CVCT, "Cable Virtual Channel Table.");
