//! PMT (Program Map Table).
//!
//! The PMT contains information about a specific program/service,
//! including the PIDs of its elementary streams (video, audio, etc.).

use std::fmt;

use psi_repository::{
    tid, AbstractTable, DecodeError, DescriptorContext, PsiSection, Registry, Standards, TableRegistration,
};

use super::{abstract_table, check_table_id, display_invalid, length12, need, pid13, sub, truncate_log};
use crate::descriptors::display_descriptor_loop;

/// Stream type constants.
pub mod stream_type {
    /// MPEG-1 Video.
    pub const MPEG1_VIDEO: u8 = 0x01;
    /// MPEG-2 Video.
    pub const MPEG2_VIDEO: u8 = 0x02;
    /// MPEG-1 Audio.
    pub const MPEG1_AUDIO: u8 = 0x03;
    /// MPEG-2 Audio.
    pub const MPEG2_AUDIO: u8 = 0x04;
    /// MPEG-2 Private Sections.
    pub const PRIVATE_SECTIONS: u8 = 0x05;
    /// MPEG-2 PES Private Data.
    pub const PES_PRIVATE_DATA: u8 = 0x06;
    /// MPEG-4 Video (H.264/AVC).
    pub const H264_VIDEO: u8 = 0x1B;
    /// HEVC Video (H.265).
    pub const H265_VIDEO: u8 = 0x24;
    /// AAC Audio (ADTS).
    pub const AAC_AUDIO: u8 = 0x0F;
    /// AAC Audio (LATM).
    pub const AAC_LATM: u8 = 0x11;
    /// ATSC AC-3 Audio.
    pub const AC3_AUDIO: u8 = 0x81;
}

/// A single elementary stream entry in the PMT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmtStream {
    /// Stream type.
    pub stream_type: u8,
    /// Elementary PID.
    pub elementary_pid: u16,
    /// ES info descriptors.
    pub descriptors: Vec<u8>,
}

impl PmtStream {
    /// Check if this is a video stream.
    pub fn is_video(&self) -> bool {
        matches!(
            self.stream_type,
            stream_type::MPEG1_VIDEO
                | stream_type::MPEG2_VIDEO
                | stream_type::H264_VIDEO
                | stream_type::H265_VIDEO
        )
    }

    /// Check if this is an audio stream.
    pub fn is_audio(&self) -> bool {
        matches!(
            self.stream_type,
            stream_type::MPEG1_AUDIO
                | stream_type::MPEG2_AUDIO
                | stream_type::AAC_AUDIO
                | stream_type::AAC_LATM
                | stream_type::AC3_AUDIO
        )
    }

    /// Get a human-readable stream type name.
    pub fn stream_type_name(&self) -> &'static str {
        match self.stream_type {
            stream_type::MPEG1_VIDEO => "MPEG-1 Video",
            stream_type::MPEG2_VIDEO => "MPEG-2 Video",
            stream_type::MPEG1_AUDIO => "MPEG-1 Audio",
            stream_type::MPEG2_AUDIO => "MPEG-2 Audio",
            stream_type::PRIVATE_SECTIONS => "Private Sections",
            stream_type::PES_PRIVATE_DATA => "PES Private Data",
            stream_type::H264_VIDEO => "H.264/AVC Video",
            stream_type::H265_VIDEO => "H.265/HEVC Video",
            stream_type::AAC_AUDIO => "AAC Audio (ADTS)",
            stream_type::AAC_LATM => "AAC Audio (LATM)",
            stream_type::AC3_AUDIO => "AC-3 Audio",
            _ => "Unknown",
        }
    }
}

/// Decoded PMT.
#[derive(Debug, Clone, Default)]
pub struct Pmt {
    /// Program number (service ID).
    pub program_number: u16,
    /// Version number.
    pub version_number: u8,
    /// PCR PID.
    pub pcr_pid: u16,
    /// Program info descriptors.
    pub program_info: Vec<u8>,
    /// Elementary streams.
    pub streams: Vec<PmtStream>,
    valid: bool,
}

impl Pmt {
    pub const NAME: &'static str = "PMT";

    pub const REGISTRATION: TableRegistration = TableRegistration {
        name: Self::NAME,
        tids: &[tid::PMT],
        standards: Standards::MPEG,
        factory: Self::create,
        display: Self::display_section,
        log: Some(Self::log_section),
        pids: &[],
    };

    fn create() -> Box<dyn AbstractTable> {
        Box::new(Self::default())
    }

    /// Decode a PMT section.
    ///
    /// A truncated elementary stream entry ends the stream loop.
    pub fn parse(section: &PsiSection<'_>) -> Result<Self, DecodeError> {
        check_table_id(section, Self::NAME, &[tid::PMT])?;

        let data = section.data;
        need(data, 4, Self::NAME)?;

        let pcr_pid = pid13(data, 0);
        let program_info_length = length12(data, 2);
        let program_info = sub(data, 4, program_info_length, Self::NAME, "program info")?.to_vec();

        let mut pmt = Pmt {
            program_number: section.header.table_id_extension,
            version_number: section.header.version_number,
            pcr_pid,
            program_info,
            streams: Vec::new(),
            valid: true,
        };

        let mut offset = 4 + program_info_length;
        while offset + 5 <= data.len() {
            let stream_type = data[offset];
            let elementary_pid = pid13(data, offset + 1);
            let es_info_length = length12(data, offset + 3);

            offset += 5;

            if offset + es_info_length > data.len() {
                break;
            }

            let descriptors = data[offset..offset + es_info_length].to_vec();
            offset += es_info_length;

            pmt.streams.push(PmtStream {
                stream_type,
                elementary_pid,
                descriptors,
            });
        }

        Ok(pmt)
    }

    /// Get video stream PIDs.
    pub fn get_video_pids(&self) -> Vec<u16> {
        self.streams
            .iter()
            .filter(|s| s.is_video())
            .map(|s| s.elementary_pid)
            .collect()
    }

    /// Get audio stream PIDs.
    pub fn get_audio_pids(&self) -> Vec<u16> {
        self.streams
            .iter()
            .filter(|s| s.is_audio())
            .map(|s| s.elementary_pid)
            .collect()
    }

    pub fn display_section(
        out: &mut dyn fmt::Write,
        registry: &Registry,
        section: &PsiSection<'_>,
        indent: usize,
    ) -> fmt::Result {
        let pmt = match Self::parse(section) {
            Ok(pmt) => pmt,
            Err(e) => return display_invalid(out, indent, &e),
        };
        let ctx = DescriptorContext::new().with_table_id(tid::PMT);
        writeln!(
            out,
            "{:indent$}Program: 0x{:04X} ({}), PCR PID: 0x{:04X} ({})",
            "",
            pmt.program_number,
            pmt.program_number,
            pmt.pcr_pid,
            pmt.pcr_pid,
            indent = indent
        )?;
        display_descriptor_loop(out, registry, &pmt.program_info, ctx, indent)?;
        for s in &pmt.streams {
            writeln!(
                out,
                "{:indent$}Elementary stream: type 0x{:02X} ({}), PID: 0x{:04X} ({})",
                "",
                s.stream_type,
                s.stream_type_name(),
                s.elementary_pid,
                s.elementary_pid,
                indent = indent
            )?;
            display_descriptor_loop(out, registry, &s.descriptors, ctx, indent + 2)?;
        }
        Ok(())
    }

    pub fn log_section(section: &PsiSection<'_>, max: usize) -> String {
        let line = match Self::parse(section) {
            Ok(pmt) => {
                let mut line = format!("Program: 0x{:04X}, PCR: 0x{:04X}", pmt.program_number, pmt.pcr_pid);
                for s in &pmt.streams {
                    line.push_str(&format!(", 0x{:02X}@0x{:04X}", s.stream_type, s.elementary_pid));
                }
                line
            }
            Err(e) => e.to_string(),
        };
        truncate_log(line, max)
    }
}

abstract_table!(Pmt, Pmt::NAME, Standards::MPEG, fixed tid::PMT);

#[cfg(test)]
mod tests {
    use super::*;
    use psi_repository::section::build_long_section;

    const PMT_PAYLOAD: [u8; 14] = [
        // PCR PID = 0x0100 (with reserved bits)
        0xE1, 0x00,
        // Program info length = 0
        0xF0, 0x00,
        // Stream 1: Video H.264, PID=0x0100, ES info length=0
        0x1B, 0xE1, 0x00, 0xF0, 0x00,
        // Stream 2: AAC Audio, PID=0x0110, ES info length=0
        0x0F, 0xE1, 0x10, 0xF0, 0x00,
    ];

    #[test]
    fn test_parse_pmt() {
        let raw = build_long_section(tid::PMT, 0x0101, 0, &PMT_PAYLOAD);
        let section = PsiSection::parse(&raw).unwrap();
        let pmt = Pmt::parse(&section).unwrap();

        assert_eq!(pmt.program_number, 0x0101);
        assert_eq!(pmt.pcr_pid, 0x0100);
        assert_eq!(pmt.streams.len(), 2);
        assert_eq!(pmt.get_video_pids(), vec![0x0100]);
        assert_eq!(pmt.get_audio_pids(), vec![0x0110]);
        assert_eq!(pmt.streams[0].stream_type_name(), "H.264/AVC Video");
    }

    #[test]
    fn test_program_info_overflow() {
        let raw = build_long_section(tid::PMT, 0x0101, 0, &[0xE1, 0x00, 0xF0, 0x10, 0x09]);
        let section = PsiSection::parse(&raw).unwrap();
        assert_eq!(
            Pmt::parse(&section).unwrap_err(),
            DecodeError::InvalidLength {
                name: "PMT",
                field: "program info"
            }
        );
    }

    #[test]
    fn test_display_with_language() {
        let payload = [
            0xE1, 0x00, 0xF0, 0x00, //
            0x0F, 0xE1, 0x10, 0xF0, 0x06, 0x0A, 0x04, b'f', b'r', b'a', 0x01,
        ];
        let raw = build_long_section(tid::PMT, 0x0101, 0, &payload);
        let section = PsiSection::parse(&raw).unwrap();
        let mut out = String::new();
        Pmt::display_section(&mut out, &crate::repository().snapshot(), &section, 0).unwrap();
        assert!(out.contains("Elementary stream: type 0x0F (AAC Audio (ADTS)), PID: 0x0110 (272)"));
        assert!(out.contains("  - ISO_639_language_descriptor, tag 0x0A, 4 bytes"));
        assert!(out.contains("Language: fra"));
    }

    #[test]
    fn test_log_truncated() {
        let raw = build_long_section(tid::PMT, 0x0101, 0, &PMT_PAYLOAD);
        let section = PsiSection::parse(&raw).unwrap();
        let line = Pmt::log_section(&section, 20);
        assert_eq!(line.chars().count(), 20);
        assert!(line.ends_with("..."));
    }
}
