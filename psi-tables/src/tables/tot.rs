//! TOT (Time Offset Table).
//!
//! Short section syntax, but terminated by a CRC32 which is left in the
//! section payload.

use std::fmt;

use chrono::NaiveDateTime;
use psi_repository::{
    crc32_mpeg2, pid, tid, AbstractTable, DecodeError, DescriptorContext, PsiSection, Registry, Standards,
    TableRegistration,
};

use super::tdt::decode_mjd_time;
use super::{abstract_table, check_table_id, display_invalid, length12, need, sub};
use crate::descriptors::display_descriptor_loop;

const STANDARDS: Standards = Standards::DVB.union(Standards::ISDB);

/// Decoded TOT.
#[derive(Debug, Clone, Default)]
pub struct Tot {
    /// None until a section is decoded.
    pub utc_time: Option<NaiveDateTime>,
    /// Descriptor loop, local time offset descriptors in practice.
    pub descriptors: Vec<u8>,
    /// CRC as transmitted, see [`Tot::verify_crc`].
    pub crc32: u32,
    valid: bool,
}

impl Tot {
    pub const NAME: &'static str = "TOT";

    pub const REGISTRATION: TableRegistration = TableRegistration {
        name: Self::NAME,
        tids: &[tid::TOT],
        standards: STANDARDS,
        factory: Self::create,
        display: Self::display_section,
        log: None,
        pids: &[pid::TOT],
    };

    fn create() -> Box<dyn AbstractTable> {
        Box::new(Self::default())
    }

    pub fn parse(section: &PsiSection<'_>) -> Result<Self, DecodeError> {
        check_table_id(section, Self::NAME, &[tid::TOT])?;

        let data = section.data;
        need(data, 11, Self::NAME)?;

        let utc_time = decode_mjd_time(data).ok_or(DecodeError::InvalidLength {
            name: Self::NAME,
            field: "UTC time",
        })?;
        let loop_length = length12(data, 5);
        let descriptors = sub(data, 7, loop_length, Self::NAME, "descriptor loop")?.to_vec();
        let crc = sub(data, 7 + loop_length, 4, Self::NAME, "CRC32")?;

        Ok(Tot {
            utc_time: Some(utc_time),
            descriptors,
            crc32: u32::from_be_bytes([crc[0], crc[1], crc[2], crc[3]]),
            valid: true,
        })
    }

    /// Check the trailing CRC32 against the raw section bytes.
    pub fn verify_crc(&self, raw: &[u8]) -> bool {
        raw.len() >= 4 && crc32_mpeg2(&raw[..raw.len() - 4]) == self.crc32
    }

    pub fn display_section(
        out: &mut dyn fmt::Write,
        registry: &Registry,
        section: &PsiSection<'_>,
        indent: usize,
    ) -> fmt::Result {
        let tot = match Self::parse(section) {
            Ok(tot) => tot,
            Err(e) => return display_invalid(out, indent, &e),
        };
        if let Some(t) = tot.utc_time {
            writeln!(out, "{:indent$}UTC time: {}", "", t.format("%Y/%m/%d %H:%M:%S"), indent = indent)?;
        }
        display_descriptor_loop(
            out,
            registry,
            &tot.descriptors,
            DescriptorContext::new().with_table_id(tid::TOT),
            indent,
        )
    }
}

abstract_table!(Tot, Tot::NAME, STANDARDS, fixed tid::TOT);

#[cfg(test)]
mod tests {
    use super::*;

    fn tot_section() -> Vec<u8> {
        let mut raw = vec![0x73, 0x70, 0x00, 0xC0, 0x79, 0x12, 0x45, 0x00, 0xF0, 0x00];
        raw[2] = (raw.len() - 3 + 4) as u8;
        let crc = crc32_mpeg2(&raw);
        raw.extend_from_slice(&crc.to_be_bytes());
        raw
    }

    #[test]
    fn test_parse_tot() {
        let raw = tot_section();
        let section = PsiSection::parse(&raw).unwrap();
        let tot = Tot::parse(&section).unwrap();
        assert!(tot.descriptors.is_empty());
        assert!(tot.verify_crc(&raw));
        assert_eq!(
            tot.utc_time.unwrap().format("%H:%M:%S").to_string(),
            "12:45:00"
        );
    }

    #[test]
    fn test_short_tot() {
        let raw = [0x73, 0x70, 0x05, 0xC0, 0x79, 0x12, 0x45, 0x00];
        let section = PsiSection::parse(&raw).unwrap();
        assert!(matches!(Tot::parse(&section), Err(DecodeError::TooShort { .. })));
    }
}
