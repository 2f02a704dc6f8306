//! STT (ATSC System Time Table).

use std::fmt;

use bytes::Buf;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use psi_repository::{
    pid, tid, AbstractTable, DecodeError, DescriptorContext, PsiSection, Registry, Standards,
    TableRegistration,
};

use super::{abstract_table, check_table_id, display_invalid, need};
use crate::descriptors::display_descriptor_loop;

/// Decoded STT.
#[derive(Debug, Clone, Default)]
pub struct Stt {
    /// Always 0 in current PSIP.
    pub protocol_version: u8,
    /// Seconds since 1980-01-06 00:00:00 GPS.
    pub system_time: u32,
    /// GPS minus UTC, in seconds.
    pub gps_utc_offset: u8,
    /// DS status, day and hour, as transmitted.
    pub daylight_saving: u16,
    /// Raw descriptor loop.
    pub descriptors: Vec<u8>,
    valid: bool,
}

impl Stt {
    pub const NAME: &'static str = "STT";

    pub const REGISTRATION: TableRegistration = TableRegistration {
        name: Self::NAME,
        tids: &[tid::STT],
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
        check_table_id(section, Self::NAME, &[tid::STT])?;

        let mut buf = section.data;
        need(buf, 8, Self::NAME)?;

        Ok(Stt {
            protocol_version: buf.get_u8(),
            system_time: buf.get_u32(),
            gps_utc_offset: buf.get_u8(),
            daylight_saving: buf.get_u16(),
            descriptors: buf.to_vec(),
            valid: true,
        })
    }

    /// System time converted to UTC.
    pub fn utc_time(&self) -> Option<NaiveDateTime> {
        let gps_epoch = NaiveDate::from_ymd_opt(1980, 1, 6)?.and_hms_opt(0, 0, 0)?;
        gps_epoch.checked_add_signed(Duration::seconds(
            self.system_time as i64 - self.gps_utc_offset as i64,
        ))
    }

    pub fn display_section(
        out: &mut dyn fmt::Write,
        registry: &Registry,
        section: &PsiSection<'_>,
        indent: usize,
    ) -> fmt::Result {
        let stt = match Self::parse(section) {
            Ok(stt) => stt,
            Err(e) => return display_invalid(out, indent, &e),
        };
        writeln!(
            out,
            "{:indent$}System time: 0x{:08X} ({}), GPS-UTC offset: {} s",
            "",
            stt.system_time,
            stt.system_time,
            stt.gps_utc_offset,
            indent = indent
        )?;
        if let Some(utc) = stt.utc_time() {
            writeln!(out, "{:indent$}UTC time: {}", "", utc.format("%Y/%m/%d %H:%M:%S"), indent = indent)?;
        }
        let ctx = DescriptorContext::new()
            .with_table_id(tid::STT)
            .with_standards(Standards::ATSC);
        display_descriptor_loop(out, registry, &stt.descriptors, ctx, indent)
    }

    pub fn log_section(section: &PsiSection<'_>, _max: usize) -> String {
        match Self::parse(section).map(|stt| stt.utc_time()) {
            Ok(Some(utc)) => utc.format("%Y/%m/%d %H:%M:%S").to_string(),
            Ok(None) => String::new(),
            Err(e) => e.to_string(),
        }
    }
}

abstract_table!(Stt, Stt::NAME, Standards::ATSC, fixed tid::STT);

#[cfg(test)]
mod tests {
    use super::*;
    use psi_repository::section::build_long_section;

    #[test]
    fn test_parse_stt() {
        // 1_000_000_000 GPS seconds, 18 leap seconds
        let payload = [0x00, 0x3B, 0x9A, 0xCA, 0x00, 18, 0x00, 0x00];
        let raw = build_long_section(tid::STT, 0, 0, &payload);
        let section = PsiSection::parse(&raw).unwrap();
        let stt = Stt::parse(&section).unwrap();

        assert_eq!(stt.system_time, 1_000_000_000);
        assert_eq!(stt.gps_utc_offset, 18);
        assert_eq!(
            stt.utc_time().unwrap().format("%Y-%m-%d %H:%M:%S").to_string(),
            "2011-09-14 01:46:22"
        );
    }

    #[test]
    fn test_too_short() {
        let raw = build_long_section(tid::STT, 0, 0, &[0x00, 0x3B]);
        let section = PsiSection::parse(&raw).unwrap();
        assert!(Stt::parse(&section).is_err());
    }
}
