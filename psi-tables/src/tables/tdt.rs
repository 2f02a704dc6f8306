//! TDT (Time and Date Table).

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use psi_repository::{
    pid, tid, AbstractTable, DecodeError, PsiSection, Registry, Standards, TableRegistration,
};

use super::{abstract_table, check_table_id, display_invalid, need};

const STANDARDS: Standards = Standards::DVB.union(Standards::ISDB);

/// Decode a 40-bit MJD + BCD time field.
///
/// ISDB carries JST in the same format; no zone is applied here.
pub(crate) fn decode_mjd_time(data: &[u8]) -> Option<NaiveDateTime> {
    let bytes: [u8; 5] = data.get(..5)?.try_into().ok()?;
    let [m0, m1, h, m, s] = bytes;
    let mjd = u16::from_be_bytes([m0, m1]);
    let epoch = NaiveDate::from_ymd_opt(1858, 11, 17)?;
    let date = epoch.checked_add_signed(Duration::days(mjd as i64))?;
    date.and_hms_opt(bcd(h)?, bcd(m)?, bcd(s)?)
}

fn bcd(byte: u8) -> Option<u32> {
    let (high, low) = (byte >> 4, byte & 0x0F);
    if high > 9 || low > 9 {
        None
    } else {
        Some(high as u32 * 10 + low as u32)
    }
}

/// Decoded TDT.
#[derive(Debug, Clone, Default)]
pub struct Tdt {
    pub utc_time: Option<NaiveDateTime>,
    valid: bool,
}

impl Tdt {
    pub const NAME: &'static str = "TDT";

    pub const REGISTRATION: TableRegistration = TableRegistration {
        name: Self::NAME,
        tids: &[tid::TDT],
        standards: STANDARDS,
        factory: Self::create,
        display: Self::display_section,
        log: Some(Self::log_section),
        pids: &[pid::TDT],
    };

    fn create() -> Box<dyn AbstractTable> {
        Box::new(Self::default())
    }

    pub fn parse(section: &PsiSection<'_>) -> Result<Self, DecodeError> {
        check_table_id(section, Self::NAME, &[tid::TDT])?;
        need(section.data, 5, Self::NAME)?;
        let utc_time = decode_mjd_time(section.data).ok_or(DecodeError::InvalidLength {
            name: Self::NAME,
            field: "UTC time",
        })?;
        Ok(Tdt {
            utc_time: Some(utc_time),
            valid: true,
        })
    }

    pub fn display_section(
        out: &mut dyn fmt::Write,
        _registry: &Registry,
        section: &PsiSection<'_>,
        indent: usize,
    ) -> fmt::Result {
        match Self::parse(section) {
            Ok(Tdt { utc_time: Some(t), .. }) => {
                writeln!(out, "{:indent$}UTC time: {}", "", t.format("%Y/%m/%d %H:%M:%S"), indent = indent)
            }
            Ok(_) => Ok(()),
            Err(e) => display_invalid(out, indent, &e),
        }
    }

    pub fn log_section(section: &PsiSection<'_>, _max: usize) -> String {
        match Self::parse(section) {
            Ok(Tdt { utc_time: Some(t), .. }) => t.format("%Y/%m/%d %H:%M:%S").to_string(),
            Ok(_) => String::new(),
            Err(e) => e.to_string(),
        }
    }
}

abstract_table!(Tdt, Tdt::NAME, STANDARDS, fixed tid::TDT);
