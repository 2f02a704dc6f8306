//! Well-known PIDs and the PID to standards association table.
//!
//! A handful of PIDs are reserved by one family of standards for its own
//! tables. When a section arrives on such a PID, the PID tells which
//! interpretation of a shared table id applies.

use std::collections::HashMap;

use crate::standards::Standards;

/// Packet identifier, 13 bits.
pub type Pid = u16;

/// Highest valid PID value.
pub const PID_MAX: Pid = 0x1FFF;

/// Program Association Table PID.
pub const PAT: Pid = 0x0000;
/// Conditional Access Table PID.
pub const CAT: Pid = 0x0001;
/// Transport Stream Description Table PID.
pub const TSDT: Pid = 0x0002;
/// Network Information Table PID.
pub const NIT: Pid = 0x0010;
/// Service Description Table and Bouquet Association Table PID.
pub const SDT: Pid = 0x0011;
/// Bouquet Association Table PID.
pub const BAT: Pid = 0x0011;
/// Event Information Table PID.
pub const EIT: Pid = 0x0012;
/// Running Status Table PID.
pub const RST: Pid = 0x0013;
/// Time and Date Table PID.
pub const TDT: Pid = 0x0014;
/// Time Offset Table PID.
pub const TOT: Pid = 0x0014;
/// DVB network synchronization PID.
pub const NETSYNC: Pid = 0x0015;
/// Resolution Notification Table PID.
pub const RNT: Pid = 0x0016;
/// ISDB Download Control Table PID.
pub const DCT: Pid = 0x0017;
/// Discontinuity Information Table PID.
pub const DIT: Pid = 0x001E;
/// Selection Information Table PID.
pub const SIT: Pid = 0x001F;
/// ISDB Partial Content Announcement Table PID.
pub const PCAT: Pid = 0x0022;
/// ISDB Software Download Trigger Table PID.
pub const SDTT: Pid = 0x0023;
/// ISDB Broadcaster Information Table PID.
pub const BIT: Pid = 0x0024;
/// ISDB Network Board Information Table PID.
pub const NBIT: Pid = 0x0025;
/// ISDB Linked Description Table PID.
pub const LDT: Pid = 0x0025;
/// ISDB EIT (L-EIT, M-EIT) PID.
pub const ISDB_EIT_2: Pid = 0x0026;
/// ISDB EIT (L-EIT, M-EIT) PID.
pub const ISDB_EIT_3: Pid = 0x0027;
/// ISDB terrestrial Software Download Trigger Table PID.
pub const SDTT_TER: Pid = 0x0028;
/// ISDB Common Data Table PID.
pub const CDT: Pid = 0x0029;
/// ATSC PSIP base PID (MGT, VCT, RRT, STT).
pub const PSIP: Pid = 0x1FFB;
/// Null packet PID.
pub const NULL: Pid = 0x1FFF;

/// Standards that conventionally use `pid`.
///
/// Returns [`Standards::NONE`] for PIDs that carry no standard-specific
/// meaning (PMT PIDs, elementary streams, the null PID).
pub fn standards_of_pid(pid: Pid) -> Standards {
    match pid {
        PAT | CAT | TSDT => Standards::MPEG,
        // DVB SI PIDs, reused by ISDB for NIT/SDT/EIT/TDT/TOT
        0x0010..=0x0014 | DIT | SIT => Standards::DVB | Standards::ISDB,
        NETSYNC | RNT => Standards::DVB,
        DCT | 0x0020..=0x002F => Standards::ISDB,
        PSIP => Standards::ATSC,
        _ => Standards::NONE,
    }
}

/// PID to standards table: the fixed associations plus operator overrides.
#[derive(Debug, Clone, Default)]
pub struct PidTable {
    extra: HashMap<Pid, Standards>,
}

impl PidTable {
    /// Table with only the fixed associations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `standards` to the association of `pid`.
    ///
    /// Extras never replace the fixed association, they are OR-ed in.
    pub fn add(&mut self, pid: Pid, standards: Standards) {
        *self.extra.entry(pid).or_default() |= standards;
    }

    /// Standards associated with `pid`.
    pub fn standards(&self, pid: Pid) -> Standards {
        standards_of_pid(pid) | self.extra.get(&pid).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_associations() {
        assert_eq!(standards_of_pid(PSIP), Standards::ATSC);
        assert_eq!(standards_of_pid(LDT), Standards::ISDB);
        assert_eq!(standards_of_pid(CDT), Standards::ISDB);
        assert_eq!(standards_of_pid(PAT), Standards::MPEG);
        assert_eq!(standards_of_pid(NIT), Standards::DVB | Standards::ISDB);
        assert_eq!(standards_of_pid(0x0100), Standards::NONE);
        assert_eq!(standards_of_pid(NULL), Standards::NONE);
    }

    #[test]
    fn test_extra_associations_are_merged() {
        let mut table = PidTable::new();
        table.add(0x0100, Standards::SCTE);
        table.add(PSIP, Standards::SCTE);

        assert_eq!(table.standards(0x0100), Standards::SCTE);
        assert_eq!(table.standards(PSIP), Standards::ATSC | Standards::SCTE);
        assert_eq!(table.standards(0x0101), Standards::NONE);
    }
}
