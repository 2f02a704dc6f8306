//! PAT (Program Association Table).
//!
//! The PAT is transmitted on PID 0x0000 and contains a list of programs
//! with their PMT PIDs.

use std::fmt;

use psi_repository::{pid, tid, AbstractTable, DecodeError, PsiSection, Registry, Standards, TableRegistration};

use super::{abstract_table, check_table_id, display_invalid, pid13, truncate_log};

/// A single PAT entry (program number and PMT PID).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatEntry {
    /// Program number (0 = NIT, others = service).
    pub program_number: u16,
    /// PID of the PMT for this program.
    pub pid: u16,
}

/// Decoded PAT.
#[derive(Debug, Clone, Default)]
pub struct Pat {
    /// Transport stream ID.
    pub transport_stream_id: u16,
    /// Version number.
    pub version_number: u8,
    /// List of programs.
    pub programs: Vec<PatEntry>,
    /// NIT PID (if present in PAT).
    pub nit_pid: Option<u16>,
    valid: bool,
}

impl Pat {
    pub const NAME: &'static str = "PAT";

    pub const REGISTRATION: TableRegistration = TableRegistration {
        name: Self::NAME,
        tids: &[tid::PAT],
        standards: Standards::MPEG,
        factory: Self::create,
        display: Self::display_section,
        log: Some(Self::log_section),
        pids: &[pid::PAT],
    };

    fn create() -> Box<dyn AbstractTable> {
        Box::new(Self::default())
    }

    /// Decode a PAT section.
    pub fn parse(section: &PsiSection<'_>) -> Result<Self, DecodeError> {
        check_table_id(section, Self::NAME, &[tid::PAT])?;

        let data = section.data;
        if data.len() % 4 != 0 {
            return Err(DecodeError::InvalidLength {
                name: Self::NAME,
                field: "program loop",
            });
        }

        let mut pat = Pat {
            transport_stream_id: section.header.table_id_extension,
            version_number: section.header.version_number,
            programs: Vec::new(),
            nit_pid: None,
            valid: true,
        };

        for chunk in data.chunks(4) {
            let program_number = u16::from_be_bytes([chunk[0], chunk[1]]);
            let pid = pid13(chunk, 2);

            if program_number == 0 {
                pat.nit_pid = Some(pid);
            } else {
                pat.programs.push(PatEntry {
                    program_number,
                    pid,
                });
            }
        }

        Ok(pat)
    }

    /// Get PMT PID for a specific program number.
    pub fn get_pmt_pid(&self, program_number: u16) -> Option<u16> {
        self.programs
            .iter()
            .find(|p| p.program_number == program_number)
            .map(|p| p.pid)
    }

    /// Get all PMT PIDs.
    pub fn get_all_pmt_pids(&self) -> Vec<u16> {
        self.programs.iter().map(|p| p.pid).collect()
    }

    pub fn display_section(
        out: &mut dyn fmt::Write,
        _registry: &Registry,
        section: &PsiSection<'_>,
        indent: usize,
    ) -> fmt::Result {
        let pat = match Self::parse(section) {
            Ok(pat) => pat,
            Err(e) => return display_invalid(out, indent, &e),
        };
        writeln!(
            out,
            "{:indent$}TS id: 0x{:04X} ({})",
            "",
            pat.transport_stream_id,
            pat.transport_stream_id,
            indent = indent
        )?;
        if let Some(nit) = pat.nit_pid {
            writeln!(out, "{:indent$}NIT PID: 0x{:04X} ({})", "", nit, nit, indent = indent)?;
        }
        for p in &pat.programs {
            writeln!(
                out,
                "{:indent$}Program: 0x{:04X} ({}), PMT PID: 0x{:04X} ({})",
                "",
                p.program_number,
                p.program_number,
                p.pid,
                p.pid,
                indent = indent
            )?;
        }
        Ok(())
    }

    pub fn log_section(section: &PsiSection<'_>, max: usize) -> String {
        let line = match Self::parse(section) {
            Ok(pat) => {
                let mut line = format!("TS id: 0x{:04X}", pat.transport_stream_id);
                for p in &pat.programs {
                    line.push_str(&format!(", {}:0x{:04X}", p.program_number, p.pid));
                }
                line
            }
            Err(e) => e.to_string(),
        };
        truncate_log(line, max)
    }
}

abstract_table!(Pat, Pat::NAME, Standards::MPEG, fixed tid::PAT);
