//! CAT (Conditional Access Table).

use std::fmt;

use psi_repository::{
    pid, tid, AbstractTable, DecodeError, DescriptorContext, PsiSection, Registry, Standards,
    TableRegistration,
};

use super::{abstract_table, check_table_id, display_invalid};
use crate::descriptors::{display_descriptor_loop, parse_descriptor_loop, CaDescriptor};

/// Decoded CAT: a descriptor loop, normally CA descriptors pointing at EMM PIDs.
#[derive(Debug, Clone, Default)]
pub struct Cat {
    pub version_number: u8,
    pub descriptors: Vec<u8>,
    valid: bool,
}

impl Cat {
    pub const NAME: &'static str = "CAT";

    pub const REGISTRATION: TableRegistration = TableRegistration {
        name: Self::NAME,
        tids: &[tid::CAT],
        standards: Standards::MPEG,
        factory: Self::create,
        display: Self::display_section,
        log: None,
        pids: &[pid::CAT],
    };

    fn create() -> Box<dyn AbstractTable> {
        Box::new(Self::default())
    }

    pub fn parse(section: &PsiSection<'_>) -> Result<Self, DecodeError> {
        check_table_id(section, Self::NAME, &[tid::CAT])?;
        Ok(Cat {
            version_number: section.header.version_number,
            descriptors: section.data.to_vec(),
            valid: true,
        })
    }

    /// EMM PIDs announced by the CA descriptors, with their CA system id.
    pub fn emm_pids(&self) -> Vec<(u16, u16)> {
        parse_descriptor_loop(&self.descriptors)
            .into_iter()
            .filter(|(tag, _)| *tag == psi_repository::did::CA)
            .filter_map(|(_, payload)| CaDescriptor::parse(payload).ok())
            .map(|ca| (ca.ca_system_id, ca.ca_pid))
            .collect()
    }

    pub fn display_section(
        out: &mut dyn fmt::Write,
        registry: &Registry,
        section: &PsiSection<'_>,
        indent: usize,
    ) -> fmt::Result {
        let cat = match Self::parse(section) {
            Ok(cat) => cat,
            Err(e) => return display_invalid(out, indent, &e),
        };
        let ctx = DescriptorContext::new().with_table_id(tid::CAT);
        display_descriptor_loop(out, registry, &cat.descriptors, ctx, indent)
    }
}

abstract_table!(Cat, Cat::NAME, Standards::MPEG, fixed tid::CAT);

#[cfg(test)]
mod tests {
    use super::*;
    use psi_repository::section::build_long_section;

    #[test]
    fn test_emm_pids() {
        let raw = build_long_section(
            tid::CAT,
            0xFFFF,
            3,
            &[0x09, 0x04, 0x00, 0x05, 0xE0, 0x40, 0x09, 0x04, 0x06, 0x04, 0xE0, 0x41],
        );
        let section = PsiSection::parse(&raw).unwrap();
        let cat = Cat::parse(&section).unwrap();
        assert_eq!(cat.version_number, 3);
        assert_eq!(cat.emm_pids(), vec![(0x0005, 0x0040), (0x0604, 0x0041)]);
    }

    #[test]
    fn test_display() {
        let raw = build_long_section(tid::CAT, 0xFFFF, 0, &[0x09, 0x04, 0x00, 0x05, 0xE0, 0x40]);
        let section = PsiSection::parse(&raw).unwrap();
        let mut out = String::new();
        Cat::display_section(&mut out, &crate::repository().snapshot(), &section, 0).unwrap();
        assert!(out.contains("- CA_descriptor, tag 0x09, 4 bytes"));
        assert!(out.contains("CA System Id: 0x0005, CA PID: 0x0040 (64)"));
    }
}
