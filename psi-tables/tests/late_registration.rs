//! Registrations after publication, on standalone repositories.

use std::fmt;
use std::sync::Arc;
use std::thread;

use psi_repository::section::build_long_section;
use psi_repository::{
    pid, tid, AbstractDescriptor, AbstractTable, DecodeError, DescriptorContext,
    DescriptorRegistration, Edid, PsiSection, Registry, RegistrationError, RepositoryConfig,
    Standards, TableContext, TableRegistration,
};
use psi_tables::{repository_with_config, tables::Mgt};

#[derive(Debug, Default)]
struct Rrt {
    valid: bool,
}

impl AbstractTable for Rrt {
    fn table_id(&self) -> u8 {
        tid::RRT
    }

    fn defining_standards(&self) -> Standards {
        Standards::ATSC
    }

    fn xml_name(&self) -> &'static str {
        "RRT"
    }

    fn deserialize(&mut self, _section: &PsiSection<'_>) -> Result<(), DecodeError> {
        self.valid = true;
        Ok(())
    }

    fn is_valid(&self) -> bool {
        self.valid
    }
}

fn new_rrt() -> Box<dyn AbstractTable> {
    Box::new(Rrt::default())
}

fn display_rrt(
    out: &mut dyn fmt::Write,
    _registry: &Registry,
    _section: &PsiSection<'_>,
    indent: usize,
) -> fmt::Result {
    writeln!(out, "{:indent$}RRT", "", indent = indent)
}

const RRT: TableRegistration = TableRegistration {
    name: "RRT",
    tids: &[tid::RRT],
    standards: Standards::ATSC,
    factory: new_rrt,
    display: display_rrt,
    log: None,
    pids: &[],
};

#[derive(Debug, Default)]
struct StuffingMarker {
    marker: u8,
}

impl AbstractDescriptor for StuffingMarker {
    fn tag(&self) -> u8 {
        0xF0
    }

    fn defining_standards(&self) -> Standards {
        Standards::MPEG
    }

    fn xml_name(&self) -> &'static str {
        "stuffing_marker_descriptor"
    }

    fn deserialize(&mut self, payload: &[u8]) -> Result<(), DecodeError> {
        self.marker = payload.first().copied().unwrap_or_default();
        Ok(())
    }
}

fn new_stuffing_marker() -> Box<dyn AbstractDescriptor> {
    Box::new(StuffingMarker::default())
}

fn display_stuffing_marker(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
    writeln!(out, "{:indent$}Marker: {:02X?}", "", data, indent = indent)
}

const STUFFING_MARKER: DescriptorRegistration = DescriptorRegistration {
    name: "stuffing_marker_descriptor",
    edid: Edid::Standard { tag: 0xF0 },
    standards: Standards::MPEG,
    factory: new_stuffing_marker,
    display: display_stuffing_marker,
};

#[test]
fn test_late_registration_is_visible_to_new_snapshots() {
    let repo = repository_with_config(&RepositoryConfig::default()).unwrap();
    let before = repo.snapshot();

    repo.register_table(RRT).unwrap();

    assert!(before.table(tid::RRT, TableContext::new()).found().is_none());
    assert_eq!(
        repo.table(tid::RRT, TableContext::new()).found().map(|e| e.name()),
        Some("RRT")
    );
    assert!(repo.table_names().contains("RRT"));
}

#[test]
fn test_duplicate_registration_collapses() {
    let repo = repository_with_config(&RepositoryConfig::default()).unwrap();
    repo.register_table(Mgt::REGISTRATION).unwrap();

    let registry = repo.snapshot();
    assert_eq!(
        registry
            .table_candidates(tid::MGT)
            .iter()
            .filter(|e| e.name() == "MGT")
            .count(),
        2
    );
    // Same (name, standards) twice is still one MGT.
    let on_psip = TableContext::new().with_pid(pid::PSIP);
    assert_eq!(registry.table_standards(tid::MGT, on_psip), Standards::ATSC);
    assert!(registry.table(tid::MGT, Standards::ATSC).is_found());
}

#[test]
fn test_rejected_registration_leaves_repository_unchanged() {
    let repo = repository_with_config(&RepositoryConfig::default()).unwrap();
    let count = repo.table_names().len();

    let err = repo
        .register_table(TableRegistration { tids: &[], ..RRT })
        .unwrap_err();
    assert_eq!(err, RegistrationError::NoTableId("RRT"));
    assert_eq!(repo.table_names().len(), count);
}

#[test]
fn test_config_applies_to_builtins() {
    let config = RepositoryConfig::from_toml_str(
        r#"
        policy = "strict"
        default_standards = ["ISDB"]
        "#,
    )
    .unwrap();
    let repo = repository_with_config(&config).unwrap();
    assert_eq!(
        repo.table(tid::MGT, TableContext::new()).found().map(|e| e.name()),
        Some("LDT")
    );
}

#[test]
fn test_readers_during_registration() {
    let repo = Arc::new(repository_with_config(&RepositoryConfig::default()).unwrap());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let repo = Arc::clone(&repo);
            thread::spawn(move || {
                for _ in 0..1000 {
                    let pat = repo.table(tid::PAT, TableContext::new());
                    assert_eq!(pat.found().map(|e| e.name()), Some("PAT"));
                }
            })
        })
        .collect();

    repo.register_table(RRT).unwrap();

    for reader in readers {
        reader.join().unwrap();
    }
    assert!(repo.table(tid::RRT, TableContext::new()).is_found());
}

#[test]
fn test_section_display_resolves_descriptors_in_its_own_registry() {
    let repo = repository_with_config(&RepositoryConfig::default()).unwrap();
    repo.register_descriptor(STUFFING_MARKER).unwrap();
    let registry = repo.snapshot();
    assert_eq!(
        registry
            .descriptor(0xF0, None, DescriptorContext::new())
            .found()
            .map(|e| e.name()),
        Some("stuffing_marker_descriptor")
    );

    // PCR PID 0x0100, program info: F0 01 AA, no stream.
    let payload = [0xE1, 0x00, 0xF0, 0x03, 0xF0, 0x01, 0xAA];
    let raw = build_long_section(tid::PMT, 0x0001, 0, &payload);
    let section = PsiSection::parse(&raw).unwrap();

    let mut out = String::new();
    assert!(registry.display_section(&mut out, &section, TableContext::new(), 0).unwrap());
    assert!(out.contains("- stuffing_marker_descriptor, tag 0xF0, 1 bytes"), "{}", out);
    assert!(out.contains("Marker: [AA]"), "{}", out);

    // The process-wide repository never saw that registration.
    let mut out = String::new();
    let global = psi_tables::repository().snapshot();
    assert!(global.display_section(&mut out, &section, TableContext::new(), 0).unwrap());
    assert!(out.contains("- Unknown descriptor, tag 0xF0, 1 bytes"), "{}", out);
}
