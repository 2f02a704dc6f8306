//! Resolution against the process-wide repository.

use psi_repository::section::build_long_section;
use psi_repository::{
    did, pds, pid, tid, DescriptorContext, PsiSection, Resolution, ResolvePolicy, Standards,
    TableContext,
};
use psi_tables::repository;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_builtin_names() {
    init_logger();
    let repo = repository();

    let tables = repo.table_names();
    for name in ["PAT", "CAT", "PMT", "NIT", "SDT", "TDT", "TOT", "MGT", "TVCT", "CVCT", "STT", "LDT", "CDT", "BIT"] {
        assert!(tables.contains(name), "{} missing", name);
    }

    let descriptors = repo.descriptor_names();
    assert!(descriptors.contains("CA_descriptor"));
    assert!(descriptors.contains("ISO_639_language_descriptor"));
    assert!(descriptors.contains("logical_channel_number_descriptor"));
}

#[test]
fn test_shared_tid_mgt_ldt() {
    init_logger();
    let repo = repository();

    assert_eq!(repo.table_standards(tid::MGT, Standards::NONE), Standards::NONE);
    assert_eq!(repo.table_standards(tid::MGT, TableContext::new().with_pid(pid::PSIP)), Standards::ATSC);
    assert_eq!(repo.table_standards(tid::LDT, TableContext::new().with_pid(pid::LDT)), Standards::ISDB);

    let name = |ctx: TableContext| repo.table(tid::MGT, ctx).found().map(|e| e.name());
    assert_eq!(name(Standards::ATSC.into()), Some("MGT"));
    assert_eq!(name(Standards::ISDB.into()), Some("LDT"));
    assert_eq!(name(TableContext::new().with_pid(pid::PSIP)), Some("MGT"));
    assert_eq!(name(TableContext::new().with_pid(pid::LDT)), Some("LDT"));
    assert!(repo.table(tid::MGT, TableContext::new()).is_ambiguous());

    // Unrelated standards filter: nothing left.
    assert!(matches!(repo.table(tid::MGT, Standards::DVB), Resolution::NotFound));
}

#[test]
fn test_shared_tid_tvct_cdt() {
    init_logger();
    let repo = repository();

    assert_eq!(repo.table_standards(tid::TVCT, Standards::NONE), Standards::NONE);
    assert_eq!(repo.table_standards(tid::TVCT, TableContext::new().with_pid(pid::PSIP)), Standards::ATSC);
    assert_eq!(repo.table_standards(tid::CDT, TableContext::new().with_pid(pid::CDT)), Standards::ISDB);
    assert_eq!(repo.table_standards(tid::CVCT, Standards::NONE), Standards::ATSC);

    let cdt = repo.table(tid::CDT, TableContext::new().with_pid(pid::CDT));
    assert_eq!(cdt.found().map(|e| e.name()), Some("CDT"));
}

#[test]
fn test_pid_hint_is_ignored_when_it_matches_nothing() {
    init_logger();
    let repo = repository();

    // PAT PID is MPEG-only, which matches neither MGT nor LDT.
    assert!(repo.table(tid::MGT, TableContext::new().with_pid(pid::PAT)).is_ambiguous());
    // A single candidate is found whatever the PID says.
    let pat = repo.table(tid::PAT, TableContext::new().with_pid(pid::PSIP));
    assert_eq!(pat.found().map(|e| e.name()), Some("PAT"));
}

#[test]
fn test_explicit_standards_win_over_pid() {
    init_logger();
    let ctx = TableContext::new().with_standards(Standards::ISDB).with_pid(pid::PSIP);
    let ldt = repository().table(tid::MGT, ctx);
    assert_eq!(ldt.found().map(|e| e.name()), Some("LDT"));
}

#[test]
fn test_first_match_policy() {
    init_logger();
    let ctx = TableContext::new().with_policy(ResolvePolicy::FirstMatch);
    let first = repository().table(tid::MGT, ctx);
    assert_eq!(first.found().map(|e| e.name()), Some("MGT"));
}

#[test]
fn test_factories_agree_with_entries() {
    init_logger();
    let registry = repository().snapshot();

    for name in registry.table_names() {
        let entry = registry.table_by_name(name).unwrap();
        let table = (entry.factory())();
        assert!(entry.tids().contains(&table.table_id()), "{}", name);
        assert_eq!(table.defining_standards(), entry.standards(), "{}", name);
        assert_eq!(table.xml_name(), name);
        assert!(!table.is_valid(), "{} valid before deserialize", name);
    }

    for name in registry.descriptor_names() {
        let entry = registry.descriptor_by_name(name).unwrap();
        let descriptor = (entry.factory())();
        assert_eq!(descriptor.tag(), entry.edid().tag(), "{}", name);
        assert_eq!(descriptor.defining_standards(), entry.standards(), "{}", name);
        assert_eq!(descriptor.xml_name(), name);
    }
}

#[test]
fn test_created_table_deserializes() {
    init_logger();
    let raw = build_long_section(tid::PAT, 0x1234, 0, &[0x01, 0x01, 0xE1, 0x00]);
    let section = PsiSection::parse(&raw).unwrap();

    let registry = repository().snapshot();
    let mut table = registry.create_table(tid::PAT, TableContext::new()).unwrap();
    table.deserialize(&section).unwrap();
    assert!(table.is_valid());
}

#[test]
fn test_display_by_pid() {
    init_logger();
    let registry = repository().snapshot();
    let payload = [0x00, 0x00, 0x00, 0xF0, 0x00];
    let raw = build_long_section(tid::MGT, 0, 0, &payload);
    let section = PsiSection::parse(&raw).unwrap();

    let mut out = String::new();
    let shown = registry
        .display_section(&mut out, &section, TableContext::new().with_pid(pid::PSIP), 0)
        .unwrap();
    assert!(shown);
    assert!(out.contains("number of table types: 0"));

    out.clear();
    let shown = registry
        .display_section(&mut out, &section, TableContext::new().with_pid(pid::LDT), 0)
        .unwrap();
    assert!(shown);
    assert!(out.contains("Original service id: 0x0000"));

    out.clear();
    let shown = registry
        .display_section(&mut out, &section, TableContext::new(), 0)
        .unwrap();
    assert!(!shown);
    assert!(out.is_empty());
}

#[test]
fn test_section_log() {
    init_logger();
    let raw = build_long_section(tid::PAT, 0x0001, 0, &[0x00, 0x65, 0xE0, 0x30]);
    let section = PsiSection::parse(&raw).unwrap();
    let log = repository()
        .snapshot()
        .section_log(tid::PAT, TableContext::new())
        .unwrap();
    assert_eq!(log(&section, 0), "TS id: 0x0001, 101:0x0030");
}

#[test]
fn test_resolver_agrees_with_standards_query() {
    init_logger();
    let registry = repository().snapshot();
    let filters = [Standards::NONE, Standards::ATSC, Standards::ISDB, Standards::DVB];
    let pids = [None, Some(pid::PAT), Some(pid::NIT), Some(pid::LDT), Some(pid::PSIP)];

    for tid in 0..=u8::MAX {
        for standards in filters {
            for pid in pids {
                let ctx = TableContext { standards, pid, policy: None };
                let found = registry.table_standards(tid, ctx);
                match registry.table(tid, ctx) {
                    Resolution::Found(entry) => {
                        assert_eq!(found, entry.standards(), "tid {:#04x} in {:?}", tid, ctx)
                    }
                    Resolution::NotFound => {
                        assert_eq!(found, Standards::NONE, "tid {:#04x} in {:?}", tid, ctx)
                    }
                    Resolution::Ambiguous => {
                        assert!(registry.table_candidates(tid).len() > 1, "tid {:#04x}", tid)
                    }
                }
            }
        }
    }
}

#[test]
fn test_descriptor_resolver_agrees_with_standards_query() {
    let registry = repository().snapshot();
    let filters = [Standards::NONE, Standards::ATSC, Standards::ISDB, Standards::DVB];

    for tag in 0..=u8::MAX {
        for standards in filters {
            for table_id in [None, Some(tid::PMT), Some(tid::INT)] {
                for pds in [None, Some(pds::EICTA)] {
                    let ctx = DescriptorContext { standards, table_id, pds, pid: None, policy: None };
                    let ext = Some(0x06);
                    let found = registry.descriptor_standards(tag, ext, ctx);
                    match registry.descriptor(tag, ext, ctx) {
                        Resolution::Found(entry) => {
                            assert_eq!(found, entry.standards(), "tag {:#04x} in {:?}", tag, ctx)
                        }
                        Resolution::NotFound => {
                            assert_eq!(found, Standards::NONE, "tag {:#04x} in {:?}", tag, ctx)
                        }
                        Resolution::Ambiguous => {}
                    }
                }
            }
        }
    }
}

#[test]
fn test_standards_query_with_explicit_filter() {
    let repo = repository();
    assert_eq!(repo.table_standards(tid::MGT, Standards::ATSC), Standards::ATSC);
    assert_eq!(repo.table_standards(tid::MGT, Standards::ISDB), Standards::ISDB);
    assert_eq!(repo.table_standards(tid::MGT, Standards::DVB), Standards::NONE);
    // The explicit filter wins over the PID.
    let ctx = TableContext::new().with_standards(Standards::ISDB).with_pid(pid::PSIP);
    assert_eq!(repo.table_standards(tid::MGT, ctx), Standards::ISDB);

    // A private tag without its specifier falls through to nothing.
    assert_eq!(
        repo.descriptor_standards(did::LOGICAL_CHANNEL_NUM, None, Standards::DVB),
        Standards::NONE
    );
    let lcn = DescriptorContext::new().with_standards(Standards::DVB).with_pds(pds::EICTA);
    assert_eq!(repo.descriptor_standards(did::LOGICAL_CHANNEL_NUM, None, lcn), Standards::DVB);
}

#[test]
fn test_descriptor_lookup_order() {
    init_logger();
    let repo = repository();
    let name = |tag, ext, ctx: DescriptorContext| repo.descriptor(tag, ext, ctx).found().map(|e| e.name());

    // Private descriptors need their private data specifier.
    assert_eq!(name(did::LOGICAL_CHANNEL_NUM, None, DescriptorContext::new()), None);
    assert_eq!(
        name(did::LOGICAL_CHANNEL_NUM, None, DescriptorContext::new().with_pds(pds::EICTA)),
        Some("logical_channel_number_descriptor")
    );
    assert_eq!(
        repo.descriptor_standards(did::LOGICAL_CHANNEL_NUM, None, DescriptorContext::new().with_pds(pds::EICTA)),
        Standards::DVB
    );

    // Table-specific definitions shadow regular ones in their table only.
    assert_eq!(
        name(did::CA, None, DescriptorContext::new().with_table_id(tid::INT)),
        Some("target_IP_address_descriptor")
    );
    assert_eq!(
        name(did::CA, None, DescriptorContext::new().with_table_id(tid::PMT)),
        Some("CA_descriptor")
    );

    // Extension descriptors resolve on the extension tag.
    assert_eq!(
        name(did::DVB_EXTENSION, Some(0x06), DescriptorContext::new()),
        Some("supplementary_audio_descriptor")
    );
    assert_eq!(name(did::DVB_EXTENSION, Some(0x07), DescriptorContext::new()), None);
    assert_eq!(name(did::DVB_EXTENSION, None, DescriptorContext::new()), None);
}
