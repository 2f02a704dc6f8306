//! Extension entries submitted at link time.

use std::fmt;

use psi_repository::{
    inventory, AbstractDescriptor, DecodeError, DescriptorContext, DescriptorRegistration, Edid,
    Standards,
};
use psi_tables::repository;

#[derive(Debug, Default)]
struct Scte35Cue;

impl AbstractDescriptor for Scte35Cue {
    fn tag(&self) -> u8 {
        0x8A
    }

    fn defining_standards(&self) -> Standards {
        Standards::SCTE
    }

    fn xml_name(&self) -> &'static str {
        "cue_identifier_descriptor"
    }

    fn deserialize(&mut self, _payload: &[u8]) -> Result<(), DecodeError> {
        Ok(())
    }
}

fn new_cue() -> Box<dyn AbstractDescriptor> {
    Box::new(Scte35Cue)
}

fn display_cue(out: &mut dyn fmt::Write, data: &[u8], indent: usize) -> fmt::Result {
    writeln!(out, "{:indent$}Cue stream type: 0x{:02X}", "", data.first().copied().unwrap_or(0), indent = indent)
}

inventory::submit! {
    DescriptorRegistration {
        name: "cue_identifier_descriptor",
        edid: Edid::Standard { tag: 0x8A },
        standards: Standards::SCTE,
        factory: new_cue,
        display: display_cue,
    }
}

#[test]
fn test_submitted_descriptor_is_registered() {
    let _ = env_logger::builder().is_test(true).try_init();
    let repo = repository();

    assert!(repo.descriptor_names().contains("cue_identifier_descriptor"));
    let cue = repo.descriptor(0x8A, None, DescriptorContext::new());
    assert_eq!(cue.found().map(|e| e.standards()), Some(Standards::SCTE));
}

#[test]
fn test_submitted_descriptor_is_displayed() {
    let data = [0x8A, 0x01, 0x01];
    let registry = repository().snapshot();
    let mut out = String::new();
    psi_tables::descriptors::display_descriptor_loop(
        &mut out,
        &registry,
        &data,
        DescriptorContext::new(),
        0,
    )
    .unwrap();
    assert_eq!(out, "- cue_identifier_descriptor, tag 0x8A, 1 bytes\n  Cue stream type: 0x01\n");
}
