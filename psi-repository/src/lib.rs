//! Registry of MPEG-TS table ids and descriptor tags.
//!
//! Table ids and descriptor tags are small numbers reused with different
//! meanings by DVB, ATSC, ISDB and the other regional standards. This crate
//! maps them to the factories and display routines that decode them, and
//! resolves collisions from the context a section was found in: the
//! standards already known for the stream and the PID it was carried on.
//!
//! # Example
//!
//! ```rust
//! use psi_repository::{Registry, Standards, TableContext, pid, tid};
//! # use psi_repository::{AbstractTable, DecodeError, PsiSection, TableRegistration};
//! # #[derive(Debug, Default)]
//! # struct Mgt;
//! # impl AbstractTable for Mgt {
//! #     fn table_id(&self) -> u8 { tid::MGT }
//! #     fn defining_standards(&self) -> Standards { Standards::ATSC }
//! #     fn xml_name(&self) -> &'static str { "MGT" }
//! #     fn deserialize(&mut self, _: &PsiSection<'_>) -> Result<(), DecodeError> { Ok(()) }
//! #     fn is_valid(&self) -> bool { true }
//! # }
//! # fn new_mgt() -> Box<dyn AbstractTable> { Box::new(Mgt) }
//! # fn show(_: &mut dyn std::fmt::Write, _: &Registry, _: &PsiSection<'_>, _: usize) -> std::fmt::Result { Ok(()) }
//! # let mut builder = Registry::builder();
//! # builder.register_table(TableRegistration {
//! #     name: "MGT", tids: &[tid::MGT], standards: Standards::ATSC,
//! #     factory: new_mgt, display: show, log: None, pids: &[pid::PSIP],
//! # }).unwrap();
//! # builder.register_table(TableRegistration {
//! #     name: "LDT", tids: &[tid::LDT], standards: Standards::ISDB,
//! #     factory: new_mgt, display: show, log: None, pids: &[pid::LDT],
//! # }).unwrap();
//! let registry = builder.build();
//!
//! // 0xC7 is MGT in ATSC and LDT in ISDB.
//! assert_eq!(registry.table_standards(tid::MGT, Standards::NONE), Standards::NONE);
//! assert_eq!(registry.table_standards(tid::MGT, TableContext::new().with_pid(pid::PSIP)), Standards::ATSC);
//!
//! let ldt = registry.table(tid::LDT, TableContext::new().with_pid(pid::LDT));
//! assert_eq!(ldt.found().map(|e| e.name()), Some("LDT"));
//! ```

pub mod config;
pub mod entity;
pub mod entry;
pub mod error;
pub mod ids;
pub mod pid;
pub mod registry;
pub mod resolver;
pub mod section;
pub mod standards;

pub use config::{PidStandards, RepositoryConfig};
pub use entity::{
    AbstractDescriptor, AbstractTable, DescriptorDisplay, DescriptorFactory, SectionDisplay,
    SectionLog, TableFactory,
};
pub use entry::{DescriptorEntry, DescriptorRegistration, Edid, TableEntry, TableRegistration};
pub use error::{ConfigError, DecodeError, RegistrationError, SectionError, UnknownStandard};
pub use ids::{did, pds, tid, Did, Pds, Tid};
pub use pid::{standards_of_pid, Pid, PidTable, PID_MAX};
pub use registry::{DescriptorContext, Registry, RegistryBuilder, Repository, TableContext};
pub use resolver::{Resolution, ResolvePolicy};
pub use section::{crc32_mpeg2, PsiHeader, PsiSection};
pub use standards::Standards;

// Re-exported so that extension crates can submit registrations without
// depending on `inventory` themselves.
pub use inventory;
