//! PSI/SI tables and descriptors for the [`psi_repository`] registry.
//!
//! Every table and descriptor of this crate is registered into a
//! process-wide [`Repository`], together with whatever extension crates
//! submitted through `psi_repository::inventory::submit!`.
//!
//! ```rust
//! use psi_repository::{pid, tid, Standards, TableContext};
//!
//! let repo = psi_tables::repository();
//! assert!(repo.table_names().contains("PAT"));
//!
//! // 0xC8 is the TVCT in ATSC and the CDT in ISDB.
//! assert_eq!(repo.table_standards(tid::TVCT, Standards::NONE), Standards::NONE);
//! assert_eq!(repo.table_standards(tid::TVCT, TableContext::new().with_pid(pid::PSIP)), Standards::ATSC);
//! assert_eq!(repo.table_standards(tid::CDT, TableContext::new().with_pid(pid::CDT)), Standards::ISDB);
//! ```

use log::{error, info};
use once_cell::sync::Lazy;
use psi_repository::{ConfigError, RegistryBuilder, Repository, RepositoryConfig};

pub mod descriptors;
pub mod tables;

pub use descriptors::DESCRIPTORS;
pub use tables::TABLES;

static REPOSITORY: Lazy<Repository> = Lazy::new(|| Repository::new(builtin_builder().build()));

/// Process-wide repository: built-in entries plus inventory submissions.
pub fn repository() -> &'static Repository {
    &REPOSITORY
}

/// Register the built-in tables and descriptors into `builder`.
///
/// A rejected built-in is logged and skipped.
pub fn register_builtins(builder: &mut RegistryBuilder) {
    for reg in TABLES {
        if let Err(e) = builder.register_table(*reg) {
            error!("Built-in table {} not registered: {}", reg.name, e);
        }
    }
    for reg in DESCRIPTORS {
        if let Err(e) = builder.register_descriptor(*reg) {
            error!("Built-in descriptor {} not registered: {}", reg.name, e);
        }
    }
}

fn builtin_builder() -> RegistryBuilder {
    let mut builder = RegistryBuilder::new();
    register_builtins(&mut builder);
    builder.extend_inventory();
    builder
}

/// Standalone repository with the same entries as [`repository()`] and the
/// settings of `config`.
pub fn repository_with_config(config: &RepositoryConfig) -> Result<Repository, ConfigError> {
    let mut builder = RegistryBuilder::new().with_config(config)?;
    register_builtins(&mut builder);
    builder.extend_inventory();
    let repo = Repository::new(builder.build());
    info!("Repository configured with policy {:?}", config.policy);
    Ok(repo)
}
