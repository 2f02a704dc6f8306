//! Registry storage, query surface and the shared repository handle.
//!
//! Registration happens on a [`RegistryBuilder`]; [`RegistryBuilder::build`]
//! publishes an immutable [`Registry`] that any number of threads can
//! query without locking. [`Repository`] wraps a published registry so that
//! late registrations (plugins loaded after startup) remain possible: they
//! are serialised by a mutex and published as a fresh snapshot, readers
//! keep whatever snapshot they already hold.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::config::{RepositoryConfig, Settings};
use crate::entity::{
    AbstractDescriptor, AbstractTable, DescriptorDisplay, DescriptorFactory, SectionDisplay,
    SectionLog, TableFactory,
};
use crate::entry::{
    DescriptorEntry, DescriptorRegistration, EdidKey, TableEntry, TableRegistration,
};
use crate::error::{ConfigError, RegistrationError};
use crate::ids::{did, Did, Pds, Tid};
use crate::pid::Pid;
use crate::resolver::{self, Filter, Resolution, ResolvePolicy};
use crate::section::PsiSection;
use crate::standards::Standards;

/// Context of a table lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableContext {
    /// Standards already known for the stream, NONE if unknown.
    pub standards: Standards,
    /// PID the section was carried on.
    pub pid: Option<Pid>,
    /// Overrides the configured policy.
    pub policy: Option<ResolvePolicy>,
}

impl TableContext {
    /// Context without any information.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the known standards.
    pub fn with_standards(mut self, standards: Standards) -> Self {
        self.standards = standards;
        self
    }

    /// Set the carrying PID.
    pub fn with_pid(mut self, pid: Pid) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Set the tie-break policy.
    pub fn with_policy(mut self, policy: ResolvePolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}

impl From<Standards> for TableContext {
    fn from(standards: Standards) -> Self {
        TableContext::new().with_standards(standards)
    }
}

/// Context of a descriptor lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorContext {
    /// Standards already known for the stream, NONE if unknown.
    pub standards: Standards,
    /// Id of the table containing the descriptor.
    pub table_id: Option<Tid>,
    /// Private data specifier in effect in the descriptor loop.
    pub pds: Option<Pds>,
    /// PID the containing section was carried on.
    pub pid: Option<Pid>,
    /// Overrides the configured policy.
    pub policy: Option<ResolvePolicy>,
}

impl DescriptorContext {
    /// Context without any information.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the known standards.
    pub fn with_standards(mut self, standards: Standards) -> Self {
        self.standards = standards;
        self
    }

    /// Set the containing table id.
    pub fn with_table_id(mut self, tid: Tid) -> Self {
        self.table_id = Some(tid);
        self
    }

    /// Set the private data specifier.
    pub fn with_pds(mut self, pds: Pds) -> Self {
        self.pds = Some(pds);
        self
    }

    /// Set the carrying PID.
    pub fn with_pid(mut self, pid: Pid) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Set the tie-break policy.
    pub fn with_policy(mut self, policy: ResolvePolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}

impl From<Standards> for DescriptorContext {
    fn from(standards: Standards) -> Self {
        DescriptorContext::new().with_standards(standards)
    }
}

/// Immutable collection of table and descriptor entries.
#[derive(Clone, Default)]
pub struct Registry {
    tables: Vec<TableEntry>,
    table_index: HashMap<Tid, Vec<usize>>,
    descriptors: Vec<DescriptorEntry>,
    descriptor_index: HashMap<EdidKey, Vec<usize>>,
    settings: Settings,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("tables", &self.tables.len())
            .field("descriptors", &self.descriptors.len())
            .field("policy", &self.settings.policy)
            .finish()
    }
}

impl Registry {
    /// Start building a registry with default settings.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    fn insert_table(&mut self, reg: TableRegistration) -> Result<(), RegistrationError> {
        if let Err(e) = reg.validate() {
            warn!("Rejected table registration: {}", e);
            return Err(e);
        }
        let index = self.tables.len();
        for &tid in reg.tids {
            self.table_index.entry(tid).or_default().push(index);
        }
        debug!(
            "Registered table {} (tid {:02X?}, {})",
            reg.name, reg.tids, reg.standards
        );
        self.tables.push(TableEntry::new(reg, index));
        Ok(())
    }

    fn insert_descriptor(
        &mut self,
        reg: DescriptorRegistration,
    ) -> Result<(), RegistrationError> {
        if let Err(e) = reg.validate() {
            warn!("Rejected descriptor registration: {}", e);
            return Err(e);
        }
        let index = self.descriptors.len();
        for key in reg.edid.keys() {
            self.descriptor_index.entry(key).or_default().push(index);
        }
        debug!(
            "Registered descriptor {} ({}, {})",
            reg.name, reg.edid, reg.standards
        );
        self.descriptors.push(DescriptorEntry::new(reg, index));
        Ok(())
    }

    fn filter(
        &self,
        standards: Standards,
        pid: Option<Pid>,
        policy: Option<ResolvePolicy>,
    ) -> Filter {
        Filter {
            standards: if standards.is_none() {
                self.settings.default_standards
            } else {
                standards
            },
            pid_standards: pid
                .map(|pid| self.settings.pid_table.standards(pid))
                .unwrap_or_default(),
            policy: policy.unwrap_or(self.settings.policy),
        }
    }

    // ---- tables ----

    /// All entries registered for `tid`, in registration order.
    pub fn table_candidates(&self, tid: Tid) -> Vec<&TableEntry> {
        self.table_index
            .get(&tid)
            .map(|indexes| indexes.iter().map(|&i| &self.tables[i]).collect())
            .unwrap_or_default()
    }

    /// Resolve a table id in `ctx`.
    pub fn table(&self, tid: Tid, ctx: impl Into<TableContext>) -> Resolution<&TableEntry> {
        let ctx = ctx.into();
        let filter = self.filter(ctx.standards, ctx.pid, ctx.policy);
        let result = resolver::resolve(self.table_candidates(tid), &filter);
        trace!("table 0x{:02X} in {:?}: {:?}", tid, ctx, result.map(|e| e.name()));
        if result.is_ambiguous() {
            warn!(
                "Table id 0x{:02X} is ambiguous (standards: {}, pid: {:?})",
                tid, ctx.standards, ctx.pid
            );
        }
        result
    }

    /// Standards that `tid` can be attributed to in `ctx`.
    ///
    /// NONE when the table id is unknown or shared by several standards that
    /// the context does not separate. Whenever [`Registry::table`] finds an
    /// entry in the same context, this is the mask of that entry.
    pub fn table_standards(&self, tid: Tid, ctx: impl Into<TableContext>) -> Standards {
        let ctx = ctx.into();
        let filter = self.filter(ctx.standards, ctx.pid, ctx.policy);
        resolver::standards_of(self.table_candidates(tid), &filter)
    }

    /// Factory of the table resolved for `tid` in `ctx`.
    pub fn table_factory(&self, tid: Tid, ctx: impl Into<TableContext>) -> Option<TableFactory> {
        self.table(tid, ctx).found().map(TableEntry::factory)
    }

    /// Create an empty table for `tid` in `ctx`.
    pub fn create_table(
        &self,
        tid: Tid,
        ctx: impl Into<TableContext>,
    ) -> Option<Box<dyn AbstractTable>> {
        self.table_factory(tid, ctx).map(|factory| factory())
    }

    /// Display routine of the table resolved for `tid` in `ctx`.
    pub fn section_display(
        &self,
        tid: Tid,
        ctx: impl Into<TableContext>,
    ) -> Option<SectionDisplay> {
        self.table(tid, ctx).found().map(TableEntry::display)
    }

    /// Log routine of the table resolved for `tid` in `ctx`.
    pub fn section_log(&self, tid: Tid, ctx: impl Into<TableContext>) -> Option<SectionLog> {
        self.table(tid, ctx).found().and_then(TableEntry::log)
    }

    /// Display `section` with the routine of its table.
    ///
    /// Returns `Ok(false)` without writing anything when the table id cannot
    /// be resolved; unknown sections are expected in real streams.
    pub fn display_section(
        &self,
        out: &mut dyn fmt::Write,
        section: &PsiSection<'_>,
        ctx: impl Into<TableContext>,
        indent: usize,
    ) -> Result<bool, fmt::Error> {
        match self.section_display(section.table_id(), ctx) {
            Some(display) => display(out, self, section, indent).map(|_| true),
            None => Ok(false),
        }
    }

    /// Canonical names of all registered tables.
    pub fn table_names(&self) -> BTreeSet<&'static str> {
        self.tables.iter().map(TableEntry::name).collect()
    }

    /// Table registered under `name`, compared case-insensitively.
    pub fn table_by_name(&self, name: &str) -> Option<&TableEntry> {
        self.tables
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
    }

    /// Tables conventionally carried on `pid`.
    pub fn tables_on_pid(&self, pid: Pid) -> Vec<&TableEntry> {
        self.tables.iter().filter(|e| e.pids().contains(&pid)).collect()
    }

    // ---- descriptors ----

    fn descriptor_candidates(&self, key: EdidKey) -> Vec<&DescriptorEntry> {
        self.descriptor_index
            .get(&key)
            .map(|indexes| indexes.iter().map(|&i| &self.descriptors[i]).collect())
            .unwrap_or_default()
    }

    /// Candidate sets to try in order for a descriptor.
    fn descriptor_lookup_keys(&self, tag: Did, ext: Option<u8>, ctx: &DescriptorContext) -> Vec<EdidKey> {
        match tag {
            did::MPEG_EXTENSION => ext.map(EdidKey::MpegExtension).into_iter().collect(),
            did::DVB_EXTENSION => ext.map(EdidKey::DvbExtension).into_iter().collect(),
            _ => {
                let mut keys = Vec::with_capacity(3);
                if let Some(tid) = ctx.table_id {
                    keys.push(EdidKey::TableSpecific(tag, tid));
                }
                if tag >= 0x80 {
                    if let Some(pds) = ctx.pds.filter(|&pds| pds != 0) {
                        keys.push(EdidKey::Private(tag, pds));
                    }
                }
                keys.push(EdidKey::Standard(tag));
                keys
            }
        }
    }

    /// Resolve a descriptor in `ctx`.
    ///
    /// `ext` is the extension tag (first payload byte) of MPEG and DVB
    /// extension descriptors and is ignored for other tags. Table-specific
    /// and private definitions take precedence over the regular one.
    pub fn descriptor(
        &self,
        tag: Did,
        ext: Option<u8>,
        ctx: impl Into<DescriptorContext>,
    ) -> Resolution<&DescriptorEntry> {
        let ctx = ctx.into();
        let filter = self.filter(ctx.standards, ctx.pid, ctx.policy);
        for key in self.descriptor_lookup_keys(tag, ext, &ctx) {
            let result = resolver::resolve(self.descriptor_candidates(key), &filter);
            trace!("descriptor {:?}: {:?}", key, result.map(|e| e.name()));
            match result {
                Resolution::NotFound => continue,
                Resolution::Ambiguous => {
                    warn!("Descriptor tag 0x{:02X} is ambiguous in {:?}", tag, ctx);
                    return Resolution::Ambiguous;
                }
                found => return found,
            }
        }
        Resolution::NotFound
    }

    /// Standards that a descriptor can be attributed to in `ctx`.
    pub fn descriptor_standards(
        &self,
        tag: Did,
        ext: Option<u8>,
        ctx: impl Into<DescriptorContext>,
    ) -> Standards {
        let ctx = ctx.into();
        let filter = self.filter(ctx.standards, ctx.pid, ctx.policy);
        // Same fall-through as `descriptor`: a key with no survivor is skipped.
        for key in self.descriptor_lookup_keys(tag, ext, &ctx) {
            let set = resolver::narrow(self.descriptor_candidates(key), &filter);
            if !set.is_empty() {
                return resolver::narrowed_standards(&set, &filter);
            }
        }
        Standards::NONE
    }

    /// Factory of the descriptor resolved in `ctx`.
    pub fn descriptor_factory(
        &self,
        tag: Did,
        ext: Option<u8>,
        ctx: impl Into<DescriptorContext>,
    ) -> Option<DescriptorFactory> {
        self.descriptor(tag, ext, ctx).found().map(DescriptorEntry::factory)
    }

    /// Create an empty descriptor resolved in `ctx`.
    pub fn create_descriptor(
        &self,
        tag: Did,
        ext: Option<u8>,
        ctx: impl Into<DescriptorContext>,
    ) -> Option<Box<dyn AbstractDescriptor>> {
        self.descriptor_factory(tag, ext, ctx).map(|factory| factory())
    }

    /// Display routine of the descriptor resolved in `ctx`.
    pub fn descriptor_display(
        &self,
        tag: Did,
        ext: Option<u8>,
        ctx: impl Into<DescriptorContext>,
    ) -> Option<DescriptorDisplay> {
        self.descriptor(tag, ext, ctx).found().map(DescriptorEntry::display)
    }

    /// Canonical names of all registered descriptors.
    pub fn descriptor_names(&self) -> BTreeSet<&'static str> {
        self.descriptors.iter().map(DescriptorEntry::name).collect()
    }

    /// Descriptor registered under `name`, compared case-insensitively.
    pub fn descriptor_by_name(&self, name: &str) -> Option<&DescriptorEntry> {
        self.descriptors
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
    }
}

/// Write phase of a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    /// Empty builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a configuration.
    pub fn with_config(mut self, config: &RepositoryConfig) -> Result<Self, ConfigError> {
        self.registry.settings = config.settings()?;
        Ok(self)
    }

    /// Register a table.
    pub fn register_table(
        &mut self,
        reg: TableRegistration,
    ) -> Result<&mut Self, RegistrationError> {
        self.registry.insert_table(reg)?;
        Ok(self)
    }

    /// Register a descriptor.
    pub fn register_descriptor(
        &mut self,
        reg: DescriptorRegistration,
    ) -> Result<&mut Self, RegistrationError> {
        self.registry.insert_descriptor(reg)?;
        Ok(self)
    }

    /// Register everything submitted with `inventory::submit!`.
    ///
    /// Invalid submissions are logged and skipped.
    pub fn extend_inventory(&mut self) -> &mut Self {
        for reg in inventory::iter::<TableRegistration> {
            let _ = self.registry.insert_table(*reg);
        }
        for reg in inventory::iter::<DescriptorRegistration> {
            let _ = self.registry.insert_descriptor(*reg);
        }
        self
    }

    /// Publish the registry.
    pub fn build(self) -> Registry {
        debug!(
            "Publishing registry: {} tables, {} descriptors",
            self.registry.tables.len(),
            self.registry.descriptors.len()
        );
        self.registry
    }
}

/// Shared, append-only handle to a published [`Registry`].
pub struct Repository {
    current: ArcSwap<Registry>,
    writer: Mutex<()>,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Repository").field(&*self.current.load()).finish()
    }
}

impl Repository {
    /// Publish `registry`.
    pub fn new(registry: Registry) -> Self {
        Repository {
            current: ArcSwap::from_pointee(registry),
            writer: Mutex::new(()),
        }
    }

    /// Current snapshot. Later registrations are not visible through it.
    pub fn snapshot(&self) -> Arc<Registry> {
        self.current.load_full()
    }

    fn update(
        &self,
        insert: impl FnOnce(&mut Registry) -> Result<(), RegistrationError>,
    ) -> Result<(), RegistrationError> {
        let _guard = self.writer.lock();
        let mut next = Registry::clone(&self.current.load());
        insert(&mut next)?;
        self.current.store(Arc::new(next));
        Ok(())
    }

    /// Register a table after publication.
    pub fn register_table(&self, reg: TableRegistration) -> Result<(), RegistrationError> {
        self.update(|registry| registry.insert_table(reg))
    }

    /// Register a descriptor after publication.
    pub fn register_descriptor(
        &self,
        reg: DescriptorRegistration,
    ) -> Result<(), RegistrationError> {
        self.update(|registry| registry.insert_descriptor(reg))
    }

    /// See [`Registry::table`].
    pub fn table(&self, tid: Tid, ctx: impl Into<TableContext>) -> Resolution<TableEntry> {
        self.current.load().table(tid, ctx).map(|e| *e)
    }

    /// See [`Registry::table_standards`].
    pub fn table_standards(&self, tid: Tid, ctx: impl Into<TableContext>) -> Standards {
        self.current.load().table_standards(tid, ctx)
    }

    /// See [`Registry::table_factory`].
    pub fn table_factory(&self, tid: Tid, ctx: impl Into<TableContext>) -> Option<TableFactory> {
        self.current.load().table_factory(tid, ctx)
    }

    /// See [`Registry::section_display`].
    pub fn section_display(
        &self,
        tid: Tid,
        ctx: impl Into<TableContext>,
    ) -> Option<SectionDisplay> {
        self.current.load().section_display(tid, ctx)
    }

    /// See [`Registry::descriptor`].
    pub fn descriptor(
        &self,
        tag: Did,
        ext: Option<u8>,
        ctx: impl Into<DescriptorContext>,
    ) -> Resolution<DescriptorEntry> {
        self.current.load().descriptor(tag, ext, ctx).map(|e| *e)
    }

    /// See [`Registry::descriptor_standards`].
    pub fn descriptor_standards(
        &self,
        tag: Did,
        ext: Option<u8>,
        ctx: impl Into<DescriptorContext>,
    ) -> Standards {
        self.current.load().descriptor_standards(tag, ext, ctx)
    }

    /// See [`Registry::table_names`].
    pub fn table_names(&self) -> BTreeSet<&'static str> {
        self.current.load().table_names()
    }

    /// See [`Registry::descriptor_names`].
    pub fn descriptor_names(&self) -> BTreeSet<&'static str> {
        self.current.load().descriptor_names()
    }
}

impl From<Registry> for Repository {
    fn from(registry: Registry) -> Self {
        Repository::new(registry)
    }
}
