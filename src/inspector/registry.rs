//! Explicit inspector registry. No classpath-style scanning: a binary's
//! startup code constructs inspectors and adds them here by hand, in place
//! of reflective plugin discovery.

use std::collections::HashSet;

use crate::error::{ConfigurationError, Result};
use crate::inspector::{ClassInspector, FileInspector, Inspector};

/// Inspectors grouped by the node kind they are dispatched over. Global
/// membership is not a separate list — it is read straight off each
/// inspector's `descriptor().requires_all_nodes_processed` by the
/// scheduler, since a global inspector still needs a `supported_kind`.
#[derive(Default)]
pub struct Registry {
    file_inspectors: Vec<Box<dyn Inspector>>,
    class_inspectors: Vec<Box<dyn Inspector>>,
    /// Inspectors dispatched over `PackageNode`s. Always global — there is
    /// no package-kind multi-pass phase, only the phase 5 aggregate sweep
    /// (see `PackageMembershipInspector`).
    package_inspectors: Vec<Box<dyn Inspector>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_file(&mut self, inspector: impl FileInspector + 'static) -> &mut Self {
        self.file_inspectors.push(Box::new(inspector));
        self
    }

    pub fn register_class(&mut self, inspector: impl ClassInspector + 'static) -> &mut Self {
        self.class_inspectors.push(Box::new(inspector));
        self
    }

    pub fn file_inspectors(&self) -> &[Box<dyn Inspector>] {
        &self.file_inspectors
    }

    pub fn class_inspectors(&self) -> &[Box<dyn Inspector>] {
        &self.class_inspectors
    }

    /// Register a global, package-scoped inspector. No dedicated marker
    /// trait exists for this kind (unlike `FileInspector`/`ClassInspector`)
    /// since every registered package inspector is necessarily global.
    pub fn register_package(&mut self, inspector: impl Inspector + 'static) -> &mut Self {
        self.package_inspectors.push(Box::new(inspector));
        self
    }

    pub fn package_inspectors(&self) -> &[Box<dyn Inspector>] {
        &self.package_inspectors
    }

    /// Fatal configuration checks run once at startup, before any phase:
    /// no duplicate inspector names within any kind.
    pub fn validate(&self) -> Result<()> {
        check_unique_names(&self.file_inspectors)?;
        check_unique_names(&self.class_inspectors)?;
        check_unique_names(&self.package_inspectors)?;
        Ok(())
    }
}

fn check_unique_names(inspectors: &[Box<dyn Inspector>]) -> Result<()> {
    let mut seen = HashSet::new();
    for inspector in inspectors {
        let name = inspector.descriptor().name;
        if !seen.insert(name) {
            return Err(ConfigurationError::DuplicateInspector(name.to_string()).into());
        }
    }
    Ok(())
}
