//! Merging object, field and tab grants into a permission set.
//!
//! An `Assembler` is the state for one run: where the metadata lives, where
//! field capabilities come from, and what has been done so far. Every add
//! operation is idempotent by key; adding something that already exists is
//! logged and leaves the document untouched.

use crate::{
    describe_targets, object_grant, tab_supported, DescribeCache, FieldAccess, FieldDefinition,
    FieldPermission, ObjectKind, ObjectSelection, PermissionSet, PermsetError, PermsetResult,
    ProjectLayout, TabSetting, TabVisibility,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Where field capabilities are read from.
#[derive(Debug, Clone)]
pub enum FieldSource {
    /// Parse `<Field>.field-meta.xml` files in the project
    Local,
    /// Use describe results fetched from the org
    Org(DescribeCache),
}

impl FieldSource {
    fn is_org(&self) -> bool {
        matches!(self, FieldSource::Org(_))
    }
}

/// Options for a full assembly pass.
#[derive(Debug, Clone, Default)]
pub struct AssemblyOptions {
    /// Restrict field grants to this field (requires a single-object selection)
    pub field: Option<String>,
    /// Also grant tabs for objects that have one
    pub tabs: bool,
}

/// What an assembly pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    pub objects_added: usize,
    pub fields_read_write: usize,
    pub fields_read_only: usize,
    /// Fields that need no entry (required, master-detail, owner, or not permissionable)
    pub fields_skipped: usize,
    pub tabs_added: usize,
    /// Grants that were already present
    pub unchanged: usize,
    pub warnings: Vec<String>,
}

impl AssemblyReport {
    pub fn fields_added(&self) -> usize {
        self.fields_read_write + self.fields_read_only
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

pub struct Assembler {
    layout: ProjectLayout,
    source: FieldSource,
    report: AssemblyReport,
}

impl Assembler {
    pub fn new(layout: ProjectLayout, source: FieldSource) -> Self {
        Self {
            layout,
            source,
            report: AssemblyReport::default(),
        }
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn report(&self) -> &AssemblyReport {
        &self.report
    }

    pub fn into_report(self) -> AssemblyReport {
        self.report
    }

    /// Grant object access according to the object's suffix.
    ///
    /// Returns true if an entry was added.
    pub fn add_object_permissions(&mut self, doc: &mut PermissionSet, object: &str) -> bool {
        if doc.has_object_permission(object) {
            info!("Object Permission already exists: {}. Nothing to add.", object);
            self.report.unchanged += 1;
            return false;
        }

        match object_grant(object) {
            Some(grant) => {
                info!(
                    "Added {} perms for {}",
                    ObjectKind::of(object).describe(),
                    object
                );
                doc.object_permissions.push(grant);
                self.report.objects_added += 1;
                true
            }
            None => {
                debug!("No object perms apply to {}", object);
                false
            }
        }
    }

    /// Grant access to one field.
    pub fn add_field_permission(
        &mut self,
        doc: &mut PermissionSet,
        object: &str,
        field: &str,
    ) -> PermsetResult<()> {
        self.grant_field(doc, object, object, field)
    }

    /// Grant access to every field defined for `object`.
    ///
    /// A missing fields folder is a warning, not an error.
    pub fn add_all_field_permissions(
        &mut self,
        doc: &mut PermissionSet,
        object: &str,
    ) -> PermsetResult<()> {
        self.grant_all_fields(doc, object, &[object.to_string()])
    }

    /// Grant tab visibility for a custom or external object.
    pub fn add_tab(&mut self, doc: &mut PermissionSet, object: &str) -> bool {
        if !tab_supported(object) {
            self.report
                .warn(format!("Tab for this object type is not supported: {}", object));
            return false;
        }

        if doc.has_tab_setting(object) {
            info!("Tab setting already exists: {}. Nothing to add.", object);
            self.report.unchanged += 1;
            return false;
        }

        doc.tab_settings.push(TabSetting {
            tab: object.to_string(),
            visibility: TabVisibility::Visible,
        });
        self.report.tabs_added += 1;
        info!("Added tab permission for {}", object);
        true
    }

    /// Run the object, field and tab steps for every selected object.
    ///
    /// Stops at the first fatal error; the document may then be partially
    /// updated and should not be written.
    pub fn assemble(
        &mut self,
        doc: &mut PermissionSet,
        selection: &ObjectSelection,
        options: &AssemblyOptions,
    ) -> PermsetResult<()> {
        for object in selection.iter() {
            if !self.layout.has_object(object) {
                return Err(PermsetError::ObjectNotFound {
                    object: object.to_string(),
                    dir: self.layout.objects_dir(),
                });
            }

            let targets = if self.source.is_org() {
                describe_targets(object)
            } else {
                vec![object.to_string()]
            };

            for target in &targets {
                self.add_object_permissions(doc, target);
            }

            match &options.field {
                Some(field) => {
                    for target in &targets {
                        self.grant_field(doc, object, target, field)?;
                    }
                }
                None => self.grant_all_fields(doc, object, &targets)?,
            }

            if options.tabs && self.layout.has_tab(object) {
                self.add_tab(doc, object);
            }
        }

        Ok(())
    }

    fn grant_all_fields(
        &mut self,
        doc: &mut PermissionSet,
        object: &str,
        targets: &[String],
    ) -> PermsetResult<()> {
        info!("------ going to add all fields for {}", object);

        let Some(fields) = self.layout.list_fields(object)? else {
            let dir = self.layout.fields_dir(object);
            self.report
                .warn(format!("there is no fields folder at {}", dir.display()));
            return Ok(());
        };

        for field in &fields {
            for target in targets {
                self.grant_field(doc, object, target, field)?;
            }
        }
        Ok(())
    }

    /// `object` names the folder holding the definition; `target` is the
    /// object the permission is written for.
    fn grant_field(
        &mut self,
        doc: &mut PermissionSet,
        object: &str,
        target: &str,
        field: &str,
    ) -> PermsetResult<()> {
        let key = FieldPermission::key(target, field);
        if doc.has_field_permission(&key) {
            info!("Field Permission already exists: {}. Nothing to add.", key);
            self.report.unchanged += 1;
            return Ok(());
        }

        let permission = match &self.source {
            FieldSource::Org(cache) => match cache.field(target, field) {
                Some(describe) => describe.permission(key),
                None => {
                    self.report
                        .warn(format!("field not found on org: {}/{}", target, field));
                    return Ok(());
                }
            },
            FieldSource::Local => {
                let path = self.layout.field_file(object, field);
                if !path.is_file() {
                    return Err(PermsetError::FieldNotFound {
                        object: object.to_string(),
                        field: field.to_string(),
                    });
                }
                let definition = FieldDefinition::from_path(&path)?;
                debug!("{}/{}: {:?}", object, field, definition);
                FieldAccess::classify(&definition).permission(key)
            }
        };

        match permission {
            Some(permission) => {
                let editable = permission.editable == Some(true);
                info!(
                    "Read{} permission added for field {}/{}",
                    if editable { "/Edit" } else { "-only" },
                    target,
                    field
                );
                if editable {
                    self.report.fields_read_write += 1;
                } else {
                    self.report.fields_read_only += 1;
                }
                doc.field_permissions.push(permission);
            }
            None => {
                info!("field {}/{} needs no permissions", target, field);
                self.report.fields_skipped += 1;
            }
        }
        Ok(())
    }
}
