//! Source-format project layout.
//!
//! ```text
//! <dir>/objects/<Object>/fields/<Field>.field-meta.xml
//! <dir>/tabs/<Object>.tab-meta.xml
//! <dir>/permissionsets/<Name>.permissionset-meta.xml
//! ```

use crate::{PermsetError, PermsetResult, FIELD_SUFFIX, PERMISSION_SET_SUFFIX, TAB_SUFFIX};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Paths within a metadata directory.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.root.join("objects")
    }

    pub fn object_dir(&self, object: &str) -> PathBuf {
        self.objects_dir().join(object)
    }

    pub fn fields_dir(&self, object: &str) -> PathBuf {
        self.object_dir(object).join("fields")
    }

    pub fn field_file(&self, object: &str, field: &str) -> PathBuf {
        self.fields_dir(object).join(format!("{}{}", field, FIELD_SUFFIX))
    }

    pub fn tab_file(&self, object: &str) -> PathBuf {
        self.root.join("tabs").join(format!("{}{}", object, TAB_SUFFIX))
    }

    pub fn permission_sets_dir(&self) -> PathBuf {
        self.root.join("permissionsets")
    }

    pub fn permission_set_file(&self, name: &str) -> PathBuf {
        self.permission_sets_dir()
            .join(format!("{}{}", name, PERMISSION_SET_SUFFIX))
    }

    pub fn has_object(&self, object: &str) -> bool {
        self.object_dir(object).is_dir()
    }

    pub fn has_field(&self, object: &str, field: &str) -> bool {
        self.field_file(object, field).is_file()
    }

    pub fn has_tab(&self, object: &str) -> bool {
        self.tab_file(object).is_file()
    }

    /// Object folder names under `objects/`, sorted. Hidden entries and plain files are skipped.
    pub fn list_objects(&self) -> PermsetResult<BTreeSet<String>> {
        let dir = self.objects_dir();
        let mut objects = BTreeSet::new();
        for entry in fs::read_dir(&dir).map_err(|e| PermsetError::io(&dir, e))? {
            let entry = entry.map_err(|e| PermsetError::io(&dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            objects.insert(name);
        }
        Ok(objects)
    }

    /// Field API names under `objects/<object>/fields/`, sorted.
    ///
    /// Returns `None` when the object has no fields folder.
    pub fn list_fields(&self, object: &str) -> PermsetResult<Option<Vec<String>>> {
        let dir = self.fields_dir(object);
        if !dir.is_dir() {
            return Ok(None);
        }

        let mut fields = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| PermsetError::io(&dir, e))? {
            let entry = entry.map_err(|e| PermsetError::io(&dir, e))?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            if let Some(field) = file_name.strip_suffix(FIELD_SUFFIX) {
                fields.push(field.to_string());
            }
        }
        fields.sort();
        Ok(Some(fields))
    }
}

/// The set of objects a run operates on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSelection {
    objects: BTreeSet<String>,
}

impl ObjectSelection {
    pub fn single(object: impl Into<String>) -> Self {
        let mut objects = BTreeSet::new();
        objects.insert(object.into());
        Self { objects }
    }

    /// Every object folder in the project.
    pub fn from_layout(layout: &ProjectLayout) -> PermsetResult<Self> {
        Ok(Self {
            objects: layout.list_objects()?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(String::as_str)
    }

    pub fn contains(&self, object: &str) -> bool {
        self.objects.contains(object)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl FromIterator<String> for ObjectSelection {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for ObjectSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "{}", names.join(", "))
    }
}
