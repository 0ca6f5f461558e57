//! Field metadata: local field definitions and remote describe records.

use crate::{FieldPermission, PermsetError, PermsetResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// The subset of a `<CustomField>` definition that drives access rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub formula: Option<String>,
}

impl FieldDefinition {
    pub fn from_xml(xml: &str) -> PermsetResult<Self> {
        quick_xml::de::from_str(xml).map_err(|e| PermsetError::parse("<field definition>", e))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> PermsetResult<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path).map_err(|e| PermsetError::io(path, e))?;
        quick_xml::de::from_str(&xml).map_err(|e| PermsetError::parse(path.display().to_string(), e))
    }

    /// The declared field type, treating an empty `<type/>` as missing.
    pub fn field_type(&self) -> Option<&str> {
        self.field_type.as_deref().filter(|t| !t.is_empty())
    }

    pub fn has_formula(&self) -> bool {
        self.formula.as_deref().is_some_and(|f| !f.trim().is_empty())
    }
}

/// Access a field should receive, derived from its local definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    /// Always accessible; a permission entry would be rejected on deploy
    Implicit,
    /// Computed or system-populated
    ReadOnly,
    ReadWrite,
}

impl FieldAccess {
    pub fn classify(definition: &FieldDefinition) -> Self {
        let field_type = definition.field_type();

        if definition.required
            || field_type.is_none()
            || field_type == Some("MasterDetail")
            || definition.full_name.as_deref() == Some("OwnerId")
        {
            FieldAccess::Implicit
        } else if matches!(field_type, Some("Summary") | Some("AutoNumber")) || definition.has_formula()
        {
            FieldAccess::ReadOnly
        } else {
            FieldAccess::ReadWrite
        }
    }

    /// The permission entry for this access level, if one should be written.
    pub fn permission(self, key: String) -> Option<FieldPermission> {
        match self {
            FieldAccess::Implicit => None,
            FieldAccess::ReadOnly => Some(FieldPermission {
                editable: None,
                field: key,
                readable: true,
            }),
            FieldAccess::ReadWrite => Some(FieldPermission {
                editable: Some(true),
                field: key,
                readable: true,
            }),
        }
    }
}

/// A field record from the org's describe endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescribe {
    pub name: String,
    #[serde(default)]
    pub createable: bool,
    #[serde(default)]
    pub updateable: bool,
    #[serde(default)]
    pub permissionable: bool,
}

impl FieldDescribe {
    pub fn editable(&self) -> bool {
        self.createable && self.updateable
    }

    /// Non-permissionable fields get no entry; everything else is readable.
    pub fn permission(&self, key: String) -> Option<FieldPermission> {
        if !self.permissionable {
            return None;
        }
        Some(FieldPermission {
            editable: Some(self.editable()),
            field: key,
            readable: true,
        })
    }
}

/// Describe results for one object, keyed by field API name.
pub type ObjectDescribe = HashMap<String, FieldDescribe>;

/// Describe results gathered for a single command invocation.
#[derive(Debug, Clone, Default)]
pub struct DescribeCache {
    objects: HashMap<String, ObjectDescribe>,
}

impl DescribeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: impl Into<String>, fields: ObjectDescribe) {
        self.objects.insert(object.into(), fields);
    }

    /// Index a describe response's field list by name.
    pub fn insert_fields(&mut self, object: impl Into<String>, fields: Vec<FieldDescribe>) {
        let by_name = fields.into_iter().map(|f| (f.name.clone(), f)).collect();
        self.insert(object, by_name);
    }

    pub fn field(&self, object: &str, field: &str) -> Option<&FieldDescribe> {
        self.objects.get(object).and_then(|fields| fields.get(field))
    }

    pub fn contains_object(&self, object: &str) -> bool {
        self.objects.contains_key(object)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn definition(field_type: Option<&str>) -> FieldDefinition {
        FieldDefinition {
            full_name: Some("Some_Field__c".to_string()),
            field_type: field_type.map(str::to_string),
            required: false,
            formula: None,
        }
    }

    #[test]
    fn test_parse_field_definition() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<CustomField xmlns="http://soap.sforce.com/2006/04/metadata">
    <fullName>Total__c</fullName>
    <externalId>false</externalId>
    <formula>Amount__c * 2</formula>
    <label>Total</label>
    <precision>18</precision>
    <required>false</required>
    <type>Number</type>
    <valueSet>
        <valueSetDefinition>
            <value><fullName>A</fullName></value>
        </valueSetDefinition>
    </valueSet>
</CustomField>"#;
        let def = FieldDefinition::from_xml(xml).unwrap();
        assert_eq!(def.full_name.as_deref(), Some("Total__c"));
        assert_eq!(def.field_type(), Some("Number"));
        assert!(!def.required);
        assert!(def.has_formula());
    }

    #[test]
    fn test_implicit_fields_get_no_entry() {
        let mut required = definition(Some("Text"));
        required.required = true;
        assert_eq!(FieldAccess::classify(&required), FieldAccess::Implicit);

        assert_eq!(
            FieldAccess::classify(&definition(Some("MasterDetail"))),
            FieldAccess::Implicit
        );
        assert_eq!(FieldAccess::classify(&definition(None)), FieldAccess::Implicit);
        assert_eq!(FieldAccess::classify(&definition(Some(""))), FieldAccess::Implicit);

        let mut owner = definition(Some("Lookup"));
        owner.full_name = Some("OwnerId".to_string());
        assert_eq!(FieldAccess::classify(&owner), FieldAccess::Implicit);

        assert_eq!(FieldAccess::Implicit.permission("A__c.B__c".into()), None);
    }

    #[test]
    fn test_computed_fields_are_read_only() {
        assert_eq!(
            FieldAccess::classify(&definition(Some("Summary"))),
            FieldAccess::ReadOnly
        );
        assert_eq!(
            FieldAccess::classify(&definition(Some("AutoNumber"))),
            FieldAccess::ReadOnly
        );

        let mut formula = definition(Some("Checkbox"));
        formula.formula = Some("ISBLANK(Name)".to_string());
        assert_eq!(FieldAccess::classify(&formula), FieldAccess::ReadOnly);

        let perm = FieldAccess::ReadOnly.permission("A__c.B__c".into()).unwrap();
        assert!(perm.readable);
        assert_eq!(perm.editable, None);
    }

    #[test]
    fn test_plain_fields_are_read_write() {
        assert_eq!(
            FieldAccess::classify(&definition(Some("Text"))),
            FieldAccess::ReadWrite
        );
        let perm = FieldAccess::ReadWrite.permission("A__c.B__c".into()).unwrap();
        assert_eq!(
            perm,
            FieldPermission {
                editable: Some(true),
                field: "A__c.B__c".to_string(),
                readable: true,
            }
        );
    }

    #[test]
    fn test_describe_permission() {
        let mut describe = FieldDescribe {
            name: "Status__c".to_string(),
            createable: true,
            updateable: false,
            permissionable: true,
        };
        let perm = describe.permission("Case.Status__c".into()).unwrap();
        assert!(perm.readable);
        assert_eq!(perm.editable, Some(false));

        describe.updateable = true;
        assert_eq!(
            describe.permission("Case.Status__c".into()).unwrap().editable,
            Some(true)
        );

        describe.permissionable = false;
        assert_eq!(describe.permission("Case.Status__c".into()), None);
    }

    #[test]
    fn test_describe_cache_lookup() {
        let mut cache = DescribeCache::new();
        cache.insert_fields(
            "Account",
            vec![FieldDescribe {
                name: "Rating".to_string(),
                permissionable: true,
                ..FieldDescribe::default()
            }],
        );
        assert!(cache.contains_object("Account"));
        assert!(cache.field("Account", "Rating").is_some());
        assert!(cache.field("Account", "Missing").is_none());
        assert!(cache.field("Contact", "Rating").is_none());
        assert_eq!(cache.len(), 1);
    }
}
