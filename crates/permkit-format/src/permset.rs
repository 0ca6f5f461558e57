//! The permission set document and its XML round-trip.
//!
//! Elements are declared in the order the metadata schema lists them, so a
//! serialized document always comes out in canonical order regardless of how
//! the source file was arranged.

use crate::{PermsetError, PermsetResult, METADATA_NAMESPACE};
use quick_xml::events::Event;
use quick_xml::se::Serializer;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const ROOT_ELEMENT: &str = "PermissionSet";

/// Child elements of `<PermissionSet>` that round-trip through [`PermissionSet`].
pub const KNOWN_ELEMENTS: &[&str] = &[
    "applicationVisibilities",
    "classAccesses",
    "customMetadataTypeAccesses",
    "customPermissions",
    "customSettingAccesses",
    "description",
    "emailRoutingAddressAccesses",
    "externalCredentialPrincipalAccesses",
    "externalDataSourceAccesses",
    "fieldPermissions",
    "flowAccesses",
    "hasActivationRequired",
    "label",
    "license",
    "objectPermissions",
    "pageAccesses",
    "recordTypeVisibilities",
    "servicePresenceStatusAccesses",
    "tabSettings",
    "userLicense",
    "userPermissions",
];

/// A permission set document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSet {
    /// Namespace attribute on the root element
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    pub xmlns: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub application_visibilities: Vec<ApplicationVisibility>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_accesses: Vec<ClassAccess>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_metadata_type_accesses: Vec<NamedAccess>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_permissions: Vec<CustomPermissionAccess>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_setting_accesses: Vec<NamedAccess>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_routing_address_accesses: Vec<NamedAccess>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_credential_principal_accesses: Vec<ExternalCredentialPrincipalAccess>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_data_source_accesses: Vec<ExternalDataSourceAccess>,
    /// Field-level grants, keyed by `Object.Field`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_permissions: Vec<FieldPermission>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flow_accesses: Vec<FlowAccess>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_activation_required: Option<bool>,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Object-level grants, keyed by object name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_permissions: Vec<ObjectPermission>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub page_accesses: Vec<PageAccess>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub record_type_visibilities: Vec<RecordTypeVisibility>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_presence_status_accesses: Vec<ServicePresenceStatusAccess>,
    /// Tab visibility settings, keyed by tab name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tab_settings: Vec<TabSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_license: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_permissions: Vec<UserPermission>,
}

/// Object-level access. Flags left as `None` are omitted from the XML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPermission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_create: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_edit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modify_all_records: Option<bool>,
    pub object: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_all_records: Option<bool>,
}

/// Field-level access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPermission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    /// `Object.Field`
    pub field: String,
    #[serde(default)]
    pub readable: bool,
}

impl FieldPermission {
    /// Build the `Object.Field` key used by field permissions.
    pub fn key(object: &str, field: &str) -> String {
        format!("{}.{}", object, field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSetting {
    pub tab: String,
    pub visibility: TabVisibility,
}

/// Visibility values allowed on a permission set tab setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabVisibility {
    Available,
    Visible,
    #[serde(rename = "None")]
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationVisibility {
    pub application: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAccess {
    pub apex_class: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPermissionAccess {
    pub enabled: bool,
    pub name: String,
}

/// An `enabled` + `name` entry: custom metadata types, custom settings and
/// email routing addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedAccess {
    pub enabled: bool,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCredentialPrincipalAccess {
    pub enabled: bool,
    pub external_credential_principal: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDataSourceAccess {
    pub enabled: bool,
    pub external_data_source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowAccess {
    pub enabled: bool,
    pub flow: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePresenceStatusAccess {
    pub service_presence_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAccess {
    pub apex_page: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTypeVisibility {
    pub record_type: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermission {
    pub enabled: bool,
    pub name: String,
}

impl PermissionSet {
    /// The document used when no permission set file exists yet.
    pub fn skeleton(label: impl Into<String>) -> Self {
        Self {
            xmlns: Some(METADATA_NAMESPACE.to_string()),
            has_activation_required: Some(false),
            label: label.into(),
            ..Self::default()
        }
    }

    /// Parse a permission set from XML text.
    ///
    /// Fails with [`PermsetError::UnsupportedElement`] if the document has a
    /// section that would be lost on rewrite.
    pub fn from_xml(xml: &str) -> PermsetResult<Self> {
        Self::parse("<permission set>", xml)
    }

    /// Read a permission set from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> PermsetResult<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path).map_err(|e| PermsetError::io(path, e))?;
        Self::parse(&path.display().to_string(), &xml)
    }

    fn parse(origin: &str, xml: &str) -> PermsetResult<Self> {
        let doc = quick_xml::de::from_str(xml).map_err(|e| PermsetError::parse(origin, e))?;
        if let Some(element) = first_unknown_element(xml) {
            return Err(PermsetError::UnsupportedElement {
                origin: origin.to_string(),
                element,
            });
        }
        Ok(doc)
    }

    /// Read the permission set at `path` if it exists, otherwise start from a skeleton.
    pub fn load_or_skeleton<P: AsRef<Path>>(path: P, label: &str) -> PermsetResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::debug!("Merging into existing permission set {:?}", path);
            Self::from_path(path)
        } else {
            tracing::debug!("No permission set at {:?}, starting a new one", path);
            Ok(Self::skeleton(label))
        }
    }

    /// Serialize to XML with declaration and 4-space indentation.
    pub fn to_xml(&self) -> PermsetResult<String> {
        let write_err = |source| PermsetError::WriteXml {
            element: ROOT_ELEMENT,
            source,
        };

        let mut body = String::new();
        let mut ser = Serializer::with_root(&mut body, Some(ROOT_ELEMENT)).map_err(write_err)?;
        ser.indent(' ', 4);
        self.serialize(ser).map_err(write_err)?;

        Ok(format!("{}\n{}\n", XML_DECLARATION, body))
    }

    /// Write the permission set to a path, creating parent directories.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> PermsetResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PermsetError::io(parent, e))?;
        }
        let xml = self.to_xml()?;
        fs::write(path, xml).map_err(|e| PermsetError::io(path, e))
    }

    pub fn has_object_permission(&self, object: &str) -> bool {
        self.object_permissions.iter().any(|p| p.object == object)
    }

    /// Check for a field permission by `Object.Field` key.
    pub fn has_field_permission(&self, key: &str) -> bool {
        self.field_permissions.iter().any(|p| p.field == key)
    }

    pub fn has_tab_setting(&self, tab: &str) -> bool {
        self.tab_settings.iter().any(|t| t.tab == tab)
    }
}

/// The first direct child of the root element that is not in [`KNOWN_ELEMENTS`].
fn first_unknown_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;

    loop {
        let (name, opens) = match reader.read_event() {
            Ok(Event::Start(e)) => (e.local_name().as_ref().to_vec(), true),
            Ok(Event::Empty(e)) => (e.local_name().as_ref().to_vec(), false),
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                continue;
            }
            // syntax errors are reported by the deserializer
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => continue,
        };

        if depth == 1 {
            let name = String::from_utf8_lossy(&name);
            if !KNOWN_ELEMENTS.contains(&name.as_ref()) {
                return Some(name.into_owned());
            }
        }
        if opens {
            depth += 1;
        }
    }
}
