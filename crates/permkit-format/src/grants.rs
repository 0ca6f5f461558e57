//! The grant rule table.

use crate::ObjectPermission;

/// Object categories distinguished by API name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// `__c`
    Custom,
    /// `__e`
    PlatformEvent,
    /// `__b`
    BigObject,
    /// Standard objects and any other suffix
    Other,
}

impl ObjectKind {
    pub fn of(object: &str) -> Self {
        if object.ends_with("__c") {
            ObjectKind::Custom
        } else if object.ends_with("__e") {
            ObjectKind::PlatformEvent
        } else if object.ends_with("__b") {
            ObjectKind::BigObject
        } else {
            ObjectKind::Other
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ObjectKind::Custom => "regular object",
            ObjectKind::PlatformEvent => "platform event",
            ObjectKind::BigObject => "big object",
            ObjectKind::Other => "object",
        }
    }
}

/// The object permission to grant, or `None` when the suffix carries no grant.
pub fn object_grant(object: &str) -> Option<ObjectPermission> {
    match ObjectKind::of(object) {
        ObjectKind::Custom => Some(ObjectPermission {
            allow_create: Some(true),
            allow_delete: Some(true),
            allow_edit: Some(true),
            allow_read: Some(true),
            modify_all_records: Some(true),
            object: object.to_string(),
            view_all_records: Some(true),
        }),
        ObjectKind::PlatformEvent | ObjectKind::BigObject => Some(ObjectPermission {
            allow_create: Some(true),
            allow_read: Some(true),
            object: object.to_string(),
            ..ObjectPermission::default()
        }),
        ObjectKind::Other => None,
    }
}

/// Tabs can only be granted for custom and external objects.
pub fn tab_supported(object: &str) -> bool {
    object.contains("__c") || object.contains("__x")
}

/// Objects whose fields are granted under other names when checked against an org.
///
/// The describe endpoint rejects `Activity`; its fields are permissioned on
/// `Event` and `Task` instead.
pub fn describe_targets(object: &str) -> Vec<String> {
    match object {
        "Activity" => vec!["Event".to_string(), "Task".to_string()],
        other => vec![other.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_custom_object_gets_full_access() {
        let grant = object_grant("Foo__c").unwrap();
        assert_eq!(
            grant,
            ObjectPermission {
                allow_create: Some(true),
                allow_delete: Some(true),
                allow_edit: Some(true),
                allow_read: Some(true),
                modify_all_records: Some(true),
                object: "Foo__c".to_string(),
                view_all_records: Some(true),
            }
        );
    }

    #[test]
    fn test_events_and_big_objects_get_create_read() {
        for name in ["Foo__e", "Foo__b"] {
            let grant = object_grant(name).unwrap();
            assert_eq!(grant.allow_create, Some(true));
            assert_eq!(grant.allow_read, Some(true));
            assert_eq!(grant.allow_edit, None);
            assert_eq!(grant.allow_delete, None);
            assert_eq!(grant.modify_all_records, None);
            assert_eq!(grant.view_all_records, None);
        }
    }

    #[test]
    fn test_other_suffixes_get_nothing() {
        for name in ["Account", "Foo__x", "Foo__mdt", "Foo__c_Bar"] {
            assert_eq!(object_grant(name), None, "{}", name);
        }
    }

    #[test]
    fn test_tab_support() {
        assert!(tab_supported("Foo__c"));
        assert!(tab_supported("Foo__x"));
        assert!(!tab_supported("Account"));
        assert!(!tab_supported("Foo__e"));
    }

    #[test]
    fn test_activity_targets() {
        assert_eq!(describe_targets("Activity"), vec!["Event", "Task"]);
        assert_eq!(describe_targets("Account"), vec!["Account"]);
    }
}
