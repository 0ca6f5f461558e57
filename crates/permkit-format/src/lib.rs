//! # permkit-format
//!
//! Core types and rules for Salesforce permission set metadata.
//!
//! This crate provides:
//! - A typed `PermissionSet` document with XML round-tripping
//! - Field definition parsing and field access classification
//! - Project layout helpers for source-format metadata directories
//! - The object/field/tab grant rules and the `Assembler` that merges them
//!   into an existing document without duplication
//!
//! ## Example
//!
//! ```rust,no_run
//! use permkit_format::{
//!     AssemblyOptions, Assembler, FieldSource, ObjectSelection, PermissionSet, ProjectLayout,
//! };
//!
//! let layout = ProjectLayout::new("force-app/main/default");
//! let target = layout.permission_set_file("MyPermSet");
//! let mut doc = PermissionSet::load_or_skeleton(&target, "MyPermSet")?;
//!
//! let selection = ObjectSelection::from_layout(&layout)?;
//! let mut assembler = Assembler::new(layout, FieldSource::Local);
//! assembler.assemble(&mut doc, &selection, &AssemblyOptions::default())?;
//! doc.write_to_path(&target)?;
//! # Ok::<(), permkit_format::PermsetError>(())
//! ```

mod assemble;
mod error;
mod field;
mod grants;
mod layout;
mod permset;

pub use assemble::*;
pub use error::*;
pub use field::*;
pub use grants::*;
pub use layout::*;
pub use permset::*;

/// Namespace declared on every metadata document
pub const METADATA_NAMESPACE: &str = "http://soap.sforce.com/2006/04/metadata";

/// Default source-format metadata directory
pub const DEFAULT_METADATA_DIR: &str = "force-app/main/default";

/// File suffix for permission set metadata
pub const PERMISSION_SET_SUFFIX: &str = ".permissionset-meta.xml";

/// File suffix for custom field metadata
pub const FIELD_SUFFIX: &str = ".field-meta.xml";

/// File suffix for custom tab metadata
pub const TAB_SUFFIX: &str = ".tab-meta.xml";
