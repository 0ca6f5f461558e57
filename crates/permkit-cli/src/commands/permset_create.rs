//! Permset create command - Grant maximum access to objects, fields and tabs.

use anyhow::{Context, Result};
use permkit_format::{
    AssemblyOptions, AssemblyReport, Assembler, DescribeCache, FieldSource, ObjectSelection,
    PermissionSet, PermsetError, ProjectLayout,
};
use permkit_org::{describe_all, expand_describable, OrgSession, RestDescriber};
use serde::Serialize;
use std::path::Path;
use tracing::info;

pub struct CreateArgs<'a> {
    pub name: &'a str,
    pub object: Option<&'a str>,
    pub field: Option<&'a str>,
    pub directory: &'a Path,
    pub tab: bool,
    pub check_permissionable: bool,
    pub target_org: Option<&'a str>,
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateResult<'a> {
    path: String,
    report: &'a AssemblyReport,
    permission_set: &'a PermissionSet,
}

pub async fn run(args: &CreateArgs<'_>) -> Result<()> {
    // fail early when the org is needed but unavailable
    let session = if args.check_permissionable {
        let session = OrgSession::resolve(args.target_org)
            .await
            .context("An authenticated org is required when using --check-permissionable")?;
        Some(session)
    } else {
        None
    };

    let layout = ProjectLayout::new(args.directory);

    // an explicit object must exist locally before the org is asked about it
    if let Some(object) = args.object {
        if !layout.has_object(object) {
            return Err(PermsetError::ObjectNotFound {
                object: object.to_string(),
                dir: layout.objects_dir(),
            }
            .into());
        }
    }

    if let (Some(object), Some(field)) = (args.object, args.field) {
        if !layout.has_field(object, field) {
            anyhow::bail!("Field does not exist: {}/{}", object, field);
        }
    }

    let target = layout.permission_set_file(args.name);
    let mut doc = PermissionSet::load_or_skeleton(&target, args.name)
        .with_context(|| format!("Failed to read: {:?}", target))?;

    let selection = match args.object {
        Some(object) => ObjectSelection::single(object),
        None => ObjectSelection::from_layout(&layout)
            .with_context(|| format!("Failed to list objects in {:?}", layout.objects_dir()))?,
    };
    info!("Object list is {}", selection);

    let source = match session {
        Some(session) => FieldSource::Org(fetch_describes(&session, &selection).await?),
        None => FieldSource::Local,
    };

    let options = AssemblyOptions {
        field: args.field.map(str::to_string),
        tabs: args.tab,
    };
    let mut assembler = Assembler::new(layout, source);
    assembler.assemble(&mut doc, &selection, &options)?;

    doc.write_to_path(&target)
        .with_context(|| format!("Failed to write: {:?}", target))?;

    let report = assembler.into_report();
    if args.json {
        let result = CreateResult {
            path: target.to_string_lossy().to_string(),
            report: &report,
            permission_set: &doc,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("✅ Permissions added in {}", target.display());
        println!(
            "   Objects: {}  Fields: {} ({} read-only)  Tabs: {}  Unchanged: {}",
            report.objects_added,
            report.fields_added(),
            report.fields_read_only,
            report.tabs_added,
            report.unchanged
        );
        if !report.warnings.is_empty() {
            println!("⚠️  Warnings ({}):", report.warnings.len());
            for warning in &report.warnings {
                println!("   • {}", warning);
            }
        }
    }

    Ok(())
}

async fn fetch_describes(session: &OrgSession, selection: &ObjectSelection) -> Result<DescribeCache> {
    let objects = expand_describable(selection.iter());
    info!(
        "Getting describes for {} object(s) from {}",
        objects.len(),
        session.username
    );

    let describer = RestDescriber::new(session)?;
    let cache = describe_all(&describer, &objects).await?;
    info!("Done.");
    Ok(cache)
}
