//! Loginurl command - Print a shareable login URL for an org.

use anyhow::{Context, Result};
use permkit_org::OrgSession;

pub async fn run(start_url: Option<&str>, target_org: Option<&str>, json: bool) -> Result<()> {
    let session = OrgSession::resolve(target_org)
        .await
        .context("Failed to look up the org session")?;

    let url = session.login_url(start_url)?;

    if json {
        let result = serde_json::json!({
            "username": session.username,
            "url": url,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", url);
    }

    Ok(())
}
