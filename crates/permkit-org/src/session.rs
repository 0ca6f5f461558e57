//! Org sessions as reported by `sf org display`.

use crate::{run_sf, OrgError, OrgResult, DEFAULT_API_VERSION};
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

/// Connection details for an authenticated org.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgSession {
    pub username: String,
    pub access_token: String,
    pub instance_url: String,
    #[serde(default)]
    pub login_url: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    /// Only present for orgs with a generated password
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
}

impl std::fmt::Debug for OrgSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrgSession")
            .field("username", &self.username)
            .field("instance_url", &self.instance_url)
            .field("login_url", &self.login_url)
            .field("api_version", &self.api_version)
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}

impl OrgSession {
    /// Look up the session for `target_org`, or the CLI's default org.
    pub async fn resolve(target_org: Option<&str>) -> OrgResult<Self> {
        let mut args = vec!["org", "display", "--json"];
        if let Some(org) = target_org {
            args.extend(["--target-org", org]);
        }

        let output = run_sf(&args).await?;
        let session: OrgSession = output.parse()?;
        debug!("Resolved org session {:?}", session);
        Ok(session)
    }

    pub fn api_version(&self) -> &str {
        self.api_version
            .as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_API_VERSION)
    }

    /// Base URL for interactive logins, without a trailing slash.
    pub fn login_base(&self) -> &str {
        self.login_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(self.instance_url.as_str())
            .trim_end_matches('/')
    }

    /// A shareable URL that logs straight in with the org's username and password.
    pub fn login_url(&self, start_url: Option<&str>) -> OrgResult<String> {
        let password = self
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| OrgError::MissingPassword {
                username: self.username.clone(),
            })?;

        let mut params = vec![("un", self.username.as_str()), ("pw", password)];
        if let Some(start) = start_url {
            params.push(("startURL", start));
        }

        let base = format!("{}/login.jsp", self.login_base());
        let url = Url::parse_with_params(&base, &params).map_err(|e| OrgError::InvalidUrl {
            url: base.clone(),
            message: e.to_string(),
        })?;
        Ok(url.to_string())
    }
}
