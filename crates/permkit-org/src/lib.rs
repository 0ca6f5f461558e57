//! # permkit-org
//!
//! Talking to a Salesforce org for permkit.
//!
//! This crate provides:
//! - `sf` CLI invocation and parsing of its `--json` envelope
//! - Session resolution (`sf org display`) and login URL construction
//! - A REST describe client and the parallel describe fan-out used to check
//!   which fields are permissionable
//!
//! ## Example
//!
//! ```rust,no_run
//! use permkit_org::{describe_all, OrgSession, RestDescriber};
//!
//! # async fn run() -> permkit_org::OrgResult<()> {
//! let session = OrgSession::resolve(Some("my-scratch")).await?;
//! let describer = RestDescriber::new(&session)?;
//! let cache = describe_all(&describer, &["Account".to_string()]).await?;
//! println!("{}", session.login_url(None)?);
//! # Ok(())
//! # }
//! ```

mod describe;
mod error;
mod session;
mod sf;

pub use describe::*;
pub use error::*;
pub use session::*;
pub use sf::*;

/// API version used when the org does not report one
pub const DEFAULT_API_VERSION: &str = "61.0";
