//! permkit CLI - Build Salesforce permission sets and org login URLs.
//!
//! - `permkit permset create`: grant maximum access to objects, fields and tabs
//!   in a permission set, creating it if needed
//! - `permkit user loginurl`: print a shareable login URL for an org

use anyhow::Result;
use clap::{Parser, Subcommand};
use permkit_format::DEFAULT_METADATA_DIR;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;

#[derive(Parser)]
#[command(name = "permkit")]
#[command(author, version, about = "Build Salesforce permission sets and org login URLs", long_about = None)]
struct Cli {
    /// Log every grant decision and parsed field definition
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with permission sets
    Permset {
        #[command(subcommand)]
        command: PermsetCommands,
    },

    /// Work with org users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum PermsetCommands {
    /// Create or add to a permission set with maximum access
    Create {
        /// Permission set name; an existing one is added to, otherwise it is created
        #[arg(short, long)]
        name: String,

        /// API name of an object to add perms for (default: every object)
        #[arg(short, long)]
        object: Option<String>,

        /// API name of a field to add perms for (default: every field)
        #[arg(short, long, requires = "object")]
        field: Option<String>,

        /// Metadata directory
        #[arg(short, long, default_value = DEFAULT_METADATA_DIR)]
        directory: PathBuf,

        /// Also add the tab for each object that has one
        #[arg(short, long)]
        tab: bool,

        /// Check on the org which fields are permissionable instead of reading field files
        #[arg(short, long = "check-permissionable")]
        check_permissionable: bool,

        /// Org username or alias (default: the sf CLI's default org)
        #[arg(short = 'u', long, env = "SF_TARGET_ORG")]
        target_org: Option<String>,

        /// Output as JSON (for machine consumption)
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Print a long-lived login URL with username and password
    Loginurl {
        /// Page to open after login (e.g., /lightning/setup/ObjectManager/home)
        #[arg(short = 'p', long)]
        start_url: Option<String>,

        /// Org username or alias (default: the sf CLI's default org)
        #[arg(short = 'u', long, env = "SF_TARGET_ORG")]
        target_org: Option<String>,

        /// Output as JSON (for machine consumption)
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Permset {
            command:
                PermsetCommands::Create {
                    name,
                    object,
                    field,
                    directory,
                    tab,
                    check_permissionable,
                    target_org,
                    json,
                },
        } => {
            let args = commands::permset_create::CreateArgs {
                name: &name,
                object: object.as_deref(),
                field: field.as_deref(),
                directory: &directory,
                tab,
                check_permissionable,
                target_org: target_org.as_deref(),
                json,
            };
            commands::permset_create::run(&args).await
        }
        Commands::User {
            command:
                UserCommands::Loginurl {
                    start_url,
                    target_org,
                    json,
                },
        } => commands::loginurl::run(start_url.as_deref(), target_org.as_deref(), json).await,
    }
}

fn init_tracing(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("info,permkit=debug,permkit_format=debug,permkit_org=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
