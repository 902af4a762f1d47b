//! Storefront CLI
//!
//! Back-office tool for a multi-tenant store: seeds demo data, issues signed
//! download links and prints dashboard reports as JSON.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use storefront_cli::output::{open_store, print_json};
use storefront_cli::report_cmd::{self, ReportAction};
use storefront_cli::seed_cmd::{self, SeedArgs};
use storefront_cli::token_cmd::{self, TokenAction};
use storefront_core::build_manifest;
use storefront_core::config::{PluginConfig, load_config};
use storefront_core::tracing_init::{default_filter_for, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(version, about = "Multi-tenant storefront back office", long_about = None)]
struct Cli {
    /// Project directory whose `.storefront/settings.json` overrides global config.
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,

    /// `SQLite` database file (defaults to the user data directory).
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Download link signing secret. Overrides the secret resolved from config
    /// files and the environment.
    #[arg(long, global = true)]
    secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Signed download tokens.
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Create the demo tenant, admin, products, customer and settings.
    Seed(SeedArgs),
    /// Print the collection manifest for the resolved config.
    Manifest,
    /// Dashboard reports.
    Report {
        /// Limit the report to one tenant slug.
        #[arg(long)]
        tenant: Option<String>,
        #[command(subcommand)]
        action: ReportAction,
    },
}

/// An explicit, non-empty `--secret` replaces the resolved signing secret.
fn apply_secret_flag(config: &mut PluginConfig, secret: Option<String>) {
    if let Some(secret) = secret.filter(|s| !s.is_empty()) {
        config.digital_file_storage.signing_secret = Some(secret);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.project_dir.as_deref())?;
    apply_secret_flag(&mut config, cli.secret);
    init_tracing(&default_filter_for(&config.log_level), cli.log_json);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting storefront CLI");

    match cli.command {
        Commands::Token { action } => token_cmd::run(action, &config, cli.db_path.as_deref()).await,
        Commands::Seed(args) => {
            let db = open_store(cli.db_path.as_deref()).await?;
            seed_cmd::run(&db, &args, &config).await
        }
        Commands::Manifest => print_json(&build_manifest(&config)),
        Commands::Report { tenant, action } => {
            let db = open_store(cli.db_path.as_deref()).await?;
            report_cmd::run(&db, action, tenant.as_deref()).await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;
    use storefront_core::analytics::{DateRange, FulfillmentStatus};

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_report_with_tenant_and_range() {
        let cli = Cli::try_parse_from([
            "storefront",
            "report",
            "--tenant",
            "acme",
            "analytics",
            "--range",
            "7d",
        ])
        .unwrap();
        match cli.command {
            Commands::Report { tenant, action } => {
                assert_eq!(tenant.as_deref(), Some("acme"));
                assert!(matches!(
                    action,
                    ReportAction::Analytics {
                        range: DateRange::Last7Days
                    }
                ));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_fulfillment_status_filter() {
        let cli =
            Cli::try_parse_from(["storefront", "report", "fulfillment", "--status", "shipped"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Report {
                action: ReportAction::Fulfillment {
                    status: Some(FulfillmentStatus::Shipped)
                },
                ..
            }
        ));
        assert!(
            Cli::try_parse_from(["storefront", "report", "analytics", "--range", "1y"]).is_err()
        );
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "storefront",
            "token",
            "issue",
            "--file-id",
            "f1",
            "--ttl",
            "60",
            "--db-path",
            "/tmp/s.db",
        ])
        .unwrap();
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/s.db")));
        assert!(matches!(
            cli.command,
            Commands::Token {
                action: TokenAction::Issue { ttl: Some(60), .. }
            }
        ));
    }

    #[test]
    fn secret_comes_only_from_the_flag() {
        let cli = Cli::try_parse_from(["storefront", "manifest"]).unwrap();
        assert_eq!(cli.secret, None);

        let mut config = PluginConfig::default();
        config.digital_file_storage.signing_secret = Some("from-custom-env".to_string());
        apply_secret_flag(&mut config, cli.secret);
        assert_eq!(
            config.digital_file_storage.signing_secret.as_deref(),
            Some("from-custom-env")
        );

        apply_secret_flag(&mut config, Some(String::new()));
        assert_eq!(
            config.digital_file_storage.signing_secret.as_deref(),
            Some("from-custom-env")
        );

        let cli = Cli::try_parse_from(["storefront", "manifest", "--secret", "flag"]).unwrap();
        apply_secret_flag(&mut config, cli.secret);
        assert_eq!(config.digital_file_storage.signing_secret.as_deref(), Some("flag"));
    }

    #[test]
    fn seed_defaults() {
        let cli = Cli::try_parse_from(["storefront", "seed"]).unwrap();
        match cli.command {
            Commands::Seed(args) => {
                assert_eq!(args.tenant_slug, "demo-store");
                assert_eq!(args.products, 5);
                assert!(!args.no_products);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
