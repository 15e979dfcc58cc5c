//! Yupay CLI - Database migrations, plan catalog tooling and offline checks.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! yupay-cli migrate
//!
//! # Print the built-in plan catalog, or validate an override
//! yupay-cli plans show
//! yupay-cli plans validate --file plans.yaml
//!
//! # Evaluate an action for a subscription fixture
//! yupay-cli check --subscription sub.json --action new_sale
//!
//! # Find stores near the Obelisco
//! yupay-cli nearby --stores stores.json --lat -34.6037 --lng -58.3816 --radius 5
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `plans show`, `plans validate` - Inspect plan catalogs
//! - `check` - Plan/limit evaluation without a database
//! - `nearby` - Geo store filtering without a database

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use yupay_core::{Feature, Usage};

mod commands;

use commands::check::{ActionKind, CheckArgs};

#[derive(Parser)]
#[command(name = "yupay-cli")]
#[command(author, version, about = "Yupay CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect plan catalogs
    Plans {
        #[command(subcommand)]
        action: PlansAction,
    },
    /// Evaluate an action for a subscription read from a JSON file
    Check {
        /// Subscription JSON file
        #[arg(short, long)]
        subscription: PathBuf,

        /// Action to evaluate
        #[arg(short, long, value_enum)]
        action: ActionKind,

        /// Products the owner already has
        #[arg(long, default_value_t = 0)]
        products: u32,

        /// Stores the owner already has
        #[arg(long, default_value_t = 0)]
        stores: u32,

        /// Flash offer radius in kilometers
        #[arg(long)]
        radius: Option<f64>,

        /// Feature name for `--action feature`
        #[arg(long, value_parser = commands::check::parse_feature)]
        feature: Option<Feature>,

        /// YAML plan catalog (defaults to the built-in one)
        #[arg(long)]
        plans: Option<PathBuf>,

        /// Evaluate as of this RFC 3339 instant instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// List active stores from a JSON file near a point
    Nearby {
        /// Store list JSON file
        #[arg(long)]
        stores: PathBuf,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Radius in kilometers (0 = same locality only)
        #[arg(long)]
        radius: f64,

        /// Locality of the search origin
        #[arg(long)]
        locality: Option<String>,
    },
}

#[derive(Subcommand)]
enum PlansAction {
    /// Print the plan catalog as JSON
    Show {
        /// YAML plan catalog (defaults to the built-in one)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Validate a YAML plan catalog
    Validate {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yupay_cli=info,yupay_storefront=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Plans { action } => match action {
            PlansAction::Show { file } => commands::plans::show(file.as_deref()).await?,
            PlansAction::Validate { file } => commands::plans::validate(&file).await?,
        },
        Commands::Check {
            subscription,
            action,
            products,
            stores,
            radius,
            feature,
            plans,
            at,
        } => {
            commands::check::run(CheckArgs {
                subscription: &subscription,
                plans: plans.as_deref(),
                action,
                usage: Usage { products, stores },
                radius_km: radius,
                feature,
                at,
            })
            .await?;
        }
        Commands::Nearby {
            stores,
            lat,
            lng,
            radius,
            locality,
        } => commands::nearby::run(&stores, lat, lng, radius, locality).await?,
    }
    Ok(())
}
