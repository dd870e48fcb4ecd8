mod cmd;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cmd::reconcile::Backend;
use std::path::PathBuf;
use xcheck_core::{config::WarnLevel, ActionClient, ActionRequest, ClientConfig};

#[derive(Parser)]
#[command(
    name = "xcheck",
    about = "Verify follow, like, repost and comment actions against the X scraping API",
    version,
    propagate_version = true
)]
struct Cli {
    /// YAML config file
    #[arg(long, global = true, env = "XCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// API base URL (overrides the config file)
    #[arg(long, global = true, env = "XCHECK_BASE_URL")]
    base_url: Option<String>,

    /// API key (overrides the config file)
    #[arg(long, global = true, env = "XCHECK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Delay after each batch item, in milliseconds
    #[arg(long, global = true)]
    pace_ms: Option<u64>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log requests and summaries
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the API is up
    Health,

    /// Show rate-limit statistics for this API key
    Stats,

    /// Check whether the logged-in account follows a user
    Follow {
        /// Target user, with or without the leading @
        user: String,
    },

    /// Check whether a post is liked
    Like { url: String },

    /// Check whether a post is reposted
    Repost { url: String },

    /// Check whether a user commented on a post
    Comment {
        url: String,
        /// User whose reply to look for
        user: String,
    },

    /// Check a list of actions from a JSON file, in file order
    ///
    /// The file holds an array of objects with a `key` plus the action,
    /// e.g. [{"key": "follow_check", "type": "follow", "target_user": "@x"}].
    Batch { file: PathBuf },

    /// Check a campaign's required actions and record the results
    ///
    /// The file holds an array of actions,
    /// e.g. [{"type": "like", "tweet_url": "https://x.com/a/status/1"}].
    Reconcile {
        #[arg(long)]
        user: String,
        #[arg(long)]
        campaign: String,
        /// Database file
        #[arg(long)]
        db: PathBuf,
        #[arg(long, value_enum, default_value_t = Backend::Sqlite)]
        backend: Backend,
        file: PathBuf,
    },

    /// List recorded actions for a user in a campaign
    Records {
        #[arg(long)]
        user: String,
        #[arg(long)]
        campaign: String,
        #[arg(long)]
        db: PathBuf,
        #[arg(long, value_enum, default_value_t = Backend::Sqlite)]
        backend: Backend,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let json = cli.json;
    let config = resolve_config(&cli)?;
    let client = || ActionClient::new(&config).context("failed to build API client");

    match cli.command {
        Commands::Health => cmd::check::health(&client()?, json),
        Commands::Stats => cmd::check::stats(&client()?, json),
        Commands::Follow { user } => {
            cmd::check::action(&client()?, &ActionRequest::follow(user), json)
        }
        Commands::Like { url } => cmd::check::action(&client()?, &ActionRequest::like(url), json),
        Commands::Repost { url } => {
            cmd::check::action(&client()?, &ActionRequest::repost(url), json)
        }
        Commands::Comment { url, user } => {
            cmd::check::action(&client()?, &ActionRequest::comment(url, user), json)
        }
        Commands::Batch { file } => cmd::batch::run(&client()?, &file, json),
        Commands::Reconcile {
            user,
            campaign,
            db,
            backend,
            file,
        } => cmd::reconcile::run(&client()?, backend, &db, &user, &campaign, &file, json),
        Commands::Records {
            user,
            campaign,
            db,
            backend,
        } => cmd::reconcile::records(backend, &db, &user, &campaign, json),
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config.api_key = api_key.clone();
    }
    if let Some(ms) = cli.pace_ms {
        config.pacing.interval_ms = ms;
    }

    for w in config.validate() {
        if w.level == WarnLevel::Warning {
            tracing::warn!("{}", w.message);
        }
    }
    Ok(config)
}
