use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use mail_rules::config::EngineConfig;
use mail_rules::mail::{GmailService, MessageSource};
use mail_rules::pipeline::{
    ActionDispatcher, DispatchOptions, RuleEngine, RunReport, apply_to_email, requested_action,
};
use mail_rules::rules::RuleSet;
use mail_rules::rules::loader::load_rule_set;
use mail_rules::store::{EmailStore, LibSqlEmailStore};

#[derive(Parser)]
#[command(name = "mail-rules")]
#[command(about = "Apply declarative rules to a Gmail mailbox", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Pull recent messages from Gmail into the local store
    Fetch,

    /// Apply the rule file to every stored message
    Process,

    /// Fetch, then process (default)
    Run,

    /// Apply one action to one stored email
    Action {
        /// Local id of the stored email
        email_id: i64,

        #[arg(value_parser = ["mark_as_read", "mark_as_unread", "move_message"])]
        action: String,

        /// Target label for move_message
        #[arg(long)]
        folder: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Fetch => fetch_and_process(&config, true, false).await,
        Command::Process => fetch_and_process(&config, false, true).await,
        Command::Run => fetch_and_process(&config, true, true).await,
        Command::Action {
            email_id,
            action,
            folder,
        } => single_action(&config, email_id, &action, folder.as_deref()).await,
    }
}

fn gmail_service(config: &EngineConfig) -> anyhow::Result<Arc<GmailService>> {
    let token = config
        .require_gmail_token()
        .context("a Gmail access token is required to fetch or modify mail")?;
    Ok(Arc::new(GmailService::with_base_url(
        token,
        config.gmail_api_base.clone(),
    )))
}

async fn open_store(config: &EngineConfig) -> anyhow::Result<LibSqlEmailStore> {
    LibSqlEmailStore::new_local(&config.db_path)
        .await
        .with_context(|| format!("opening email store at {}", config.db_path.display()))
}

async fn fetch_and_process(config: &EngineConfig, fetch: bool, process: bool) -> anyhow::Result<()> {
    // A bad rule file must fail before anything touches the mailbox.
    let rule_set = if process {
        Some(
            load_rule_set(&config.rules_path)
                .with_context(|| format!("invalid rule file {}", config.rules_path.display()))?,
        )
    } else {
        None
    };

    let gmail = gmail_service(config)?;
    let store = open_store(config).await?;

    if fetch {
        let emails = gmail
            .fetch_recent(config.fetch_limit)
            .await
            .context("fetching recent messages from Gmail")?;
        let inserted = store.save_all(&emails).await?;
        eprintln!("Fetched {} messages ({} new)", emails.len(), inserted);
    }

    if let Some(rule_set) = rule_set {
        let report = process_rules(config, &rule_set, &store, gmail).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if report.partial {
            std::process::exit(130);
        }
    }

    Ok(())
}

/// Run a validated rule set over every stored email.
async fn process_rules(
    config: &EngineConfig,
    rule_set: &RuleSet,
    store: &LibSqlEmailStore,
    gmail: Arc<GmailService>,
) -> anyhow::Result<RunReport> {
    let records = store.fetch_all().await?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, finishing in-flight actions");
                cancel.cancel();
            }
        });
    }

    let engine = RuleEngine::with_options(gmail, dispatch_options(config));
    Ok(engine.run(rule_set, &records, Utc::now(), &cancel).await)
}

async fn single_action(
    config: &EngineConfig,
    email_id: i64,
    name: &str,
    folder: Option<&str>,
) -> anyhow::Result<()> {
    let action = requested_action(name, folder)?;
    let gmail = gmail_service(config)?;
    let store = open_store(config).await?;

    let dispatcher = ActionDispatcher::new(gmail, dispatch_options(config));
    let receipt = apply_to_email(&store, &dispatcher, email_id, &action).await?;
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    if !receipt.outcome.is_applied() {
        std::process::exit(1);
    }
    Ok(())
}

fn dispatch_options(config: &EngineConfig) -> DispatchOptions {
    DispatchOptions {
        archive_on_move: config.archive_on_move,
    }
}
