use analytics::MetricReport;
use analyzer::{MetricsReporter, ReportStores};
use anyhow::{Context, bail};
use api_client::{AzureDevOpsClient, GitHubClient};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::{Config, LogFormat};
use core_types::{AzureDevOpsScope, AzureDevOpsSettings, FetchWindow, GitHubScope, GitHubSettings};
use database::{
    EventStore, MemoryTableBackend, PgTableBackend, SettingsStore, TableBackend, connect,
    run_migrations,
};
use indicatif::{ProgressBar, ProgressStyle};
use ingestion::{AzureDevOpsIngestion, GitHubIngestion, SourceStores, SyncSummary};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

// Read only when no saved profile exists for the target.
const AZURE_DEVOPS_PAT_ENV: &str = "AZURE_DEVOPS_PAT";
const GITHUB_CLIENT_ID_ENV: &str = "GITHUB_CLIENT_ID";
const GITHUB_CLIENT_SECRET_ENV: &str = "GITHUB_CLIENT_SECRET";

/// Entry point for the DevOps metrics CLI.
#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; variables may come from the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Command failed.");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = configuration::load_config_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _guard = configuration::init_tracing(&config.logging)?;

    let app = App::new(config, cli.memory).await?;
    match cli.command {
        Commands::Settings(command) => handle_settings(&app, command).await,
        Commands::Sync(command) => handle_sync(&app, command).await,
        Commands::Metrics(command) => handle_metrics(&app, command).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Collects build and pull request history from Azure DevOps and GitHub and
/// reports DevOps performance metrics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Use an in-memory table store instead of Postgres. Nothing is persisted.
    #[arg(long, global = true)]
    memory: bool,

    /// Overrides `logging.format` from the configuration file.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save or list connection profiles.
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Copy new builds, pull requests and commits into the table store.
    #[command(subcommand)]
    Sync(SyncCommand),

    /// Report deployment frequency, lead time, time to restore and change failure rate.
    #[command(subcommand)]
    Metrics(MetricsCommand),
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Save an Azure DevOps profile.
    Azure(AzureSettingsArgs),
    /// Save a GitHub profile.
    Github(GitHubSettingsArgs),
    /// List saved profiles. Secrets are not shown.
    List,
}

#[derive(Subcommand)]
enum SyncCommand {
    Azure(AzureSyncArgs),
    Github(GitHubSyncArgs),
}

#[derive(Subcommand)]
enum MetricsCommand {
    Azure(AzureMetricsArgs),
    Github(GitHubMetricsArgs),
}

/// Identifies an Azure DevOps build pipeline.
#[derive(Args)]
struct AzureTarget {
    #[arg(long)]
    organization: String,
    #[arg(long)]
    project: String,
    #[arg(long)]
    repository: String,
    #[arg(long)]
    build_name: String,
}

/// Identifies a GitHub Actions workflow.
#[derive(Args)]
struct GitHubTarget {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    repo: String,
    #[arg(long)]
    workflow_name: String,
}

#[derive(Args)]
struct WindowArgs {
    /// Lookback window in days. Defaults to `sync.number_of_days`.
    #[arg(long)]
    days: Option<u32>,
    /// Maximum number of items. Defaults to `sync.max_number_of_items`.
    #[arg(long)]
    max_items: Option<u32>,
}

#[derive(Args)]
struct AzureSettingsArgs {
    #[command(flatten)]
    target: AzureTarget,
    #[arg(long)]
    branch: String,
    #[arg(long)]
    build_id: String,
    /// Personal access token.
    #[arg(long, env = AZURE_DEVOPS_PAT_ENV, hide_env_values = true)]
    pat_token: String,
}

#[derive(Args)]
struct GitHubSettingsArgs {
    #[command(flatten)]
    target: GitHubTarget,
    #[arg(long)]
    branch: String,
    #[arg(long)]
    workflow_id: String,
    #[arg(long, env = GITHUB_CLIENT_ID_ENV)]
    client_id: String,
    #[arg(long, env = GITHUB_CLIENT_SECRET_ENV, hide_env_values = true)]
    client_secret: String,
}

#[derive(Args)]
struct AzureSyncArgs {
    #[command(flatten)]
    target: AzureTarget,
    #[command(flatten)]
    window: WindowArgs,
    /// Overrides the saved branch; required without a saved profile.
    #[arg(long)]
    branch: Option<String>,
    /// Overrides the saved build definition id; required without a saved profile.
    #[arg(long)]
    build_id: Option<String>,
}

#[derive(Args)]
struct GitHubSyncArgs {
    #[command(flatten)]
    target: GitHubTarget,
    #[command(flatten)]
    window: WindowArgs,
    #[arg(long)]
    branch: Option<String>,
    #[arg(long)]
    workflow_id: Option<String>,
}

#[derive(Args)]
struct AzureMetricsArgs {
    #[command(flatten)]
    target: AzureTarget,
    #[command(flatten)]
    window: WindowArgs,
    /// Print the reports as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct GitHubMetricsArgs {
    #[command(flatten)]
    target: GitHubTarget,
    #[command(flatten)]
    window: WindowArgs,
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Application Wiring
// ==============================================================================

/// The loaded configuration plus the one table backend every store shares.
struct App {
    config: Config,
    backend: Arc<dyn TableBackend>,
    memory: bool,
}

impl App {
    async fn new(config: Config, memory: bool) -> anyhow::Result<Self> {
        let backend: Arc<dyn TableBackend> = if memory {
            tracing::info!("Using the in-memory table store; nothing will be persisted.");
            Arc::new(MemoryTableBackend::new())
        } else {
            let pool = connect(config.storage.database_url.as_deref(), config.storage.max_connections)
                .await
                .context("Failed to connect to the database")?;
            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            Arc::new(PgTableBackend::new(pool))
        };
        Ok(Self {
            config,
            backend,
            memory,
        })
    }

    fn store(&self, table: &str) -> EventStore {
        EventStore::new(self.backend.clone(), table)
    }

    fn settings(&self) -> SettingsStore {
        SettingsStore::new(self.store(&self.config.tables.settings))
    }

    fn azure_devops_stores(&self) -> SourceStores {
        let tables = &self.config.tables;
        SourceStores {
            builds: self.store(&tables.azure_devops_builds),
            pull_requests: self.store(&tables.azure_devops_pull_requests),
            pull_request_commits: self.store(&tables.azure_devops_pull_request_commits),
        }
    }

    fn github_stores(&self) -> SourceStores {
        let tables = &self.config.tables;
        SourceStores {
            builds: self.store(&tables.github_runs),
            pull_requests: self.store(&tables.github_pull_requests),
            pull_request_commits: self.store(&tables.github_pull_request_commits),
        }
    }

    fn report_stores(stores: &SourceStores) -> ReportStores {
        ReportStores {
            builds: stores.builds.clone(),
            pull_requests: stores.pull_requests.clone(),
        }
    }

    fn window(&self, args: &WindowArgs) -> anyhow::Result<FetchWindow> {
        let window = FetchWindow::new(
            args.days.unwrap_or(self.config.sync.number_of_days),
            args.max_items.unwrap_or(self.config.sync.max_number_of_items),
        )?;
        Ok(window)
    }
}

impl AzureTarget {
    /// Scope for reading stored history; branch and build id are not part of any key.
    fn scope(&self) -> AzureDevOpsScope {
        AzureDevOpsScope {
            organization: self.organization.clone(),
            project: self.project.clone(),
            repository: self.repository.clone(),
            branch: String::new(),
            build_name: self.build_name.clone(),
            build_id: String::new(),
        }
    }
}

impl GitHubTarget {
    fn scope(&self) -> GitHubScope {
        GitHubScope {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            branch: String::new(),
            workflow_name: self.workflow_name.clone(),
            workflow_id: String::new(),
        }
    }
}

// ==============================================================================
// Settings Command Logic
// ==============================================================================

async fn handle_settings(app: &App, command: SettingsCommand) -> anyhow::Result<()> {
    let settings = app.settings();
    match command {
        SettingsCommand::Azure(args) => {
            let mut scope = args.target.scope();
            scope.branch = args.branch;
            scope.build_id = args.build_id;
            let profile = AzureDevOpsSettings {
                pat_token: args.pat_token,
                scope,
            };
            settings.save_azure_devops(&profile).await?;
            println!("Saved Azure DevOps settings for {}.", profile.scope.build_name);
        }
        SettingsCommand::Github(args) => {
            let mut scope = args.target.scope();
            scope.branch = args.branch;
            scope.workflow_id = args.workflow_id;
            let profile = GitHubSettings {
                client_id: args.client_id,
                client_secret: args.client_secret,
                scope,
            };
            settings.save_github(&profile).await?;
            println!("Saved GitHub settings for {}.", profile.scope.workflow_name);
        }
        SettingsCommand::List => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL).set_header(vec![
                "Platform", "Owner / Org", "Project / Repo", "Branch", "Pipeline", "Id",
            ]);
            for profile in settings.list_azure_devops().await? {
                let s = profile.scope;
                table.add_row(vec![
                    "Azure DevOps".to_string(),
                    s.organization,
                    format!("{}/{}", s.project, s.repository),
                    s.branch,
                    s.build_name,
                    s.build_id,
                ]);
            }
            for profile in settings.list_github().await? {
                let s = profile.scope;
                table.add_row(vec!["GitHub".to_string(), s.owner, s.repo, s.branch, s.workflow_name, s.workflow_id]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

// ==============================================================================
// Sync Command Logic
// ==============================================================================

async fn handle_sync(app: &App, command: SyncCommand) -> anyhow::Result<()> {
    match command {
        SyncCommand::Azure(args) => {
            let window = app.window(&args.window)?;
            let profile = resolve_azure_devops_profile(app, &args).await?;
            let client = AzureDevOpsClient::new(&profile.pat_token)?;
            let stores = app.azure_devops_stores();
            let ingestion = AzureDevOpsIngestion::new(Arc::new(client), stores.clone());

            let spinner = spinner(format!("Syncing Azure DevOps {}...", profile.scope.build_name))?;
            let result = ingestion.sync_all(&profile.scope, window).await;
            finish_spinner(&spinner, &result);
            println!("{}", result?);

            if app.memory {
                let reports = MetricsReporter::new()
                    .azure_devops_reports(&App::report_stores(&stores), &profile.scope, window, Utc::now())
                    .await?;
                print_reports(&reports, false)?;
            }
        }
        SyncCommand::Github(args) => {
            let window = app.window(&args.window)?;
            let profile = resolve_github_profile(app, &args).await?;
            let client = GitHubClient::new(&profile.client_id, &profile.client_secret)?;
            let stores = app.github_stores();
            let ingestion = GitHubIngestion::new(Arc::new(client), stores.clone());

            let spinner = spinner(format!("Syncing GitHub {}...", profile.scope.workflow_name))?;
            let result = ingestion.sync_all(&profile.scope, window).await;
            finish_spinner(&spinner, &result);
            println!("{}", result?);

            if app.memory {
                let reports = MetricsReporter::new()
                    .github_reports(&App::report_stores(&stores), &profile.scope, window, Utc::now())
                    .await?;
                print_reports(&reports, false)?;
            }
        }
    }
    Ok(())
}

/// The saved profile for the target, with any flag overrides applied. Without
/// a saved profile the PAT comes from the environment and the branch and build
/// id from flags.
async fn resolve_azure_devops_profile(app: &App, args: &AzureSyncArgs) -> anyhow::Result<AzureDevOpsSettings> {
    let t = &args.target;
    let saved = app
        .settings()
        .get_azure_devops(&t.organization, &t.project, &t.repository, &t.build_name)
        .await?;

    let mut profile = match saved {
        Some(profile) => profile,
        None => {
            let Ok(pat_token) = std::env::var(AZURE_DEVOPS_PAT_ENV) else {
                bail!(
                    "No saved Azure DevOps settings for {}; run `settings azure` first or set {}",
                    t.build_name,
                    AZURE_DEVOPS_PAT_ENV
                );
            };
            AzureDevOpsSettings {
                pat_token,
                scope: t.scope(),
            }
        }
    };
    if let Some(branch) = &args.branch {
        profile.scope.branch = branch.clone();
    }
    if let Some(build_id) = &args.build_id {
        profile.scope.build_id = build_id.clone();
    }
    if profile.scope.branch.is_empty() || profile.scope.build_id.is_empty() {
        bail!("--branch and --build-id are required when no settings are saved");
    }
    Ok(profile)
}

async fn resolve_github_profile(app: &App, args: &GitHubSyncArgs) -> anyhow::Result<GitHubSettings> {
    let t = &args.target;
    let saved = app
        .settings()
        .get_github(&t.owner, &t.repo, &t.workflow_name)
        .await?;

    let mut profile = match saved {
        Some(profile) => profile,
        None => {
            let (Ok(client_id), Ok(client_secret)) = (
                std::env::var(GITHUB_CLIENT_ID_ENV),
                std::env::var(GITHUB_CLIENT_SECRET_ENV),
            ) else {
                bail!(
                    "No saved GitHub settings for {}; run `settings github` first or set {} and {}",
                    t.workflow_name,
                    GITHUB_CLIENT_ID_ENV,
                    GITHUB_CLIENT_SECRET_ENV
                );
            };
            GitHubSettings {
                client_id,
                client_secret,
                scope: t.scope(),
            }
        }
    };
    if let Some(branch) = &args.branch {
        profile.scope.branch = branch.clone();
    }
    if let Some(workflow_id) = &args.workflow_id {
        profile.scope.workflow_id = workflow_id.clone();
    }
    if profile.scope.branch.is_empty() || profile.scope.workflow_id.is_empty() {
        bail!("--branch and --workflow-id are required when no settings are saved");
    }
    Ok(profile)
}

fn spinner(message: String) -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

fn finish_spinner<E>(spinner: &ProgressBar, result: &Result<SyncSummary, E>) {
    match result {
        Ok(summary) => spinner.finish_with_message(format!("Sync complete: {} new rows.", summary.total())),
        Err(_) => spinner.abandon_with_message("Sync failed."),
    }
}

// ==============================================================================
// Metrics Command Logic
// ==============================================================================

async fn handle_metrics(app: &App, command: MetricsCommand) -> anyhow::Result<()> {
    let reporter = MetricsReporter::new();
    let now = Utc::now();
    match command {
        MetricsCommand::Azure(args) => {
            let window = app.window(&args.window)?;
            let stores = App::report_stores(&app.azure_devops_stores());
            let reports = reporter
                .azure_devops_reports(&stores, &args.target.scope(), window, now)
                .await?;
            print_reports(&reports, args.json)
        }
        MetricsCommand::Github(args) => {
            let window = app.window(&args.window)?;
            let stores = App::report_stores(&app.github_stores());
            let reports = reporter
                .github_reports(&stores, &args.target.scope(), window, now)
                .await?;
            print_reports(&reports, args.json)
        }
    }
}

fn print_reports(reports: &[MetricReport], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Metric", "Value", "Rating", "Items", "Window"]);
    for report in reports {
        table.add_row(vec![
            report.metric.to_string(),
            report.display_value(),
            report.rating.to_string(),
            report.total_items.to_string(),
            format!(
                "{} days / max {}",
                report.number_of_days, report.max_number_of_items
            ),
        ]);
    }
    if let Some(first) = reports.first() {
        println!("{} · {}", first.platform, first.deployment_name);
    }
    println!("{table}");
    Ok(())
}
