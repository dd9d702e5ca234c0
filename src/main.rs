//! # Newsdesk Admin
//!
//! Operator console for the newsdesk scraping and rewriting API.
//!
//! ## Features
//!
//! - Logs in against the admin API and prints a bearer token
//! - Lists the configured news sources, optionally filtered
//! - Registers new sources and edits existing ones
//! - Triggers a scrape of one source and follows its live log as the
//!   backend streams it, with coloured status lines
//! - Optionally saves each followed session as a JSON transcript
//!
//! ## Usage
//!
//! ```sh
//! newsdesk_admin --api-url http://localhost:5000 sources list
//! newsdesk_admin --token $TOKEN sources edit 65f1c0ffee --max-pages 3
//! newsdesk_admin --token $TOKEN scrape 65f1c0ffee
//! ```
//!
//! Diagnostics are written to stderr (filter with `RUST_LOG`); the console
//! view itself goes to stdout.

use chrono::{Local, Utc};
use clap::Parser;
use std::error::Error;
use std::io::{self, IsTerminal, Write};
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod config;
mod console;
mod decoder;
mod error;
mod models;
mod outputs;
mod render;
mod utils;

use api::AdminClient;
use cli::{AddArgs, Cli, Command, EditArgs, ListArgs, LoginArgs, ScrapeArgs, SourcesCommand};
use config::{FileConfig, Settings, load_file_config};
use console::{ConsoleEvent, StreamingLogConsole};
use models::{JobStatus, Website, WebsiteInput};
use outputs::transcript;
use render::{LogView, OutputFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(config = ?args.config, api_url = ?args.api_url, "Parsed CLI arguments");

    let file_config = match &args.config {
        Some(path) => load_file_config(path).await?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(args.api_url, args.token, file_config)?;
    info!(api = %settings.endpoints.base(), "Using admin API");

    let client = AdminClient::new(settings.endpoints)?;

    match args.command {
        Command::Login(login) => run_login(&client, login).await,
        Command::Sources(SourcesCommand::List(list)) => {
            run_sources(&client, settings.token.as_deref(), list).await
        }
        Command::Sources(SourcesCommand::Add(add)) => {
            run_source_add(&client, settings.token.as_deref(), add).await
        }
        Command::Sources(SourcesCommand::Edit(edit)) => {
            run_source_edit(&client, settings.token.as_deref(), edit).await
        }
        Command::Scrape(scrape) => run_scrape(&client, settings.token, scrape).await,
    }
}

fn require_token(token: Option<&str>) -> Result<&str, Box<dyn Error>> {
    token.ok_or_else(|| {
        "no token: pass --token, set NEWSDESK_TOKEN or add `token` to the config file".into()
    })
}

#[instrument(level = "info", skip_all, fields(email = %args.email))]
async fn run_login(client: &AdminClient, args: LoginArgs) -> Result<(), Box<dyn Error>> {
    let login = client.login(&args.email, &args.password).await?;
    info!(
        name = login.name.as_deref().unwrap_or("-"),
        account = login.email.as_deref().unwrap_or(&args.email),
        "Logged in"
    );
    println!("{}", login.token);
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn run_sources(
    client: &AdminClient,
    token: Option<&str>,
    args: ListArgs,
) -> Result<(), Box<dyn Error>> {
    let websites = client.list_websites(token).await?;
    let shown: Vec<&Website> = websites
        .iter()
        .filter(|site| args.search.as_deref().is_none_or(|needle| site.matches(needle)))
        .collect();
    debug!(total = websites.len(), shown = shown.len(), "Filtered websites");

    for site in shown {
        println!("{}", format_source_row(site));
    }
    Ok(())
}

#[instrument(level = "info", skip_all, fields(name = %args.name))]
async fn run_source_add(
    client: &AdminClient,
    token: Option<&str>,
    args: AddArgs,
) -> Result<(), Box<dyn Error>> {
    let token = require_token(token)?;
    let site = client.create_website(token, &args.to_input()).await?;
    println!("{}", format_source_row(&site));
    Ok(())
}

#[instrument(level = "info", skip_all, fields(id = %args.id))]
async fn run_source_edit(
    client: &AdminClient,
    token: Option<&str>,
    args: EditArgs,
) -> Result<(), Box<dyn Error>> {
    let token = require_token(token)?;
    let site = edit_source(client, token, &args).await?;
    println!("{}", format_source_row(&site));
    Ok(())
}

/// Fetch the stored source, apply the requested changes and save it back.
///
/// Updates replace the whole document, so the edit starts from what the
/// API currently holds.
async fn edit_source(
    client: &AdminClient,
    token: &str,
    args: &EditArgs,
) -> Result<Website, Box<dyn Error>> {
    let current = client
        .list_websites(Some(token))
        .await?
        .into_iter()
        .find(|site| site.id == args.id)
        .ok_or_else(|| format!("no source with id {}", args.id))?;

    let mut input = WebsiteInput::from(&current);
    args.apply(&mut input);
    let changed = input != WebsiteInput::from(&current);
    debug!(changed, "Prepared source update");
    Ok(client.update_website(token, &args.id, &input).await?)
}

fn format_source_row(site: &Website) -> String {
    let state = if site.is_active { "active" } else { "inactive" };
    let last = site
        .last_scraped_at
        .map(|at| at.with_timezone(&Local).format("%b %-d, %-I:%M %p").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        site.id,
        site.name,
        site.base_url,
        state,
        site.engine.as_deref().unwrap_or("-"),
        last
    )
}

/// Display name for a job: the source's name when the list has it, else the id.
async fn resolve_label(client: &AdminClient, token: &str, job_id: &str) -> String {
    match client.list_websites(Some(token)).await {
        Ok(sites) => sites
            .into_iter()
            .find(|site| site.id == job_id)
            .map(|site| site.name)
            .unwrap_or_else(|| job_id.to_string()),
        Err(e) => {
            warn!(error = %e, "Could not look up source name; using job id");
            job_id.to_string()
        }
    }
}

#[instrument(level = "info", skip_all, fields(job_id = %args.job_id))]
async fn run_scrape(
    client: &AdminClient,
    token: Option<String>,
    args: ScrapeArgs,
) -> Result<(), Box<dyn Error>> {
    let token = require_token(token.as_deref())?.to_string();
    let label = match args.label {
        Some(label) => label,
        None => resolve_label(client, &token, &args.job_id).await,
    };

    let format = if args.json { OutputFormat::Json } else { OutputFormat::Text };
    let color = !args.no_color && io::stdout().is_terminal();
    let view = LogView::new(format, color);
    let mut stdout = io::stdout();

    let mut console = StreamingLogConsole::new(client.job_source());
    let mut events = console.subscribe();
    console.open(&args.job_id, &label, &token).await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                view.render(&event, &mut stdout)?;
                if console.auto_scroll() {
                    stdout.flush()?;
                }
                if matches!(event, ConsoleEvent::StatusChanged(status) if status.is_terminal()) {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                info!("Interrupted; no longer following the job");
                break;
            }
        }
    }

    if console.status() == JobStatus::Running {
        info!(
            lines = console.lines().len(),
            "Job keeps running on the server; closing the console"
        );
    }
    let session = console.close().await;
    while let Ok(event) = events.try_recv() {
        view.render(&event, &mut stdout)?;
    }
    stdout.flush()?;

    let Some(session) = session else {
        return Ok(());
    };
    if let Some(dir) = &args.transcript_dir {
        let path = transcript::write_transcript(&session, dir, Utc::now()).await?;
        info!(path = %path.display(), "Transcript saved");
    }

    info!(status = ?session.status, lines = session.lines.len(), "Scrape session closed");
    if session.status == JobStatus::Errored {
        return Err(format!("scrape of {} failed", session.label).into());
    }
    Ok(())
}
