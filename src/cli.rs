//! Command-line interface definitions for the newsdesk admin console.
//!
//! Global options select the API and credential; each subcommand is one
//! operator action. Most options can also come from environment variables
//! or the YAML config file (see [`crate::config`]).

use crate::models::{DEFAULT_ENGINE, WebsiteInput};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const ENGINES: [&str; 2] = ["playwright", "cheerio"];

/// Command-line arguments for the newsdesk admin console.
///
/// # Examples
///
/// ```sh
/// # Obtain a token
/// newsdesk_admin login --email ops@example.com
///
/// # Find a source and follow a scrape of it
/// newsdesk_admin sources list --search cnn
/// NEWSDESK_TOKEN=... newsdesk_admin scrape 65f1c0ffee --label "CNN Lite"
///
/// # Register a source, then pause it
/// newsdesk_admin sources add --name "NPR Text" --base-url https://text.npr.org
/// newsdesk_admin sources edit 65f1c0ffee --inactive
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Base URL of the admin API
    #[arg(long, global = true, env = "NEWSDESK_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for authenticated calls
    #[arg(long, global = true, env = "NEWSDESK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Optional path to config.yaml file
    #[arg(short, long, global = true, env = "NEWSDESK_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Exchange email and password for a bearer token (printed to stdout)
    Login(LoginArgs),
    /// List, add or edit news sources
    #[command(subcommand)]
    Sources(SourcesCommand),
    /// Trigger a scrape job and follow its live log
    Scrape(ScrapeArgs),
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "NEWSDESK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum SourcesCommand {
    /// List the configured news sources
    List(ListArgs),
    /// Register a new source
    Add(AddArgs),
    /// Change fields of an existing source; unspecified fields keep their value
    Edit(EditArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show sources whose name or URL contains this text (case-insensitive)
    #[arg(short, long)]
    pub search: Option<String>,
}

/// Scraper settings shared by `sources add` and `sources edit`.
#[derive(Args, Debug)]
pub struct ScraperOptions {
    /// Selector of the article links on a listing page
    #[arg(long)]
    pub item_link: Option<String>,

    /// Selector of the article body
    #[arg(long)]
    pub content_wrapper: Option<String>,

    /// Selector of the category tags
    #[arg(long)]
    pub categories: Option<String>,

    /// Selector to wait for before reading the page
    #[arg(long)]
    pub wait_for_selector: Option<String>,

    /// Listing URL with a page placeholder
    #[arg(long)]
    pub url_pattern: Option<String>,

    #[arg(long)]
    pub start_page: Option<u32>,

    #[arg(long)]
    pub max_pages: Option<u32>,
}

impl ScraperOptions {
    fn apply(&self, input: &mut WebsiteInput) {
        let selectors = &mut input.selectors;
        let pagination = &mut input.pagination;
        set(&mut selectors.item_link, &self.item_link);
        set(&mut selectors.content_wrapper, &self.content_wrapper);
        set(&mut selectors.categories, &self.categories);
        set(&mut selectors.wait_for_selector, &self.wait_for_selector);
        set(&mut pagination.url_pattern, &self.url_pattern);
        set(&mut pagination.start_page, &self.start_page);
        set(&mut pagination.max_pages, &self.max_pages);
    }
}

fn set<T: Clone>(field: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *field = value.clone();
    }
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub name: String,

    /// Home page of the source
    #[arg(long)]
    pub base_url: String,

    /// Defaults to one derived from the name
    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long, default_value = DEFAULT_ENGINE, value_parser = ENGINES)]
    pub engine: String,

    /// Register the source paused
    #[arg(long)]
    pub inactive: bool,

    #[command(flatten)]
    pub scraper: ScraperOptions,
}

impl AddArgs {
    /// The document to create.
    pub fn to_input(&self) -> WebsiteInput {
        let mut input = WebsiteInput::new(self.name.as_str(), self.base_url.as_str());
        set(&mut input.slug, &self.slug);
        input.engine = self.engine.clone();
        input.is_active = !self.inactive;
        self.scraper.apply(&mut input);
        input
    }
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Identifier of the source to change
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub base_url: Option<String>,

    /// Kept as stored when omitted, even if the name changes
    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long, value_parser = ENGINES)]
    pub engine: Option<String>,

    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,

    #[arg(long)]
    pub inactive: bool,

    #[command(flatten)]
    pub scraper: ScraperOptions,
}

impl EditArgs {
    /// Override the stored document with every option that was given.
    pub fn apply(&self, input: &mut WebsiteInput) {
        set(&mut input.name, &self.name);
        set(&mut input.base_url, &self.base_url);
        set(&mut input.slug, &self.slug);
        set(&mut input.engine, &self.engine);
        if self.active {
            input.is_active = true;
        } else if self.inactive {
            input.is_active = false;
        }
        self.scraper.apply(input);
    }
}

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Identifier of the source to scrape
    pub job_id: String,

    /// Display name; looked up from the source list when omitted
    #[arg(short, long)]
    pub label: Option<String>,

    /// Print log lines as JSON objects instead of the terminal view
    #[arg(long)]
    pub json: bool,

    /// Disable ANSI colours
    #[arg(long)]
    pub no_color: bool,

    /// Write the closed session as JSON under this directory
    #[arg(long)]
    pub transcript_dir: Option<PathBuf>,
}
