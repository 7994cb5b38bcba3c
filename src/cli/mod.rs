//! Command-line interface for learnhub.
//!
//! Provides commands for verifying a content directory before build,
//! browsing the topic catalog, and showing a single rendered topic.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::{self, ResolvedConfig};
use crate::domain::{FilterState, SortMode, TimeBucket, Topic};
use crate::filter::apply_filters;
use crate::library::{Catalog, LazyCatalog, Lookup};
use crate::render::Widget;

pub mod verify;

/// Number of tags shown before collapsing into "+N"
const TAG_PREVIEW: usize = 3;

/// learnhub - Learn topic content pipeline
#[derive(Parser, Debug)]
#[command(name = "learnhub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Topic content directory (overrides config)
    #[arg(long, global = true)]
    pub content_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate every topic before build
    Verify {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List topics, optionally filtered and sorted
    List {
        /// Case-insensitive search over title, summary and tags
        #[arg(short, long)]
        query: Option<String>,

        /// Only topics in this domain (repeatable)
        #[arg(short, long)]
        domain: Vec<String>,

        /// Only topics at this level (repeatable)
        #[arg(short, long)]
        level: Vec<String>,

        /// Reading-time bucket: ≤5m, 5-15m, 15m+ (repeatable)
        #[arg(short, long)]
        time: Vec<TimeBucket>,

        /// Sort order: relevance, newest, shortest
        #[arg(short, long, default_value = "relevance")]
        sort: SortMode,

        /// Print topics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a topic and its rendered outline
    Show {
        /// Topic slug (case-insensitive)
        slug: String,

        /// Print the topic as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let content_dir = self.content_dir;

        match self.command {
            Commands::Verify { json } => verify::execute(content_dir, json).await,
            Commands::List {
                query,
                domain,
                level,
                time,
                sort,
                json,
            } => {
                let mut state = FilterState::new().with_sort(sort);
                if let Some(query) = query {
                    state = state.with_query(query);
                }
                state.selected_domains.extend(domain);
                state.selected_levels.extend(level);
                state.selected_time_buckets.extend(time);

                list_topics(content_dir, &state, json).await
            }
            Commands::Show { slug, json } => show_topic(content_dir, &slug, json).await,
            Commands::Config => show_config(content_dir),
        }
    }
}

/// Resolved configuration with the command-line override applied
fn resolved_config(content_dir: Option<PathBuf>) -> Result<ResolvedConfig> {
    let mut cfg = config::config()?.clone();
    if let Some(dir) = content_dir {
        cfg.content_dir = dir;
    }
    Ok(cfg)
}

/// Discover topics in the configured content directory
fn open_catalog(content_dir: Option<PathBuf>) -> Result<LazyCatalog> {
    let cfg = resolved_config(content_dir)?;
    LazyCatalog::discover(&cfg.content_dir, cfg.catalog_policy())
}

async fn load(lazy: &LazyCatalog) -> Result<&Catalog> {
    lazy.get().await.context("Failed to load topics")
}

/// List topics matching a filter state
async fn list_topics(content_dir: Option<PathBuf>, state: &FilterState, json: bool) -> Result<()> {
    let lazy = open_catalog(content_dir)?;
    let catalog = load(&lazy).await?;
    let topics = apply_filters(catalog.list_all(), state);

    if json {
        println!("{}", serde_json::to_string_pretty(&topics)?);
        return Ok(());
    }

    if topics.is_empty() {
        if state.is_active() {
            println!("No topics match the current filters");
        } else {
            println!("No topics found");
        }
        return Ok(());
    }

    println!(
        "{:<32} {:<16} {:<14} {:<6} {}",
        "SLUG", "DOMAIN", "LEVEL", "TIME", "TITLE"
    );
    println!("{}", "-".repeat(100));

    for topic in &topics {
        let marker = if catalog.is_invalid(&topic.slug) { " (invalid)" } else { "" };
        println!(
            "{:<32} {:<16} {:<14} {:<6} {}{}",
            truncate(&topic.slug, 32),
            truncate(&topic.domain, 16),
            topic.level,
            topic.time_to_read,
            topic.title,
            marker
        );
    }

    println!("\nShowing {} of {} topics", topics.len(), catalog.len());

    Ok(())
}

/// Topic detail for JSON output
#[derive(Serialize)]
struct TopicDetail<'a> {
    #[serde(flatten)]
    topic: &'a Topic,
    widgets: &'a [Widget],
    previous: Option<&'a str>,
    next: Option<&'a str>,
}

/// Show a single topic
async fn show_topic(content_dir: Option<PathBuf>, slug: &str, json: bool) -> Result<()> {
    let lazy = open_catalog(content_dir)?;
    let catalog = load(&lazy).await?;

    let doc = match catalog.get_by_slug(slug).await {
        Lookup::Found(doc) => doc,
        Lookup::NotFound => {
            eprintln!("Topic not found: {}", slug.trim());
            std::process::exit(1);
        }
    };

    let topic = &doc.topic;
    let neighbors = catalog.neighbors(&topic.slug);

    if json {
        let detail = TopicDetail {
            topic,
            widgets: &doc.widgets,
            previous: neighbors.previous.map(|t| t.slug.as_str()),
            next: neighbors.next.map(|t| t.slug.as_str()),
        };
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    println!("{}", "═".repeat(64));
    println!("  {}", topic.title);
    println!("  {}", topic.summary);
    println!("{}", "═".repeat(64));
    println!("  Slug:    {}", topic.slug);
    println!("  Domain:  {}", topic.domain);
    println!("  Level:   {}", topic.level);
    println!("  Time:    {}", topic.time_to_read);
    println!("  Updated: {}", topic.updated);

    let (shown, hidden) = topic.tag_preview(TAG_PREVIEW);
    if !shown.is_empty() {
        let mut tags = shown.join(", ");
        if hidden > 0 {
            tags.push_str(&format!(" +{}", hidden));
        }
        println!("  Tags:    {}", tags);
    }

    let errors = catalog.validation_errors(&topic.slug);
    if !errors.is_empty() {
        println!("\n  Validation errors:");
        for error in errors {
            println!("    - {}", error);
        }
    }

    println!("\nContents:");
    for widget in &doc.widgets {
        println!("  {}", outline(widget));
    }

    if let Some(sources) = topic.sources.as_deref().filter(|s| !s.is_empty()) {
        println!("\nSources:");
        for source in sources {
            println!("  - {} <{}>", source.title, source.url);
        }
    }

    println!();
    if let Some(previous) = neighbors.previous {
        println!("  ← {} ({})", previous.title, previous.slug);
    }
    if let Some(next) = neighbors.next {
        println!("  → {} ({})", next.title, next.slug);
    }

    Ok(())
}

/// One-line description of a widget
fn outline(widget: &Widget) -> String {
    match widget {
        Widget::Heading { level, text, anchor } => {
            format!("{} {} (#{})", "#".repeat(*level as usize), text, anchor)
        }
        Widget::Prose { text } => format!("[prose] {}", truncate(first_line(text), 60)),
        Widget::Code { language, code } => format!(
            "[code{}] {} lines",
            language.as_deref().map(|l| format!(":{}", l)).unwrap_or_default(),
            code.lines().count()
        ),
        Widget::Diagram { source } => format!("[diagram] {}", truncate(first_line(source), 60)),
        Widget::Checklist { items } => format!(
            "[checklist] {}/{} done",
            items.iter().filter(|i| i.checked).count(),
            items.len()
        ),
        Widget::Callout { text } => format!("[callout] {}", truncate(first_line(text), 60)),
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

/// Truncate to at most `max` characters, marking the cut with an ellipsis
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

/// Show the resolved configuration (for debugging)
fn show_config(content_dir: Option<PathBuf>) -> Result<()> {
    let cfg = resolved_config(content_dir)?;

    println!("{}", "═".repeat(64));
    println!("  learnhub configuration");
    println!("{}", "═".repeat(64));
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!("Profile:     {}", cfg.profile);
    println!();
    println!("Content directory: {}", cfg.content_dir.display());
    println!();
    println!("Catalog:");
    println!("  Duplicates:       {}", cfg.duplicates);
    println!("  Invalid topics:   {}", cfg.invalid_topics);
    println!("  Validate on load: {}", cfg.validate_on_load);

    Ok(())
}
