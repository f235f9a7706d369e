//! tributes - publish memorial tributes and keep the archive consistent
//!
//! Every command that changes the record store regenerates the global
//! archive, the per-type archives, the sitemap and the affected detail pages
//! before it returns.

use clap::{Args, Parser, Subcommand};
use eyre::{Result, WrapErr};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tribute::config::{DEFAULT_CONFIG_PATH, find_project_root, load_config, load_config_or_default};
use tribute::errors::is_validation;
use tribute::publisher::{Published, Regeneration};
use tribute::{NewTribute, Publisher, Site, TributeEdit};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "tributes")]
#[command(about = "Publish memorial tribute pages and keep their archives consistent")]
#[command(version)]
struct Cli {
    /// Path to config file (default: .config/tributes/config.yaml)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish a new tribute
    Publish(PublishArgs),
    /// Change fields of an existing tribute
    Edit(EditArgs),
    /// Remove a tribute and its page
    Delete {
        /// Slug of the tribute to remove
        slug: String,
    },
    /// Regenerate every page from the record store
    Rebuild,
    /// List tributes in display order
    List {
        /// Only tributes whose submitter has not been notified yet
        #[arg(long)]
        pending_notices: bool,
    },
    /// Add tribute folders that predate the record store
    Import,
}

#[derive(Args, Debug)]
struct PublishArgs {
    /// Pet's name
    #[arg(long)]
    name: String,
    /// Pet type, e.g. Dog
    #[arg(long = "type", value_name = "TYPE", default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    breed: String,
    /// Dates of life, e.g. "2010-2024"
    #[arg(long, default_value = "")]
    years: String,
    /// Tribute message
    #[arg(long, conflicts_with = "message_file")]
    message: Option<String>,
    /// Read the tribute message from a file
    #[arg(long, value_name = "PATH")]
    message_file: Option<PathBuf>,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    state: String,
    #[arg(long, default_value = "")]
    email: String,
    /// Publish date (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS), default now
    #[arg(long)]
    date: Option<String>,
    /// Pin to the front of the archive
    #[arg(long)]
    featured: bool,
    /// Main photo
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,
    /// Second photo
    #[arg(long, value_name = "PATH")]
    image2: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EditArgs {
    slug: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long = "type", value_name = "TYPE")]
    category: Option<String>,
    #[arg(long)]
    breed: Option<String>,
    #[arg(long)]
    years: Option<String>,
    /// Replacement message; without one the current message is kept
    #[arg(long, conflicts_with = "message_file")]
    message: Option<String>,
    #[arg(long, value_name = "PATH")]
    message_file: Option<PathBuf>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long, conflicts_with = "unfeature")]
    featured: bool,
    #[arg(long)]
    unfeature: bool,
    /// Record that the publish notice has been sent
    #[arg(long)]
    notified: bool,
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,
    #[arg(long, value_name = "PATH", conflicts_with = "clear_image2")]
    image2: Option<PathBuf>,
    /// Remove the second photo
    #[arg(long)]
    clear_image2: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            for cause in err.chain().skip(1) {
                eprintln!("  {} {}", "caused by:".dimmed(), cause);
            }
            if is_validation(&err) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("tribute=debug,tribute_core=debug")
        } else {
            EnvFilter::new("tribute=info,tribute_core=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let site = resolve_site(cli.config.as_deref())?;
    debug!(output = %site.output_root.display(), "resolved site");
    let publisher = Publisher::new(site)?;

    match cli.command {
        Command::Publish(args) => {
            let message = read_message(args.message, args.message_file.as_deref())?.unwrap_or_default();
            let published = publisher.create(NewTribute {
                name: args.name,
                category: args.category,
                breed: args.breed,
                life_span: args.years,
                message,
                first_name: args.first_name,
                state: args.state,
                email: args.email,
                published_at: args.date,
                featured: args.featured,
                primary_image: args.image,
                secondary_image: args.image2,
            })?;
            report_published("Published", &publisher, &published);
        }
        Command::Edit(args) => {
            let message = read_message(args.message, args.message_file.as_deref())?;
            let featured = if args.featured {
                Some(true)
            } else if args.unfeature {
                Some(false)
            } else {
                None
            };
            let published = publisher.edit(
                &args.slug,
                TributeEdit {
                    name: args.name,
                    category: args.category,
                    breed: args.breed,
                    life_span: args.years,
                    message,
                    first_name: args.first_name,
                    state: args.state,
                    email: args.email,
                    published_at: args.date,
                    featured,
                    notification_sent: args.notified.then_some(true),
                    primary_image: args.image,
                    secondary_image: args.image2,
                    clear_secondary_image: args.clear_image2,
                },
            )?;
            report_published("Updated", &publisher, &published);
        }
        Command::Delete { slug } => {
            let published = publisher.delete(&slug)?;
            report_published("Deleted", &publisher, &published);
        }
        Command::Rebuild => {
            let regeneration = publisher.rebuild()?;
            eprintln!(
                "{} Rebuilt {} detail pages",
                "->".blue().bold(),
                regeneration.detail_pages.len().to_string().green()
            );
            report_regeneration(&regeneration);
        }
        Command::List { pending_notices } => {
            let records = if pending_notices {
                publisher.pending_notices()?
            } else {
                publisher.list()?
            };
            for record in &records {
                let url = publisher.site().absolute(&publisher.site().detail_url(record));
                if pending_notices {
                    println!("{}\t{}\t{}", record.slug, record.email.trim(), url);
                } else {
                    let marker = if record.featured { "*" } else { " " };
                    println!("{marker} {}\t{}\t{}", record.published_at, record.slug, url);
                }
            }
            eprintln!("{} {} tributes", "->".blue().bold(), records.len().to_string().green());
        }
        Command::Import => {
            let imported = publisher.import_legacy()?;
            for slug in &imported {
                eprintln!("   imported {}", slug.cyan());
            }
            eprintln!(
                "{} Imported {} legacy tributes",
                "->".blue().bold(),
                imported.len().to_string().green()
            );
        }
    }

    Ok(())
}

fn resolve_site(config_path: Option<&Path>) -> Result<Site> {
    match config_path {
        Some(path) => {
            let config = load_config(path)?;
            // paths in an explicit config resolve against its project root
            let root = if path.ends_with(DEFAULT_CONFIG_PATH) {
                path.ancestors().nth(3)
            } else {
                path.parent()
            };
            let root = match root.filter(|p| !p.as_os_str().is_empty()) {
                Some(root) => root.to_path_buf(),
                None => std::env::current_dir().wrap_err("Failed to get current directory")?,
            };
            Site::resolve(&config, &root)
        }
        None => {
            let root = find_project_root()?;
            let config = load_config_or_default(&root.join(DEFAULT_CONFIG_PATH))?;
            Site::resolve(&config, &root)
        }
    }
}

fn read_message(inline: Option<String>, file: Option<&Path>) -> Result<Option<String>> {
    match (inline, file) {
        (Some(message), _) => Ok(Some(message)),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map(Some)
            .wrap_err_with(|| format!("Failed to read message file {}", path.display())),
        (None, None) => Ok(None),
    }
}

fn report_published(verb: &str, publisher: &Publisher, published: &Published) {
    let url = publisher.site().absolute(&publisher.site().url_prefix);
    eprintln!("{} {} {} ({url})", "->".blue().bold(), verb, published.slug.cyan());
    report_regeneration(&published.regeneration);
}

fn report_regeneration(regeneration: &Regeneration) {
    eprintln!(
        "   {} listing pages, {} type archives",
        regeneration.listing_pages().to_string().green(),
        regeneration.categories.len().to_string().green()
    );
    let stale: usize = regeneration.global.stale_pages
        + regeneration.categories.iter().map(|r| r.stale_pages).sum::<usize>();
    if stale > 0 {
        eprintln!("   removed {} stale archive pages", stale.to_string().yellow());
    }
    for slug in &regeneration.demoted {
        eprintln!("   {} {} is no longer featured", "warning:".yellow(), slug);
    }
    for category in &regeneration.pruned_categories {
        eprintln!("   {} removed empty type archive {}", "warning:".yellow(), category);
    }
    eprintln!("   sitemap: {}", regeneration.sitemap.display());
}
