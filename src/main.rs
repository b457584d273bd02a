//! # Folio CLI (`folio`)
//!
//! The `folio` binary manages an academic portfolio: publications grouped
//! by year, flat sections (skills, education, awards, ...), the hero and
//! about documents, and the statistics the site shows.
//!
//! ## Usage
//!
//! ```bash
//! folio --config ./config/folio.toml [--as EMAIL] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `folio init` | Create the SQLite database and run schema migrations |
//! | `folio pubs list <kind>` | List publications, newest year first |
//! | `folio pubs add <kind> <year>` | Add a publication (owner) |
//! | `folio pubs update <kind> <year> <index>` | Replace or move a publication (owner) |
//! | `folio pubs remove <kind> <year> <index>` | Remove a publication (owner) |
//! | `folio section list <name>` | List a flat section |
//! | `folio section add/update/remove` | Edit a flat section (owner) |
//! | `folio profile get/set <hero\|about>` | Read or overwrite a profile document |
//! | `folio stats [--write]` | Show (and store) publication statistics |
//! | `folio check [--repair]` | Report bucket inconsistencies |
//! | `folio export [--output FILE]` | Export the whole portfolio as JSON |
//! | `folio serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! folio init --config ./config/folio.toml
//!
//! # Add a journal article for 2024
//! folio --as me@university.edu pubs add journal-articles 2024 \
//!     --json '{"title":"On Buckets","authors":"Doe, J.","journal":"JACM"}'
//!
//! # Move it to 2023
//! folio --as me@university.edu pubs update journal-articles 2024 0 \
//!     --json '{"title":"On Buckets","authors":"Doe, J.","journal":"JACM","year":"2023"}'
//!
//! # Serve the API for the site
//! folio serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use folio::folio_core::catalog::{ProfileDoc, PublicationKind, Section};
use folio::input::JsonInput;
use folio::{check, config, export, migrate, profile, pubs, sections, server, stats};

/// Folio CLI: a self-hosted academic portfolio with an owner-only editor.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/folio.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "folio",
    about = "Folio: a self-hosted academic portfolio with an owner-only content editor",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/folio.toml")]
    config: PathBuf,

    /// Email of the person running the command; must be the configured
    /// owner for any command that writes.
    #[arg(long = "as", global = true, env = "FOLIO_IDENTITY")]
    identity: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the documents table. Running
    /// it again is safe.
    Init,

    /// List and edit publications (journal articles, conference
    /// proceedings, edited books, book chapters).
    Pubs {
        #[command(subcommand)]
        action: PubsAction,
    },

    /// List and edit a flat section (skills, education, experience,
    /// references, memberships, awards, projects, certifications, reviews).
    Section {
        #[command(subcommand)]
        action: SectionAction,
    },

    /// Read or overwrite the hero and about documents.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Show publication statistics.
    Stats {
        /// Also save the statistics for the site (owner only).
        #[arg(long)]
        write: bool,
    },

    /// Check publication buckets for inconsistencies.
    ///
    /// Exits with status 1 when any finding remains.
    Check {
        /// Delete empty buckets first (owner only).
        #[arg(long)]
        repair: bool,

        /// Print the reports as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export the whole portfolio as JSON.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Start the HTTP API.
    ///
    /// Binds to the address configured in `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum PubsAction {
    /// List publications of one kind, newest year first.
    List {
        kind: PublicationKind,
        /// Print JSON instead of a listing.
        #[arg(long)]
        json: bool,
    },
    /// Add a publication to a year.
    Add {
        kind: PublicationKind,
        year: String,
        #[command(flatten)]
        input: JsonInput,
    },
    /// Replace the publication at `<year> <index>`. A different `year` in
    /// the record moves it to that year.
    Update {
        kind: PublicationKind,
        year: String,
        index: usize,
        #[command(flatten)]
        input: JsonInput,
    },
    /// Remove the publication at `<year> <index>`.
    Remove {
        kind: PublicationKind,
        year: String,
        index: usize,
    },
}

#[derive(Subcommand)]
enum SectionAction {
    /// List the items of a section.
    List {
        section: Section,
        /// Print JSON instead of a listing.
        #[arg(long)]
        json: bool,
    },
    /// Append an item.
    Add {
        section: Section,
        #[command(flatten)]
        input: JsonInput,
    },
    /// Replace the item at `<index>`.
    Update {
        section: Section,
        index: usize,
        #[command(flatten)]
        input: JsonInput,
    },
    /// Remove the first item equal to the given record, or the item at
    /// `<index>` when one is given.
    Remove {
        section: Section,
        index: Option<usize>,
        #[command(flatten)]
        input: JsonInput,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print a profile document.
    Get { doc: ProfileDoc },
    /// Overwrite a profile document.
    Set {
        doc: ProfileDoc,
        #[command(flatten)]
        input: JsonInput,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    folio::init_logging();

    let cfg = config::load_config(&cli.config)?;
    let identity = cli.identity.as_deref();

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Pubs { action } => match action {
            PubsAction::List { kind, json } => {
                pubs::run_list(&cfg, kind, json).await?;
            }
            PubsAction::Add { kind, year, input } => {
                pubs::run_add(&cfg, identity, kind, &year, input.read()?).await?;
            }
            PubsAction::Update {
                kind,
                year,
                index,
                input,
            } => {
                pubs::run_update(&cfg, identity, kind, &year, index, input.read()?).await?;
            }
            PubsAction::Remove { kind, year, index } => {
                pubs::run_remove(&cfg, identity, kind, &year, index).await?;
            }
        },
        Commands::Section { action } => match action {
            SectionAction::List { section, json } => {
                sections::run_list(&cfg, section, json).await?;
            }
            SectionAction::Add { section, input } => {
                sections::run_add(&cfg, identity, section, input.read()?).await?;
            }
            SectionAction::Update {
                section,
                index,
                input,
            } => {
                sections::run_update(&cfg, identity, section, index, input.read()?).await?;
            }
            SectionAction::Remove {
                section,
                index: Some(index),
                ..
            } => {
                sections::run_remove_at(&cfg, identity, section, index).await?;
            }
            SectionAction::Remove {
                section,
                index: None,
                input,
            } => {
                sections::run_remove(&cfg, identity, section, input.read()?).await?;
            }
        },
        Commands::Profile { action } => match action {
            ProfileAction::Get { doc } => {
                profile::run_get(&cfg, doc).await?;
            }
            ProfileAction::Set { doc, input } => {
                profile::run_set(&cfg, identity, doc, input.read()?).await?;
            }
        },
        Commands::Stats { write } => {
            stats::run_stats(&cfg, identity, write).await?;
        }
        Commands::Check { repair, json } => {
            if !check::run_check(&cfg, identity, repair, json).await? {
                std::process::exit(1);
            }
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
