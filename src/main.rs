//! PicoCMS CLI - rebuild, query and serve a content store

use clap::{Parser, Subcommand};
use picocms::config::{self, ConfigFile};
use picocms::ui::{self, Icons};
use picocms::{Cms, CmsConfig, SortOrder};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "picocms")]
#[command(version)]
#[command(about = "Lightweight content backend - TOML pages and JSON documents in SQLite")]
#[command(long_about = r#"
PicoCMS scans a pages tree (TOML front-matter) and a data tree (JSON) and
loads them into a SQLite database, addressed by path:

  pages/index.toml        →  /index
  pages/news/item1.toml   →  /news/item1
  data/site.json          →  /site

Example usage:
  picocms init --pages content/pages --data content/data
  picocms rebuild
  picocms list /news --order desc
  picocms serve --port 8080
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./picocms.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Root of the pages tree
    #[arg(long, global = true)]
    pages: Option<PathBuf>,

    /// Root of the data tree
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Print machine-readable JSON instead of formatted output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a picocms.toml from the given options
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Clear the store and resynchronize both source trees
    Rebuild,

    /// Show the page at a path, e.g. /news/item1
    Get {
        path: String,
    },

    /// Show the JSON document at a path, e.g. /site
    Data {
        path: String,
    },

    /// List pages in a directory, ordered by date
    List {
        #[arg(default_value = "/")]
        directory: String,

        /// Sort order (asc, desc)
        #[arg(short, long, default_value = "asc")]
        order: String,
    },

    /// Show record counts
    Stats,

    /// Serve the read API over HTTP
    Serve {
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Skip the rebuild before serving
        #[arg(long)]
        no_rebuild: bool,
    },

    /// Rebuild whenever the source trees change
    Watch,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let overrides = ConfigFile {
        database: cli.database.clone(),
        pages: cli.pages.clone(),
        data: cli.data.clone(),
    };

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.clone().unwrap_or_else(config::default_config_path);
            let layered = ConfigFile::from_env().merge(overrides);
            let file = ConfigFile {
                database: Some(layered.database.unwrap_or_else(config::default_database_path)),
                ..layered
            };
            // Fail now rather than on first use
            file.clone().resolve()?;

            config::write_config(&path, &file, force)?;
            ui::success(&format!("Wrote {}", path.display()));
        }

        Commands::Rebuild => {
            let mut cms = open(cli.config.as_deref(), overrides)?;
            rebuild(&mut cms, cli.json)?;
            cms.teardown();
        }

        Commands::Get { path } => {
            let cms = open(cli.config.as_deref(), overrides)?;
            let page = cms.get_content(&path)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&page.to_value())?);
            } else {
                println!("{} {}", Icons::PAGE, page.path());
                println!("{}", ui::pages_table(&[page.meta()]));
                println!("{}", serde_json::to_string_pretty(&page.json()?)?);
            }
            cms.teardown();
        }

        Commands::Data { path } => {
            let cms = open(cli.config.as_deref(), overrides)?;
            let doc = cms.get_data(&path)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&doc.to_value())?);
            } else {
                println!("{} {}", Icons::DOCUMENT, doc.path());
                println!("{}", serde_json::to_string_pretty(&doc.json()?)?);
            }
            cms.teardown();
        }

        Commands::List { directory, order } => {
            let order: SortOrder = order.parse()?;
            let cms = open(cli.config.as_deref(), overrides)?;
            let pages = cms.list_content(&directory, order)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&pages)?);
            } else if pages.is_empty() {
                println!("{} No pages in {}", Icons::EMPTY, directory);
            } else {
                println!("{} {} ({} pages)", Icons::FOLDER, directory, pages.len());
                println!("{}", ui::pages_table(&pages));
            }
            cms.teardown();
        }

        Commands::Stats => {
            let cms = open(cli.config.as_deref(), overrides)?;
            let stats = cms.stats()?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                let database = cms.config().database.display().to_string();
                let pages = stats.pages.to_string();
                let documents = stats.documents.to_string();
                println!("{} PicoCMS Statistics", Icons::STATS);
                println!(
                    "{}",
                    ui::stats_table(&[
                        ("Database", database.as_str()),
                        ("Pages", pages.as_str()),
                        ("Documents", documents.as_str()),
                    ])
                );
            }
            cms.teardown();
        }

        Commands::Serve { port, no_rebuild } => {
            let mut cms = open(cli.config.as_deref(), overrides)?;
            if !no_rebuild {
                rebuild(&mut cms, cli.json)?;
            }

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(picocms::server::start_server(port, cms))?;
        }

        Commands::Watch => {
            let cms = open(cli.config.as_deref(), overrides)?;
            picocms::watcher::Watcher::new(cms).run()?;
        }
    }

    Ok(())
}

/// Resolve config (file, then environment, then flags) and open the store
fn open(config_path: Option<&Path>, overrides: ConfigFile) -> anyhow::Result<Cms> {
    let file = config::load_config(config_path)?.unwrap_or_default();
    let config: CmsConfig = file.merge(ConfigFile::from_env()).merge(overrides).resolve()?;
    tracing::debug!("Resolved configuration: {:?}", config);

    Ok(Cms::initialize(config)?)
}

fn rebuild(cms: &mut Cms, json: bool) -> anyhow::Result<()> {
    if !json {
        let config = cms.config();
        ui::header("Rebuilding content store");
        ui::info("Pages", &config.pages.display().to_string());
        ui::info("Data", &config.data.display().to_string());
        ui::info("Database", &config.database.display().to_string());
    }

    let stats = cms.rebuild()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "pages": stats.pages,
                "documents": stats.documents,
                "skipped": stats.skipped,
                "elapsed_ms": stats.elapsed.as_millis() as u64,
            }))?
        );
    } else {
        ui::sync_summary(&stats);
    }
    Ok(())
}
