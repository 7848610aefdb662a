use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wikilabel::config::Config;
use wikilabel::endpoint::WikidataClient;
use wikilabel::models::LinkTable;
use wikilabel::translation::{FirstOrderTranslator, SecondOrderExtender};

#[derive(Parser)]
#[command(
    name = "wikilabel",
    version,
    about = "Multilingual labels for ontology identifiers from Wikidata",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate the values of one property
    First {
        /// Wikidata property holding the ontology identifiers (e.g. P699)
        #[arg(short, long)]
        property: String,

        /// Comma-separated language codes
        #[arg(short, long, value_delimiter = ',', required = true)]
        languages: Vec<String>,

        /// File with one identifier per line; the whole property otherwise
        #[arg(long)]
        ids_file: Option<PathBuf>,

        /// Keep one row per value with deduplicated labels
        #[arg(long, default_value = "false")]
        translations_only: bool,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extend a translation through auxiliary ontologies
    Second {
        /// Main Wikidata property (e.g. P699)
        #[arg(short, long)]
        property: String,

        /// JSON link table
        #[arg(long)]
        links: PathBuf,

        /// Auxiliary property to ontology name, e.g. P492=OMIM
        #[arg(short, long, required = true)]
        mapping: Vec<String>,

        /// Comma-separated language codes
        #[arg(short, long, value_delimiter = ',', required = true)]
        languages: Vec<String>,

        /// Translate the whole main ontology, not only linked values
        #[arg(long, default_value = "false")]
        all_elem: bool,

        /// Keep one row per value with deduplicated labels
        #[arg(long, default_value = "false")]
        translations_only: bool,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Config::from_env().context("failed to load configuration from environment")?,
    };

    let log_format = cli.log_format.as_deref().unwrap_or(config.logging.format.as_str());
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    tracing::info!(endpoint = %config.endpoint.url, "wikilabel starting");

    match cli.command {
        Commands::First {
            property,
            languages,
            ids_file,
            translations_only,
            output,
        } => {
            tracing::info!(
                property = %property,
                languages = ?languages,
                ids_file = ?ids_file,
                "Starting first-order command"
            );
            first(&config, property, languages, ids_file, translations_only, output).await?;
        }

        Commands::Second {
            property,
            links,
            mapping,
            languages,
            all_elem,
            translations_only,
            output,
        } => {
            tracing::info!(
                property = %property,
                links = %links.display(),
                mapping = ?mapping,
                languages = ?languages,
                all_elem = %all_elem,
                "Starting second-order command"
            );
            let mapping = parse_mapping(&mapping)?;
            second(
                &config,
                property,
                &links,
                mapping,
                languages,
                all_elem,
                translations_only,
                output,
            )
            .await?;
        }
    }

    tracing::info!("wikilabel completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("wikilabel=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("wikilabel={level},warn"))
            .context("invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

fn parse_mapping(pairs: &[String]) -> Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((property, name)) if !property.is_empty() && !name.is_empty() => {
                Ok((property.trim().to_string(), name.trim().to_string()))
            }
            _ => bail!("invalid mapping '{pair}', expected PROPERTY=NAME"),
        })
        .collect()
}

fn read_ids(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn write_output<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Results written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn first(
    config: &Config,
    property: String,
    languages: Vec<String>,
    ids_file: Option<PathBuf>,
    translations_only: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let ids = ids_file.as_deref().map(read_ids).transpose()?;

    let client = WikidataClient::new(&config.endpoint)?;
    let translator =
        FirstOrderTranslator::new(&client, property, languages)?.with_query_config(&config.query)?;

    let table = translator.translate(ids.as_deref()).await?;
    print_summary(table.len(), 0);

    if translations_only {
        write_output(&table.translations_only(), output.as_deref())
    } else {
        write_output(&table, output.as_deref())
    }
}

#[allow(clippy::too_many_arguments)]
async fn second(
    config: &Config,
    property: String,
    links: &Path,
    mapping: Vec<(String, String)>,
    languages: Vec<String>,
    all_elem: bool,
    translations_only: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let links = LinkTable::from_file(links)?;

    let client = WikidataClient::new(&config.endpoint)?;
    let extender = SecondOrderExtender::new(&client, property, links, mapping, languages)?
        .with_query_config(&config.query)?
        .with_all_elem(all_elem);

    let table = extender.translate().await?;
    for failure in &table.failures {
        eprintln!(
            "warning: auxiliary property {} ({}) failed: {}",
            failure.property, failure.name, failure.error
        );
    }
    print_summary(table.len(), table.failures.len());

    if translations_only {
        write_output(&table.translations_only(), output.as_deref())
    } else {
        write_output(&table, output.as_deref())
    }
}

fn print_summary(rows: usize, failures: usize) {
    if failures > 0 {
        eprintln!("{rows} rows, {failures} auxiliary passes failed");
    } else {
        eprintln!("{rows} rows");
    }
}
