use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use feedsift::config::{Config, OutputFormat};
use feedsift::feed::{fetch_and_parse, Feed, FeedParser};
use feedsift::render::render;
use feedsift::util::validate_url;

/// Get the config directory path (~/.config/feedsift/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("feedsift"))
}

#[derive(Parser, Debug)]
#[command(name = "feedsift", about = "Parse an RSS or Atom feed and print its items")]
struct Args {
    /// Feed file to parse ("-" or omitted reads stdin)
    #[arg(value_name = "FILE", conflicts_with = "url")]
    input: Option<PathBuf>,

    /// Fetch the feed from an http(s) URL instead of a file
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Output format (overrides the config file)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Config file (default: ~/.config/feedsift/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for --format json
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let parser = FeedParser::new().with_options(config.parser_options());

    let feed = match (&args.url, &args.input) {
        (Some(url), _) => fetch_remote(&parser, &config, url).await?,
        (None, Some(path)) if path.as_os_str() != "-" => parser
            .parse_file(path)
            .with_context(|| format!("Failed to parse feed file: {}", path.display()))?,
        (None, _) => {
            let stdin = std::io::stdin();
            parser
                .parse_reader(BufReader::new(stdin.lock()))
                .context("Failed to parse feed from stdin")?
        }
    };

    tracing::info!(
        title = %feed.title,
        dialect = ?feed.dialect,
        items = feed.items.len(),
        "Parsed feed"
    );

    let format = args.format.unwrap_or(config.format);
    let output = render(&feed, format, config.title_width).context("Failed to render feed")?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .context("Failed to write output")?;
    if format == OutputFormat::Json {
        writeln!(stdout).context("Failed to write output")?;
    }

    Ok(())
}

async fn fetch_remote(parser: &FeedParser, config: &Config, url: &str) -> Result<Feed> {
    // SEC: refuse internal targets before any request is made
    let validated = validate_url(url).with_context(|| format!("Refusing to fetch {}", url))?;

    let client = reqwest::Client::new();
    fetch_and_parse(&client, validated.as_str(), &config.fetch_options(), parser)
        .await
        .with_context(|| format!("Failed to fetch feed: {}", url))
}
