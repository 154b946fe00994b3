//! xpath-scan
//!
//! Opens a page in Chrome, scans every reachable frame for automatable elements and prints
//! the merged inventory. Optionally exports a pybot object file.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use xpath_scanner::audit::group_by_rule;
use xpath_scanner::browser::{BrowserSession, ConnectionOptions, LaunchOptions};
use xpath_scanner::catalog::{ElementFilter, ObjectCatalog};
use xpath_scanner::config::ScanConfig;
use xpath_scanner::locator::Quality;
use xpath_scanner::scan::{FileStorage, MemoryStorage};

#[derive(Parser)]
#[command(name = "xpath-scan")]
#[command(version)]
#[command(
    about = "Scan a page for automatable elements and synthesize XPath locators",
    long_about = None
)]
struct Cli {
    /// Page to scan
    url: String,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<PathBuf>,

    /// WebSocket endpoint URL for remote browser connection
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// Scan configuration as JSON
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep the inventory in this directory instead of in memory
    #[arg(long, value_name = "DIR")]
    store_dir: Option<PathBuf>,

    /// Lowest locator quality to export (0-3)
    #[arg(long, default_value = "0", value_parser = clap::value_parser!(u8).range(0..=3))]
    min_quality: u8,

    /// Tags to export, comma separated (default: all)
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Write the selected elements as a pybot object file
    #[arg(long, short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the inventory as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ScanConfig::from_json(&json)?
        }
        None => ScanConfig::default(),
    };

    let session = match &cli.ws_endpoint {
        Some(endpoint) => BrowserSession::connect(ConnectionOptions::new(endpoint))?,
        None => {
            let mut options = LaunchOptions::new().headless(!cli.headed);
            if let Some(path) = &cli.executable_path {
                options = options.chrome_path(path);
            }
            if let Some(dir) = &cli.user_data_dir {
                options = options.user_data_dir(dir);
            }
            BrowserSession::launch(options)?
        }
    };

    session.navigate(&cli.url)?;
    session.wait_for_navigation()?;
    info!("Loaded {}", cli.url);

    let mut page = match &cli.store_dir {
        Some(dir) => session.scan_page(config, FileStorage::open(dir)?)?,
        None => session.scan_page(config, MemoryStorage::new())?,
    };
    let elements = page.scan()?;
    let infractions = page.inventory().infractions()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&elements)?);
    } else {
        for record in &elements {
            println!(
                "{:<10} q{}  {:<6} {}",
                record.tag_name, record.quality, record.frame, record.xpath
            );
        }
        eprintln!("{} elements", elements.len());
        for (rule, hits) in group_by_rule(&infractions) {
            eprintln!("{}: {} infractions", rule, hits.len());
        }
    }

    if let Some(path) = &cli.output {
        let mut catalog = ObjectCatalog::new();
        catalog.load_inventory(&elements);
        let min_quality = Quality::try_from(cli.min_quality).map_err(anyhow::Error::msg)?;
        let filter = ElementFilter::new(min_quality).with_tags(&cli.tags);
        let written = catalog.save_to_file(&filter, path)?;
        eprintln!("Wrote {} objects to {}", written, path.display());
    }

    session.close()?;
    Ok(())
}
