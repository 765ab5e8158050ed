use std::path::Path;

use tracing::info;

use crate::channel::{serve, LocalChannel, PageChannel};
use crate::cli::config::{AppConfig, ConfigAction};
use crate::dom::{Document, PageSnapshot};
use crate::page::PageContext;
use crate::report::console::{format_config_listing, format_extract_report, format_scan_report};
use crate::store::ConfigStore;

// ============================================================================
// scan subcommand
// ============================================================================

pub fn cmd_scan(
    page: &str,
    json: bool,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut channel = open_page(page, config)?;
    let descriptors = channel.scan_all()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
    } else {
        print!("{}", format_scan_report(&descriptors));
    }
    Ok(())
}

// ============================================================================
// save subcommand
// ============================================================================

/// Scan `page`, keep the chosen indexes and write them to the store.
pub fn cmd_save(
    page: &str,
    indexes: &[usize],
    config: &AppConfig,
    store_path: &str,
    verbose: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut channel = open_page(page, config)?;
    let scanned = channel.scan_all()?;
    let entries = channel.save_by_indexes(indexes)?;

    if entries.len() < indexes.len() {
        eprintln!(
            "Skipped {} index(es) not present in the scan ({} elements)",
            indexes.len() - entries.len(),
            scanned.len()
        );
    }

    let mut store = ConfigStore::load(store_path)?;
    store.save(entries)?;

    if verbose > 0 {
        eprint!("{}", format_config_listing(store.entries()));
    }
    println!("Saved {} entries to {}", store.entries().len(), store_path);
    Ok(())
}

// ============================================================================
// extract subcommand
// ============================================================================

/// Resolve the stored configuration against `page`. Returns whether every
/// entry was found.
pub fn cmd_extract(
    page: &str,
    json: bool,
    config: &AppConfig,
    store_path: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    let store = ConfigStore::load(store_path)?;
    if store.is_empty() {
        eprintln!("No saved configuration in {}", store_path);
        return Ok(true);
    }

    let mut channel = open_page(page, config)?;
    let results = channel.extract_by_config(store.entries())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", format_extract_report(store.entries(), &results));
    }
    Ok(results.len() == store.entries().len())
}

// ============================================================================
// replica subcommand
// ============================================================================

pub fn cmd_replica(
    page: &str,
    output: Option<&str>,
    config: &AppConfig,
    store_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = ConfigStore::load(store_path)?;
    let mut channel = open_page(page, config)?;
    let layout = channel.generate_replica_data(store.entries())?;
    let json = serde_json::to_string_pretty(&layout)?;

    match output {
        Some(path) => {
            std::fs::write(path, &json)?;
            println!("Wrote {} layout entries to {}", layout.len(), path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

// ============================================================================
// serve subcommand
// ============================================================================

pub fn cmd_serve(page: Option<&str>, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let doc = match page {
        Some(path) => PageSnapshot::load(Path::new(path))?.into_document()?,
        None => Document::parse("")?,
    };
    let mut context = PageContext::new(doc, config.context_settings());

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    serve(&mut context, stdin.lock(), stdout.lock())?;
    Ok(())
}

// ============================================================================
// config subcommand
// ============================================================================

pub fn cmd_config(action: &ConfigAction, store_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = ConfigStore::load(store_path)?;

    match action {
        ConfigAction::Show => print!("{}", format_config_listing(store.entries())),
        ConfigAction::Export { output } => {
            let json = store.export_json()?;
            match output {
                Some(path) => {
                    std::fs::write(path, &json)?;
                    println!("Exported {} entries to {}", store.entries().len(), path);
                }
                None => println!("{}", json),
            }
        }
        ConfigAction::Import { file } => {
            let content = std::fs::read_to_string(file)?;
            let count = store.import_json(&content)?;
            println!("Imported {} entries", count);
        }
        ConfigAction::Delete { position } => {
            let removed = store.delete(*position)?;
            println!("Deleted [{}] {}", position, removed.display_name());
        }
        ConfigAction::Clear => {
            store.clear()?;
            println!("Cleared saved configuration");
        }
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Load a page file into an in-process page context.
pub fn open_page(page: &str, config: &AppConfig) -> Result<LocalChannel, Box<dyn std::error::Error>> {
    let snapshot = PageSnapshot::load(Path::new(page))?;
    info!(page, url = %snapshot.url, "Opening page");
    let context = PageContext::from_snapshot(snapshot, config.context_settings())?;
    Ok(LocalChannel::new(context))
}
