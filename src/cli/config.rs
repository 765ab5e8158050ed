use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::overlay::OverlaySettings;
use crate::page::{ContextSettings, HighlightSettings};
use crate::screen::StabilityPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "page-anchor.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "page-anchor",
    version,
    about = "Capture form fields on a page once and find them again on later visits"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: page-anchor.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Saved-configuration store (overrides `store_path` from the config file)
    #[arg(long, global = true)]
    pub store: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a page snapshot and list every candidate element
    Scan {
        /// Page snapshot (.json) or plain HTML file
        #[arg(long)]
        page: String,

        /// Print descriptors as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Scan a page and save the chosen elements as the configuration
    Save {
        /// Page snapshot (.json) or plain HTML file
        #[arg(long)]
        page: String,

        /// Scan indexes to keep, in order (e.g. --indexes 0,2,5)
        #[arg(long, value_delimiter = ',', required = true)]
        indexes: Vec<usize>,
    },

    /// Resolve the saved configuration against a page and print the values
    Extract {
        /// Page snapshot (.json) or plain HTML file
        #[arg(long)]
        page: String,

        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Produce normalized layout data for rebuilding the form elsewhere
    Replica {
        /// Page snapshot (.json) or plain HTML file
        #[arg(long)]
        page: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run a page context over stdin/stdout (one JSON message per line)
    Serve {
        /// Page to load before the first request
        #[arg(long)]
        page: Option<String>,
    },

    /// Inspect or edit the saved configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigAction {
    /// List saved entries
    Show,

    /// Write the entries as a JSON array
    Export {
        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Replace the entries with a previously exported JSON array
    Import {
        /// File holding the JSON array
        file: String,
    },

    /// Delete the entry at a position (as listed by `config show`)
    Delete { position: usize },

    /// Remove every saved entry
    Clear,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `page-anchor.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub stability: StabilityPolicy,
    #[serde(default)]
    pub overlay: OverlaySettings,
    #[serde(default)]
    pub highlight: HighlightSettings,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "page-anchor-config.json".to_string()
}

impl AppConfig {
    pub fn context_settings(&self) -> ContextSettings {
        ContextSettings {
            stability: self.stability.clone(),
            overlay: self.overlay.clone(),
            highlight: self.highlight.clone(),
        }
    }

    /// Store path after applying the `--store` override.
    pub fn store_path<'a>(&'a self, cli_override: Option<&'a str>) -> &'a str {
        cli_override.unwrap_or(&self.store.path)
    }
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "Ignoring malformed config file");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(content)
}
