use clap::Parser;
use page_anchor::cli::commands::{
    cmd_config, cmd_extract, cmd_replica, cmd_save, cmd_scan, cmd_serve,
};
use page_anchor::cli::config::{Cli, Commands, load_config};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref());
    // Resolve store path: CLI > config > default
    let store_path = config.store_path(cli.store.as_deref()).to_string();

    match &cli.command {
        Commands::Scan { page, json } => cmd_scan(page, *json, &config)?,
        Commands::Save { page, indexes } => {
            cmd_save(page, indexes, &config, &store_path, cli.verbose)?
        }
        Commands::Extract { page, json } => {
            let all_found = cmd_extract(page, *json, &config, &store_path)?;
            if !all_found {
                std::process::exit(1);
            }
        }
        Commands::Replica { page, output } => {
            cmd_replica(page, output.as_deref(), &config, &store_path)?
        }
        Commands::Serve { page } => cmd_serve(page.as_deref(), &config)?,
        Commands::Config { action } => cmd_config(action, &store_path)?,
    }

    Ok(())
}

/// Logs go to stderr so `serve` keeps stdout for replies.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
