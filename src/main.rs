//! oxc-jest CLI
//!
//! Entry point for the `oxc-jest` command-line tool.

use clap::{Parser, Subcommand};
use oxc_jest::{CacheKeyFactory, Resolver};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "oxc-jest")]
#[command(about = "Resolve oxc Jest transform configuration", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved transform configuration
    Resolve {
        /// Project root holding package.json and tsconfig.json
        #[arg(long, short = 'r', default_value = ".")]
        root: PathBuf,

        /// Explicit options as JSON (highest precedence)
        #[arg(long, short = 'o')]
        options: Option<String>,

        /// Include merged options and contributing sources
        #[arg(long)]
        sources: bool,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the cache key for one source file
    CacheKey {
        /// Source file to key
        file: PathBuf,

        /// Project root holding package.json and tsconfig.json
        #[arg(long, short = 'r', default_value = ".")]
        root: PathBuf,

        /// Explicit options as JSON (highest precedence)
        #[arg(long, short = 'o')]
        options: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            root,
            options,
            sources,
            pretty,
        } => {
            run_resolve(root, options, sources, pretty).await;
        }
        Commands::CacheKey {
            file,
            root,
            options,
        } => {
            run_cache_key(file, root, options).await;
        }
    }
}

async fn run_resolve(root: PathBuf, options: Option<String>, sources: bool, pretty: bool) {
    let explicit = parse_options(options);
    let resolver = Resolver::new(root);

    let effective = match resolver.resolve_effective(explicit).await {
        Ok(effective) => effective,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let rendered = match (sources, pretty) {
        (true, true) => effective.to_json(),
        (true, false) => serde_json::to_string(&effective),
        (false, true) => serde_json::to_string_pretty(&effective.config),
        (false, false) => serde_json::to_string(&effective.config),
    };

    match rendered {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

async fn run_cache_key(file: PathBuf, root: PathBuf, options: Option<String>) {
    let explicit = parse_options(options);
    let resolver = Resolver::new(root);

    let config = match resolver.resolve(explicit).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let source_text = match tokio::fs::read_to_string(&file).await {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Failed to read {}: {}", file.display(), e);
            process::exit(1);
        }
    };

    let key = match CacheKeyFactory::new(resolver.root(), &config).await {
        Ok(factory) => factory.cache_key(&source_text, &file),
        Err(e) => Err(e),
    };

    match key {
        Ok(key) => println!("{}", key),
        Err(e) => {
            eprintln!("Error computing cache key: {}", e);
            process::exit(1);
        }
    }
}

fn parse_options(options: Option<String>) -> Option<serde_json::Value> {
    let raw = options?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            eprintln!("Invalid --options JSON: {}", e);
            process::exit(2);
        }
    }
}
