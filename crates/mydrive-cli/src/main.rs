//! mydrive: encrypt files into verified chunks and restore them
//!
//! Commands:
//!   encrypt <path>                 - encrypt a file, store chunks + metadata
//!   decrypt <file_id> [--output]   - reassemble, verify, and decrypt a file
//!   list [--sort] [--search]       - list stored files
//!   info <file_id>                 - show one record (no key material)
//!   verify <file_id>               - check chunk hashes and file identity
//!   delete <file_id>               - remove a record and its chunks
//!   stats                          - totals over all stored files
//!   config show                    - display the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mydrive_core::config::MyDriveConfig;
use mydrive_core::{fmt_bytes, MyDriveError};
use mydrive_engine::{filter_by_name, sort_summaries, CryptoEngine, SortKey};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "mydrive",
    version,
    about = "Encrypted, chunked local file storage",
    long_about = "mydrive: encrypt files with AES-256-GCM, store them as hash-verified chunks, and restore them"
)]
struct Cli {
    /// Path to mydrive.toml configuration file
    #[arg(long, short = 'c', env = "MYDRIVE_CONFIG", default_value = "./mydrive.toml")]
    config: PathBuf,

    /// Log level or EnvFilter directive (overrides config)
    #[arg(long)]
    log: Option<String>,

    /// Log output format (overrides config)
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Metadata directory (overrides config)
    #[arg(long)]
    metadata_dir: Option<PathBuf>,

    /// Chunk directory (overrides config)
    #[arg(long)]
    chunks_dir: Option<PathBuf>,

    /// Chunk size in bytes (overrides config)
    #[arg(long)]
    chunk_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file and store it as chunks
    Encrypt {
        /// File to encrypt
        path: PathBuf,
    },

    /// Restore a stored file
    Decrypt {
        /// 16-character file id
        file_id: String,
        /// Destination path (default: output_dir/<original name>)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List stored files
    List {
        /// Sort order
        #[arg(long, short = 's', default_value = "date")]
        sort: SortKey,
        /// Only show files whose name contains this (case-insensitive)
        #[arg(long)]
        search: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show details of one stored file
    Info {
        file_id: String,
        #[arg(long)]
        json: bool,
    },

    /// Check chunk hashes and file identity without decrypting
    Verify { file_id: String },

    /// Delete a stored file
    Delete {
        file_id: String,
        /// Remove only the metadata record, leave chunk files in place
        #[arg(long)]
        keep_chunks: bool,
    },

    /// Totals over all stored files
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (defaults + config file + flags)
    Show,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<MyDriveError>() {
                Some(err) => eprintln!("mydrive: error[{}]: {e:#}", err.kind()),
                None => eprintln!("mydrive: error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match cli.log_format {
        Some(format) => format,
        None if config.log.format == "json" => LogFormat::Json,
        None => LogFormat::Text,
    };
    init_logging(&level, format);
    if !cli.config.exists() {
        tracing::warn!("config file not found: {}  (using defaults)", cli.config.display());
    }

    if let Commands::Config { action: ConfigAction::Show } = cli.command {
        return cmd_config_show(&config, &cli.config);
    }

    let engine = CryptoEngine::from_config(&config)?;

    match cli.command {
        Commands::Encrypt { path } => cmd_encrypt(&engine, &path),
        Commands::Decrypt { file_id, output } => cmd_decrypt(&engine, &file_id, output.as_deref()),
        Commands::List { sort, search, json } => cmd_list(&engine, sort, search.as_deref(), json),
        Commands::Info { file_id, json } => cmd_info(&engine, &file_id, json),
        Commands::Verify { file_id } => cmd_verify(&engine, &file_id),
        Commands::Delete { file_id, keep_chunks } => cmd_delete(&engine, &file_id, !keep_chunks),
        Commands::Stats { json } => cmd_stats(&engine, json),
        Commands::Config { .. } => Ok(()),
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

fn load_config(cli: &Cli) -> Result<MyDriveConfig> {
    let mut config = MyDriveConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;

    if let Some(dir) = &cli.metadata_dir {
        config.storage.metadata_dir = dir.clone();
    }
    if let Some(dir) = &cli.chunks_dir {
        config.storage.chunks_dir = dir.clone();
    }
    if let Some(size) = cli.chunk_size {
        config.chunking.chunk_size = size;
    }
    if let Some(level) = &cli.log {
        config.log.level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log.format = match format {
            LogFormat::Json => "json".into(),
            LogFormat::Text => "text".into(),
        };
    }

    config.validate()?;
    Ok(config)
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_config_show(config: &MyDriveConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

fn cmd_encrypt(engine: &CryptoEngine, path: &Path) -> Result<()> {
    let result = engine.encrypt(path)?;
    let meta = &result.metadata;

    println!("Encrypted {}", path.display());
    println!("  file id:   {}", result.file_id);
    println!("  name:      {}", result.original_name);
    println!("  size:      {}", fmt_bytes(meta.original_size));
    println!("  encrypted: {}", fmt_bytes(meta.encrypted_size));
    println!("  chunks:    {}", result.chunks.len());
    Ok(())
}

fn cmd_decrypt(engine: &CryptoEngine, file_id: &str, output: Option<&Path>) -> Result<()> {
    let path = engine.decrypt(file_id, output)?;
    println!("Decrypted {file_id} → {}", path.display());
    Ok(())
}

fn cmd_list(engine: &CryptoEngine, sort: SortKey, search: Option<&str>, json: bool) -> Result<()> {
    let mut files = engine.list()?;
    if let Some(term) = search {
        files = filter_by_name(files, term);
    }
    sort_summaries(&mut files, sort);

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    if files.is_empty() {
        println!("No files stored.");
        return Ok(());
    }

    println!("{:<16}  {:>10}  {:>6}  {:<20}  NAME", "FILE ID", "SIZE", "CHUNKS", "UPLOADED");
    for f in &files {
        println!(
            "{:<16}  {:>10}  {:>6}  {:<20}  {}",
            f.file_id,
            fmt_bytes(f.file_size),
            f.chunk_count,
            f.upload_date.format("%Y-%m-%d %H:%M:%S"),
            f.original_name,
        );
    }
    Ok(())
}

fn cmd_info(engine: &CryptoEngine, file_id: &str, json: bool) -> Result<()> {
    let info = engine.get_info(file_id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }
    println!("File: {}", info.name);
    println!("  file id:    {}", info.file_id);
    println!("  size:       {}", fmt_bytes(info.size));
    println!("  encrypted:  {}", fmt_bytes(info.encrypted_size));
    println!("  algorithm:  {}", info.algorithm);
    println!("  chunks:     {}", info.chunks);
    println!("  created:    {}", info.created_at.to_rfc3339());
    Ok(())
}

fn cmd_verify(engine: &CryptoEngine, file_id: &str) -> Result<()> {
    let report = engine.verify(file_id)?;
    println!(
        "OK {}: {} chunks, {} verified",
        report.file_id,
        report.chunks,
        fmt_bytes(report.encrypted_size)
    );
    Ok(())
}

fn cmd_delete(engine: &CryptoEngine, file_id: &str, delete_chunks: bool) -> Result<()> {
    let outcome = engine.delete(file_id, delete_chunks)?;
    if outcome.record_removed {
        println!("Deleted {file_id} ({} chunk files removed)", outcome.chunks_removed);
    } else {
        println!("Nothing stored under {file_id}");
    }
    Ok(())
}

fn cmd_stats(engine: &CryptoEngine, json: bool) -> Result<()> {
    let stats = engine.stats()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Stored: {stats}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_list_flags() {
        let cli = Cli::try_parse_from(["mydrive", "list", "--sort", "size", "--search", "pdf", "--json"])
            .unwrap();
        match cli.command {
            Commands::List { sort, search, json } => {
                assert_eq!(sort, SortKey::Size);
                assert_eq!(search.as_deref(), Some("pdf"));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_sort_key() {
        assert!(Cli::try_parse_from(["mydrive", "list", "--sort", "colour"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cfg = tmp.path().join("mydrive.toml");
        std::fs::write(&cfg, "[chunking]\nchunk_size = 4096\n").unwrap();

        let cli = Cli::try_parse_from([
            "mydrive",
            "--config",
            cfg.to_str().unwrap(),
            "--chunk-size",
            "512",
            "--metadata-dir",
            "/tmp/meta",
            "stats",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.chunking.chunk_size, 512);
        assert_eq!(config.storage.metadata_dir, PathBuf::from("/tmp/meta"));
        assert_eq!(config.storage.chunks_dir, PathBuf::from("./output"));
    }

    #[test]
    fn zero_chunk_size_flag_is_rejected() {
        let cli = Cli::try_parse_from([
            "mydrive",
            "--config",
            "/nonexistent/mydrive.toml",
            "--chunk-size",
            "0",
            "stats",
        ])
        .unwrap();
        assert!(load_config(&cli).is_err());
    }
}
