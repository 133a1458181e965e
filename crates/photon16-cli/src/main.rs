//! photon16 - inspect protocol16 payloads
//!
//! This tool decodes captured protocol16 payloads (one per file, or given
//! as hex on the command line) and prints the decoded value tree.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use photon16_core::{crc, walk, ByteCursor, Decoder, DecoderConfig, StatsVisitor, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Decode protocol16 payloads and print their contents
#[derive(Parser, Debug)]
#[command(name = "photon16")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Number of leading bytes to skip (e.g. a transport header)
    #[arg(long, default_value = "0")]
    offset: usize,

    /// Record kind the payload must hold
    #[arg(long, value_enum, default_value = "any")]
    expect: Expect,

    /// Output format
    #[arg(long, value_enum, default_value = "display")]
    format: OutputFormat,

    /// Print the packet checksum of the input before decoding
    #[arg(long)]
    crc: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Maximum container nesting depth
    #[arg(long, default_value = "64")]
    max_depth: usize,

    /// Maximum declared length of any single collection
    #[arg(long, default_value = "1048576")]
    max_collection_len: usize,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single payload file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of payload files to process
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Payload given as hex, e.g. "6b 00 05" or "0x6b0005"
    #[arg(long)]
    hex: Option<String>,
}

/// Output format for decoded values
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact one-line rendering
    Display,
    /// Rust debug rendering of the value tree
    Debug,
    /// Counts of scalars, containers and records
    Stats,
}

/// Record kind a payload is expected to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Expect {
    /// Any tagged value
    Any,
    /// Event data
    Event,
    /// Operation request
    Request,
    /// Operation response
    Response,
}

/// Tracks seen payloads for deduplication
#[derive(Default)]
struct PayloadRegistry {
    /// Content hashes of processed payloads
    seen: HashSet<String>,
    /// Statistics
    stats: RegistryStats,
}

#[derive(Default)]
struct RegistryStats {
    total_found: usize,
    duplicates_skipped: usize,
    decoded: usize,
    failed: usize,
}

impl PayloadRegistry {
    fn new() -> Self {
        Self::default()
    }

    /// Compute a short hash of the content (first 8 chars of blake3)
    fn content_hash(content: &[u8]) -> String {
        let hash = blake3::hash(content);
        hash.to_hex()[..8].to_string()
    }

    /// Records a payload; returns false if identical content was seen before
    fn register(&mut self, content: &[u8]) -> bool {
        self.stats.total_found += 1;
        let hash = Self::content_hash(content);
        if !self.seen.insert(hash.clone()) {
            debug!("Skipping duplicate payload (hash: {})", hash);
            self.stats.duplicates_skipped += 1;
            return false;
        }
        true
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} found, {} duplicates skipped, {} decoded, {} failed",
            self.stats.total_found,
            self.stats.duplicates_skipped,
            self.stats.decoded,
            self.stats.failed
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let decoder = Decoder::with_config(
        DecoderConfig::new()
            .max_depth(cli.max_depth)
            .max_collection_len(cli.max_collection_len),
    );

    // Dispatch based on input mode
    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, &decoder, file)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, &decoder, directory)
    } else if let Some(ref hex) = cli.input.hex {
        let data = parse_hex(hex)?;
        process_payload(&cli, &decoder, "<hex>", &data)
    } else {
        bail!("One of --file, --directory or --hex must be specified")
    }
}

/// Process a single payload file
fn process_single_file(cli: &Cli, decoder: &Decoder, file: &Path) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    let data = read_payload(file)?;
    process_payload(cli, decoder, &file.display().to_string(), &data)
}

/// Process a directory of payload files recursively
fn process_directory(cli: &Cli, decoder: &Decoder, directory: &Path) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut registry = PayloadRegistry::new();

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || is_hidden(path) {
            continue;
        }

        let data = match read_payload(path) {
            Ok(data) => data,
            Err(e) => {
                warn!("Error reading {}: {:#}", path.display(), e);
                continue;
            }
        };

        if !registry.register(&data) {
            continue;
        }

        debug!("Processing payload: {}", path.display());
        match process_payload(cli, decoder, &path.display().to_string(), &data) {
            Ok(()) => registry.stats.decoded += 1,
            Err(e) => {
                // Log error but continue with other files
                warn!("Error decoding {}: {:#}", path.display(), e);
                registry.stats.failed += 1;
            }
        }
    }

    registry.print_summary();
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

fn read_payload(path: &Path) -> Result<Vec<u8>> {
    trace!("Reading {}", path.display());
    let data = fs::read(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    trace!("Read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

/// Decode one payload and print it
fn process_payload(cli: &Cli, decoder: &Decoder, label: &str, data: &[u8]) -> Result<()> {
    if cli.offset > data.len() {
        bail!(
            "Offset {} is past the end of {} ({} bytes)",
            cli.offset,
            label,
            data.len()
        );
    }
    let payload = &data[cli.offset..];

    if cli.crc {
        println!("{}: crc 0x{:08x}", label, crc(payload, payload.len()));
    }

    let value = decode_payload(decoder, payload, cli.expect)
        .with_context(|| format!("Failed to decode {}", label))?;

    println!("{}: {}", label, render(&value, cli.format));
    Ok(())
}

fn decode_payload(decoder: &Decoder, payload: &[u8], expect: Expect) -> Result<Value> {
    let mut cursor = ByteCursor::from(payload);
    let value = match expect {
        Expect::Any => decoder.decode_tagged(&mut cursor)?,
        Expect::Event => Value::EventData(decoder.decode_event(&mut cursor)?),
        Expect::Request => Value::OperationRequest(decoder.decode_request(&mut cursor)?),
        Expect::Response => Value::OperationResponse(decoder.decode_response(&mut cursor)?),
    };

    if cursor.remaining() > 0 {
        warn!(
            "{} trailing bytes after {} at offset {}",
            cursor.remaining(),
            value.type_name(),
            cursor.position()
        );
    }
    Ok(value)
}

fn render(value: &Value, format: OutputFormat) -> String {
    match format {
        OutputFormat::Display => value.to_string(),
        OutputFormat::Debug => format!("{:#?}", value),
        OutputFormat::Stats => {
            let mut stats = StatsVisitor::default();
            walk(value, &mut stats);
            format!(
                "{} scalars, {} byte arrays ({} bytes), {} primitive arrays, {} arrays, \
                 {} dictionaries, {} records, depth {}",
                stats.scalars,
                stats.byte_arrays,
                stats.byte_array_bytes,
                stats.primitive_arrays,
                stats.arrays,
                stats.dictionaries,
                stats.records,
                stats.max_depth
            )
        }
    }
}

/// Parse hex input, tolerating whitespace, commas and `0x` prefixes
fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| {
            token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token)
        })
        .collect();

    if digits.len() % 2 != 0 {
        bail!("Hex input has an odd number of digits");
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            let pair = digits.get(i..i + 2).context("Hex input is not ASCII")?;
            u8::from_str_radix(pair, 16).with_context(|| format!("Invalid hex byte: {:?}", pair))
        })
        .collect()
}
