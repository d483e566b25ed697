use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use tracing::Level;

use netblock_cidr::{Address, FormatMode, NetworkAddress};

mod input;

/// IP address and CIDR block calculator
#[derive(Parser)]
#[command(name = "netblock")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show mask, range and size of a block
    Info(InfoArgs),
    /// Render an address in a given style
    Format(FormatArgs),
    /// Split a block into 2^N equal blocks
    Split(SplitArgs),
    /// Merge blocks into the smallest equivalent set
    Merge(MergeArgs),
    /// List the free blocks left after removing used ones
    Exclude(ExcludeArgs),
    /// Check whether a block contains an address or another block
    Contains(ContainsArgs),
}

#[derive(Parser)]
struct InfoArgs {
    /// Block in CIDR notation (e.g., 192.168.1.0/24)
    #[arg(value_name = "CIDR")]
    block: String,
}

#[derive(Parser)]
struct FormatArgs {
    /// IPv4 or IPv6 address
    #[arg(value_name = "ADDRESS")]
    address: String,

    /// Output style
    #[arg(short, long, value_enum, default_value = "compact")]
    mode: ModeArg,
}

#[derive(Parser)]
struct SplitArgs {
    /// Block in CIDR notation
    #[arg(value_name = "CIDR")]
    block: String,

    /// Number of times to halve the block
    #[arg(short, long, default_value = "1")]
    times: u8,
}

#[derive(Parser)]
struct MergeArgs {
    /// Blocks in CIDR notation
    #[arg(value_name = "CIDR")]
    blocks: Vec<String>,

    /// Read additional blocks from a file (use '-' for stdin)
    #[arg(short, long, value_name = "FILE")]
    file: Option<String>,
}

#[derive(Parser)]
struct ExcludeArgs {
    /// Block to carve free space from
    #[arg(value_name = "CIDR")]
    block: String,

    /// Blocks already in use
    #[arg(short, long, value_name = "CIDR", required = true, num_args = 1..)]
    used: Vec<String>,
}

#[derive(Parser)]
struct ContainsArgs {
    /// Enclosing block
    #[arg(value_name = "CIDR")]
    block: String,

    /// Address or block to test
    #[arg(value_name = "TARGET")]
    target: String,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output (pretty-printed)
    Json,
    /// JSON output (compact)
    JsonCompact,
    /// CSV output
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Zero-padded octets and hextets
    Full,
    /// Shortest form, `::` for the longest zero run
    Compact,
    /// IPv6 without leading zeros, no `::`
    Abbreviated,
    /// Always `::ffff:a.b.c.d` when possible
    Mapped,
    /// Mapped form for mapped addresses, compact otherwise
    MayMapped,
    /// Unsigned decimal integer
    Integer,
}

impl From<ModeArg> for FormatMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Full => FormatMode::Full,
            ModeArg::Compact => FormatMode::Compact,
            ModeArg::Abbreviated => FormatMode::Abbreviated,
            ModeArg::Mapped => FormatMode::MappedIpv4,
            ModeArg::MayMapped => FormatMode::MayMappedCompact,
            ModeArg::Integer => FormatMode::Integer,
        }
    }
}

#[derive(Serialize)]
struct BlockInfo {
    block: String,
    version: String,
    address: String,
    prefix_len: u8,
    subnet_mask: String,
    network_start: String,
    network_end: String,
    address_count: String,
    is_network_identifier: bool,
    parent: Option<String>,
    network_class: Option<String>,
}

impl From<&NetworkAddress> for BlockInfo {
    fn from(block: &NetworkAddress) -> Self {
        Self {
            block: block.to_string(),
            version: block.version().to_string(),
            address: block.address().to_string(),
            prefix_len: block.prefix_len(),
            subnet_mask: block.subnet_mask().to_string(),
            network_start: block.network_start().to_string(),
            network_end: block.network_end().to_string(),
            address_count: block.address_count().to_string(),
            is_network_identifier: block.is_network_identifier(),
            parent: block.parent().map(|p| p.to_string()),
            network_class: block.network_class(),
        }
    }
}

#[derive(Serialize)]
struct ValueResult {
    input: String,
    result: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info(args) => handle_info(args, &cli.output)?,
        Commands::Format(args) => handle_format(args, &cli.output)?,
        Commands::Split(args) => handle_split(args, &cli.output)?,
        Commands::Merge(args) => handle_merge(args, &cli.output)?,
        Commands::Exclude(args) => handle_exclude(args, &cli.output)?,
        Commands::Contains(args) => handle_contains(args, &cli.output)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_info(args: InfoArgs, format: &OutputFormat) -> Result<()> {
    let block = input::parse_block(&args.block)?;
    print_info(&BlockInfo::from(&block), format)
}

fn handle_format(args: FormatArgs, format: &OutputFormat) -> Result<()> {
    let address = Address::parse(args.address.trim())?;
    let result = ValueResult {
        input: args.address,
        result: address.format(args.mode.into()),
    };
    print_value(&result, format)
}

fn handle_split(args: SplitArgs, format: &OutputFormat) -> Result<()> {
    let block = input::parse_block(&args.block)?;
    let pieces = block.split(args.times)?;
    print_blocks(&format!("{} split {} times", block, args.times), &pieces, format)
}

fn handle_merge(args: MergeArgs, format: &OutputFormat) -> Result<()> {
    let blocks = input::read_blocks(&args.blocks, args.file.as_deref())?;
    let merged = NetworkAddress::merge(&blocks);
    print_blocks(
        &format!("{} blocks merged into {}", blocks.len(), merged.len()),
        &merged,
        format,
    )
}

fn handle_exclude(args: ExcludeArgs, format: &OutputFormat) -> Result<()> {
    let block = input::parse_block(&args.block)?;
    let used = input::read_blocks(&args.used, None)?;
    let free = block.excluding(&used)?;
    print_blocks(&format!("Free space in {}", block), &free, format)
}

fn handle_contains(args: ContainsArgs, format: &OutputFormat) -> Result<()> {
    let block = input::parse_block(&args.block)?;
    let target = args.target.trim();
    let contained = if target.contains('/') {
        block.encloses_subnet(&NetworkAddress::parse(target)?)?
    } else {
        block.contains_address(&Address::parse(target)?)?
    };
    let result = ValueResult {
        input: format!("{} {}", block, target),
        result: contained.to_string(),
    };
    print_value(&result, format)
}

fn print_info(info: &BlockInfo, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!();
            println!("{}", "Block Information".bold().cyan());
            println!("{}", "─".repeat(50).dimmed());
            println!("{:>15}: {}", "Block".bold(), info.block.green());
            println!("{:>15}: {}", "Version".bold(), info.version);
            println!("{:>15}: {}", "Subnet mask".bold(), info.subnet_mask);
            println!("{:>15}: {}", "Network start".bold(), info.network_start);
            println!("{:>15}: {}", "Network end".bold(), info.network_end);
            println!("{:>15}: {}", "Addresses".bold(), info.address_count);
            println!("{:>15}: {}", "Identifier".bold(), info.is_network_identifier);
            if let Some(ref parent) = info.parent {
                println!("{:>15}: {}", "Parent".bold(), parent);
            }
            if let Some(ref class) = info.network_class {
                println!("{:>15}: {}", "Class".bold(), class);
            }
            println!();
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(info)?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(info)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.serialize(info)?;
            wtr.flush()?;
        }
    }
    Ok(())
}

fn print_blocks(title: &str, blocks: &[NetworkAddress], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!();
            println!("{}", title.bold().cyan());
            println!("{}", "─".repeat(50).dimmed());
            if blocks.is_empty() {
                println!("{}", "(none)".yellow());
            }
            for block in blocks {
                println!("  {}", block.to_string().green());
            }
            println!();
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(blocks)?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(blocks)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.write_record(["block", "network_start", "network_end", "address_count"])?;
            for block in blocks {
                wtr.write_record([
                    block.to_string(),
                    block.network_start().to_string(),
                    block.network_end().to_string(),
                    block.address_count().to_string(),
                ])?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}

fn print_value(value: &ValueResult, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => println!("{}", value.result.green()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(value)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.serialize(value)?;
            wtr.flush()?;
        }
    }
    Ok(())
}
