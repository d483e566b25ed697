//! Block list input
//!
//! Blocks can come from positional arguments, a file, or stdin (`-`), one
//! per line. Blank lines and `#` comments are skipped.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use netblock_cidr::NetworkAddress;

/// Collect blocks from arguments and an optional file (`-` for stdin)
pub fn read_blocks(args: &[String], file: Option<&str>) -> Result<Vec<NetworkAddress>> {
    let mut blocks = args
        .iter()
        .map(|arg| parse_block(arg).with_context(|| format!("argument '{}'", arg)))
        .collect::<Result<Vec<_>>>()?;

    match file {
        Some("-") => blocks.extend(parse_lines(io::stdin().lock(), "stdin")?),
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path))?;
            blocks.extend(parse_lines(BufReader::new(file), path)?);
        }
        None => {}
    }

    tracing::debug!(count = blocks.len(), "read blocks");
    Ok(blocks)
}

/// Parse one block per line
pub fn parse_lines<R: BufRead>(reader: R, source: &str) -> Result<Vec<NetworkAddress>> {
    let mut blocks = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", source))?;
        let entry = line.split('#').next().unwrap_or("").trim();
        if entry.is_empty() {
            continue;
        }
        let block =
            parse_block(entry).with_context(|| format!("{}:{}: '{}'", source, number + 1, entry))?;
        blocks.push(block);
    }
    Ok(blocks)
}

/// Parse a block, trimming surrounding whitespace
pub fn parse_block(input: &str) -> Result<NetworkAddress> {
    Ok(NetworkAddress::parse(input.trim())?)
}
