use std::path::PathBuf;
use clap::Parser;

/// Disassembles the 8086 `mov` instructions in a binary file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Assembled 8086 binary to decode
    pub input: PathBuf,

    /// Only decode the first N bytes of the input
    #[arg(long, value_name = "N")]
    pub max_bytes: Option<usize>,

    /// Print `bits 16` first so the listing can be fed straight back to an assembler
    #[arg(long)]
    pub header: bool,

    /// Append the offset and size of each instruction as a comment
    #[arg(long)]
    pub offsets: bool,

    /// Report undecodable instructions inline and carry on instead of stopping at the first one
    #[arg(short, long)]
    pub keep_going: bool,
}
