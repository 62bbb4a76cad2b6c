mod cli;

use std::{
    fs,
    io::{ self, Write },
    process,
};

use clap::Parser;
use log::info;
use mov_decoder::Decoder;

use cli::Args;

/// Writes the listing for `bytes` and returns how many instructions failed to decode.
///
/// Without `keep_going` the first failure ends the listing.
fn write_listing<W: Write>(out: &mut W, bytes: &[u8], args: &Args) -> io::Result<usize> {
    if args.header { writeln!(out, "bits 16\n")?; }

    let mut failures: usize = 0;
    for decoded in Decoder::new(bytes) {
        match decoded {
            Ok(instruction) if args.offsets => {
                writeln!(out, "{} ; {:#06x} ({} bytes)", instruction, instruction.offset, instruction.size)?
            },
            Ok(instruction) => writeln!(out, "{}", instruction)?,
            Err(err) => {
                failures += 1;
                if !args.keep_going {
                    eprintln!("{}", err);
                    break;
                }
                writeln!(out, "; error: {}", err)?;
            },
        }
    }

    Ok(failures)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut bytes = fs::read(&args.input).unwrap_or_else(|err| {
        eprintln!("failed to read {}: {}", args.input.display(), err);
        process::exit(1);
    });
    if let Some(max_bytes) = args.max_bytes { bytes.truncate(max_bytes); }
    info!("decoding {} bytes from {}", bytes.len(), args.input.display());

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let failures = write_listing(&mut out, &bytes, &args).and_then(|failures| out.flush().map(|_| failures));
    match failures {
        Ok(0) => {},
        Ok(failures) => {
            info!("{} instruction(s) failed to decode", failures);
            process::exit(2);
        },
        Err(err) => {
            eprintln!("failed to write listing: {}", err);
            process::exit(1);
        },
    }
}
