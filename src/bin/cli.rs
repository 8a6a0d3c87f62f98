//! spectralog CLI
//!
//! Host-side tool for inspecting and maintaining a logger card mounted as a
//! directory.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use spectralog::block::FsBlockStore;
use spectralog::log::header_line;
use spectralog::{Config, Storage};
use tracing_subscriber::{fmt, EnvFilter};

/// spectralog CLI
#[derive(Parser, Debug)]
#[command(name = "spectralog-cli")]
#[command(about = "Inspect and maintain a spectral logger card")]
#[command(version)]
struct Args {
    /// Directory holding the card contents
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Chip-select pin of the card reader
    #[arg(long, default_value = "4")]
    cs_pin: u8,

    /// Minimum header wavelength (nm)
    #[arg(long, default_value = "340")]
    min_wavelength: u32,

    /// Maximum header wavelength (nm)
    #[arg(long, default_value = "1010")]
    max_wavelength: u32,

    /// Wavelength step (nm)
    #[arg(long, default_value = "5")]
    step: u32,

    /// Accept writes without saving them
    #[arg(long)]
    no_save: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append one record
    Append {
        /// The CSV record to append
        line: String,
    },

    /// Print the number of saved records
    Count,

    /// Print every line of the log
    Export,

    /// Print a single line (1 = header)
    Line {
        /// Line number
        number: u32,
    },

    /// Delete the log and its counter
    Delete,

    /// Rescan the log and repair the counter
    Recount,

    /// Print the header for the configured wavelength range
    Header,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,spectralog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> spectralog::Result<()> {
    let config = Config::builder()
        .cs_pin(args.cs_pin)
        .wavelengths(args.min_wavelength, args.max_wavelength, args.step)
        .no_save(args.no_save)
        .build();

    tracing::debug!("spectralog v{} on {}", spectralog::VERSION, args.dir.display());

    match args.command {
        Commands::Append { line } => {
            let mut storage = open_storage(&args.dir, config)?;
            storage.write_line(&line)?;
            println!("{}", storage.data_count());
        }
        Commands::Count => {
            let storage = open_storage(&args.dir, config)?;
            println!("{}", storage.data_count());
        }
        Commands::Export => {
            let mut storage = open_storage(&args.dir, config)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for line in storage.lines()? {
                writeln!(out, "{}", line?)?;
            }
        }
        Commands::Line { number } => {
            let mut storage = open_storage(&args.dir, config)?;
            match storage.read_line(number)? {
                Some(line) => println!("{}", line),
                None => {
                    tracing::warn!("Log has no line {}", number);
                    std::process::exit(2);
                }
            }
        }
        Commands::Delete => {
            let mut storage = open_storage(&args.dir, config)?;
            storage.delete_file()?;
            println!("deleted");
        }
        Commands::Recount => {
            let mut storage = open_storage(&args.dir, config)?;
            println!("{}", storage.recount()?);
        }
        Commands::Header => {
            config.validate()?;
            println!("{}", header_line(&config.wavelengths));
        }
    }

    Ok(())
}

/// Build storage over the card directory and mount it
fn open_storage(dir: &Path, config: Config) -> spectralog::Result<Storage<FsBlockStore>> {
    let mut storage = Storage::new(FsBlockStore::new(dir), config)?;
    storage.init()?;
    Ok(storage)
}
