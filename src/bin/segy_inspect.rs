use clap::{Parser, Subcommand};
use segy_scale::reduce;
use segy_scale::segy::{SegyFile, TraceStore};
use segy_scale::ScaleError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "segy_inspect")]
#[command(about = "Inspect SEG-Y files the way segy_scale reads them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show format, byte order and trace geometry
    Info { file: PathBuf },
    /// Print the file maximum as the max pass computes it
    Max { file: PathBuf },
    /// Print the samples of one trace
    Trace { file: PathBuf, index: usize },
}

fn main() -> Result<(), ScaleError> {
    segy_scale::init_tracing("segy_inspect");
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file } => {
            let segy = SegyFile::open_read(&file)?;
            let layout = segy.layout();
            println!("file: {}", file.display());
            println!("bytes: {}", layout.file_len);
            println!("format: {:?} (code {})", layout.format, layout.format.code());
            println!("byte order: {:?}", layout.byte_order);
            println!("extended textual headers: {}", layout.extended_headers);
            println!("samples per trace (binary header): {}", layout.samples_per_trace);
            println!("traces: {}", segy.trace_count());
            let odd = layout
                .traces
                .iter()
                .filter(|t| t.samples != layout.samples_per_trace)
                .count();
            if odd > 0 {
                println!("traces with their own sample count: {}", odd);
            }
        }
        Commands::Max { file } => {
            let result = reduce::file_max(&file);
            match result.error {
                Some(e) => return Err(ScaleError::Other(e)),
                None => println!("{}", result.value),
            }
        }
        Commands::Trace { file, index } => {
            let mut segy = SegyFile::open_read(&file)?;
            for sample in segy.read_trace(index)? {
                println!("{}", sample);
            }
        }
    }
    Ok(())
}
