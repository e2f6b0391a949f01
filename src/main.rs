use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use segy_scale::progress::{LogProgress, Progress};
use segy_scale::{Phase, ScaleConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "segy_scale")]
#[command(about = "Normalize every SEG-Y file in a tree by the corpus-wide maximum amplitude", long_about = None)]
struct Cli {
    /// Directory searched recursively for .sgy/.segy files
    #[arg(short, long)]
    input: PathBuf,
    /// Directory that receives the scaled copies, mirroring the input tree
    #[arg(short, long)]
    output: PathBuf,
    /// Worker threads for both passes (defaults to the CPU count)
    #[arg(short, long)]
    workers: Option<usize>,
    /// Log progress instead of drawing a progress bar
    #[arg(short, long)]
    quiet: bool,
}

struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template("{msg:>10} [{bar:40.cyan/blue}] {pos}/{len} ({eta})") {
            bar.set_style(style.progress_chars("=> "));
        }
        BarProgress { bar }
    }
}

impl Progress for BarProgress {
    fn start(&self, phase: Phase, total: usize) {
        self.bar.reset();
        self.bar.set_length(total as u64);
        self.bar.set_message(match phase {
            Phase::MaxPass => "maximum",
            Phase::ScalePass => "scaling",
            other => other.as_str(),
        });
    }

    fn advance(&self) {
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish();
    }
}

fn main() -> ExitCode {
    segy_scale::init_tracing("segy_scale");
    let cli = Cli::parse();

    let mut config = ScaleConfig::new(cli.input, cli.output);
    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }
    info!(
        input = %config.input_root.display(),
        output = %config.output_root.display(),
        workers = config.workers,
        "starting"
    );

    let progress: Box<dyn Progress> = if cli.quiet {
        Box::new(LogProgress::new())
    } else {
        Box::new(BarProgress::new())
    };

    match segy_scale::run(config, progress.as_ref()) {
        Ok(summary) => {
            println!("Global maximum amplitude: {}", summary.global_max.value());
            print!("{}", summary.report.render());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, fatal = e.is_fatal(), "run aborted");
            ExitCode::FAILURE
        }
    }
}
