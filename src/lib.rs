pub mod config;
pub mod corpus;
pub mod error;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod reduce;
pub mod report;
pub mod scale;
pub mod segy;

pub use config::ScaleConfig;
pub use error::*;
pub use pipeline::{run, Phase, Pipeline};
pub use reduce::GlobalMax;
pub use report::{AggregateReport, FileOutcome, RunSummary};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, honouring `RUST_LOG` (default `info`).
/// Later calls are no-ops.
pub fn init_tracing(service: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(service, "tracing initialized");
    }
}
