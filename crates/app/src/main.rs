//! imds-tagger - tags JSON-lines metrics with Azure instance metadata
//!
//! Usage: `imds-tagger [CONFIG_PATH]`
//!
//! Records are read from stdin and written to stdout; logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use imds_tagger_app::{pump_lines, write_lines, AppContext};
use imds_tagger_infra::{init_logging, LogFormat};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Capacity of the channel between the stage and the stdout writer.
const OUTPUT_BUFFER: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LogFormat::from_env()?)?;

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let AppContext { mut stage, .. } =
        AppContext::new(config_path).context("failed to initialize imds-tagger")?;

    let (tx, rx) = mpsc::channel(OUTPUT_BUFFER);
    let writer = tokio::spawn(write_lines(rx, tokio::io::stdout()));

    stage.start(Arc::new(tx)).await.context("failed to start stage")?;

    let reader = BufReader::new(tokio::io::stdin());
    tokio::select! {
        pumped = pump_lines(reader, &stage) => {
            let submitted = pumped.context("failed to read records")?;
            info!(submitted, "End of input, flushing");
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, flushing records already accepted");
        }
    }

    stage.stop().await.context("failed to stop stage")?;

    // The stage released its sink on stop, so the writer sees the channel
    // close once everything is written.
    let written = writer.await.context("output task failed")?.context("failed to write records")?;
    info!(written, "imds-tagger finished");
    Ok(())
}
