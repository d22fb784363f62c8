//! JSON-lines host
//!
//! One JSON-encoded record per line in, one per line out. Blank lines are
//! ignored; lines that do not decode are logged and dropped, and the stream
//! keeps flowing.

use imds_tagger_core::StreamingProcessor;
use imds_tagger_domain::{Metric, Result, TaggerError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Decode one input line.
///
/// Returns `None` for a blank line.
pub fn parse_line(line: &str) -> Option<serde_json::Result<Metric>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(serde_json::from_str(trimmed))
}

/// Read records from `reader` and submit them to `processor` until EOF.
///
/// Returns the number of records submitted.
///
/// # Errors
/// Propagates I/O errors from the reader as `TaggerError::Internal`, and any
/// error returned by [`StreamingProcessor::process`].
pub async fn pump_lines<R, P>(reader: R, processor: &P) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
    P: StreamingProcessor + ?Sized,
{
    let mut lines = reader.lines();
    let mut submitted = 0u64;
    let mut line_no = 0u64;

    while let Some(line) = lines.next_line().await.map_err(|err| {
        TaggerError::Internal(format!("failed to read input: {err}"))
    })? {
        line_no += 1;
        match parse_line(&line) {
            None => continue,
            Some(Ok(metric)) => {
                processor.process(metric).await?;
                submitted += 1;
            }
            Some(Err(err)) => warn!(line = line_no, error = %err, "Skipping undecodable record"),
        }
    }

    debug!(submitted, "Input exhausted");
    Ok(submitted)
}

/// Write every record received on `records` to `writer`, one JSON document
/// per line, until the channel closes.
///
/// Returns the number of records written.
///
/// # Errors
/// Serialization and I/O failures surface as `TaggerError::Internal`.
pub async fn write_lines<W>(mut records: mpsc::Receiver<Metric>, mut writer: W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;

    while let Some(metric) = records.recv().await {
        let mut line = serde_json::to_vec(&metric).map_err(|err| {
            TaggerError::Internal(format!("failed to encode record: {err}"))
        })?;
        line.push(b'\n');
        writer.write_all(&line).await.map_err(output_error)?;
        written += 1;
    }

    writer.flush().await.map_err(output_error)?;
    Ok(written)
}

fn output_error(err: std::io::Error) -> TaggerError {
    TaggerError::Internal(format!("failed to write output: {err}"))
}
