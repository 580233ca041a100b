//! Streaming CSV record source.
//!
//! Records are decoded on demand as the consumer polls the stream, so large
//! input files are never materialized in memory. The first row defines the
//! column names for every subsequent row.
//!
//! Malformed-row policy: fail fast. A row with an inconsistent field count
//! aborts the whole run with a [`SourceError`] instead of silently yielding
//! partial data; re-running against a fixed input is cheap next to a partially
//! wrong bulk upload.

use std::path::Path;

use futures::{Stream, StreamExt, TryStreamExt};
use tokio::fs::File;

use crate::error::SourceError;
use crate::record::InputRecord;

/// Open `path` and return a lazy stream of [`InputRecord`]s.
///
/// The stream is finite and not restartable; each run opens the file anew.
/// Open and header failures surface immediately, before any record is
/// yielded.
pub async fn record_stream(
    path: impl AsRef<Path>,
) -> Result<impl Stream<Item = Result<InputRecord, SourceError>>, SourceError> {
    let path = path.as_ref();
    let file = File::open(path).await.map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv_async::AsyncReaderBuilder::new()
        .has_headers(true)
        .create_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .await
        .map_err(|source| SourceError::Headers {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(str::to_string)
        .collect();

    tracing::debug!(path = %path.display(), columns = headers.len(), "input CSV opened");

    Ok(reader.into_records().map(move |res| {
        let row = res.map_err(SourceError::Malformed)?;
        let values: Vec<String> = row.iter().map(str::to_string).collect();
        Ok(InputRecord::from_row(&headers, &values))
    }))
}

/// Count the data rows of the input file with one cheap streaming pass.
///
/// Used for progress-bar totals before the batch starts.
pub async fn count_records(path: impl AsRef<Path>) -> Result<u64, SourceError> {
    let stream = record_stream(path).await?;
    stream
        .try_fold(0u64, |n, _| async move { Ok(n + 1) })
        .await
}
