//! Dataset persistence

use crate::output::projector::OutputRecord;
use crate::HarvestError;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Writes the complete dataset as a pretty-printed JSON array
///
/// The array is written to a sibling `.tmp` file and renamed over `output_path`,
/// so readers never observe a half-written dataset. On failure the `.tmp`
/// file is removed again.
///
/// # Arguments
///
/// * `records` - Every output record of the run, in completion order
/// * `output_path` - Destination of the dataset
///
/// # Returns
///
/// * `Ok(())` - Dataset written
/// * `Err(HarvestError)` - Serialization or filesystem failure
pub async fn write_dataset(records: &[OutputRecord], output_path: &Path) -> Result<(), HarvestError> {
    let json = serde_json::to_string_pretty(records)?;
    let tmp_path = temp_path_for(output_path);

    if let Err(e) = write_and_rename(&json, &tmp_path, output_path).await {
        discard(&tmp_path).await;
        return Err(e);
    }

    Ok(())
}

async fn write_and_rename(json: &str, tmp_path: &Path, output_path: &Path) -> Result<(), HarvestError> {
    let mut file = fs::File::create(tmp_path).await.map_err(write_error(tmp_path))?;
    file.write_all(json.as_bytes())
        .await
        .map_err(write_error(tmp_path))?;
    file.sync_all().await.map_err(write_error(tmp_path))?;
    drop(file);

    fs::rename(tmp_path, output_path)
        .await
        .map_err(write_error(output_path))
}

async fn discard(tmp_path: &Path) {
    match fs::remove_file(tmp_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!("Failed to remove {}: {}", tmp_path.display(), e);
        }
    }
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> HarvestError {
    let path = path.to_path_buf();
    move |source| HarvestError::Write { path, source }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("dataset"));
    name.push(".tmp");
    path.with_file_name(name)
}
