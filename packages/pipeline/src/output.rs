//! Naming and saving rendered output.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use geofilter_render::EncodedImage;

use crate::PipelineError;

const FALLBACK_STEM: &str = "photo";

/// Builds `filtered_<basename>_<millis>.jpg` for a submitted file name.
///
/// Any directory part and the last extension are stripped from
/// `original_name`.
#[must_use]
pub fn output_filename(original_name: &str, timestamp: DateTime<Utc>) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_STEM);

    format!("filtered_{stem}_{}.jpg", timestamp.timestamp_millis())
}

/// Writes `image` to `dir/filename`, creating `dir` if needed.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the directory cannot be created or the
/// file cannot be written.
pub async fn save_rendered(
    image: &EncodedImage,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf, PipelineError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    tokio::fs::write(&path, &image.bytes).await?;
    log::info!("Saved {} bytes to {}", image.bytes.len(), path.display());
    Ok(path)
}
