use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Where an archived upload lands: `{dataset_dir}/{image_hash}.jpg`.
pub fn archive_path(dataset_dir: &Path, image_hash: &str) -> PathBuf {
    dataset_dir.join(format!("{image_hash}.jpg"))
}

/// Copy the raw upload into the dataset directory, creating it on demand.
/// Re-uploading the same bytes overwrites the same file.
pub async fn archive_image(dataset_dir: &Path, image_hash: &str, image: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dataset_dir)
        .await
        .with_context(|| format!("Failed to create dataset dir {}", dataset_dir.display()))?;
    let path = archive_path(dataset_dir, image_hash);
    tokio::fs::write(&path, image)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
