use crate::common::*;

/// The record of an image and its semantic ground truth, without pixels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Path to the source image.
    pub file_name: PathBuf,
    /// Path to the label image. It may not exist unless every pair was
    /// checked during indexing.
    pub sem_seg_file_name: PathBuf,
    pub height: usize,
    pub width: usize,
}

/// Writes records as a pretty printed JSON array.
pub fn save_records(records: &[SampleRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(records)?;
    fs::write(path, text)
        .with_context(|| format!("failed to write records to '{}'", path.display()))?;
    Ok(())
}
