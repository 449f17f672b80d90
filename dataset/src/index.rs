use crate::{common::*, record::SampleRecord};

/// The extension of ground truth label images.
pub const GROUND_TRUTH_EXTENSION: &str = "png";

/// Selects which ground truth files must exist for indexing to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTruthCheck {
    /// Only the ground truth of the first record is checked.
    FirstOnly,
    /// Every record must have its ground truth file.
    EveryPair,
}

impl Default for GroundTruthCheck {
    fn default() -> Self {
        Self::FirstOnly
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("no images found in '{}'", .0.display())]
    NoImages(PathBuf),
    #[error(
        "ground truth file '{}' does not exist, please convert the label images to label id format",
        .0.display()
    )]
    MissingGroundTruth(PathBuf),
}

/// Indexes the dataset with [GroundTruthCheck::FirstOnly].
pub fn index(image_dir: impl AsRef<Path>, gt_dir: impl AsRef<Path>) -> Result<Vec<SampleRecord>> {
    index_with(image_dir, gt_dir, GroundTruthCheck::default())
}

/// Lists image files in `image_dir` and pairs each of them with the
/// ground truth file of the same stem in `gt_dir`.
///
/// The directory is not traversed recursively. Records are ordered by file
/// name. Image dimensions are read from file headers without decoding.
pub fn index_with(
    image_dir: impl AsRef<Path>,
    gt_dir: impl AsRef<Path>,
    check: GroundTruthCheck,
) -> Result<Vec<SampleRecord>> {
    let image_dir = image_dir.as_ref();
    let gt_dir = gt_dir.as_ref();

    let image_files: Vec<PathBuf> = {
        let mut paths: Vec<_> = fs::read_dir(image_dir)
            .with_context(|| format!("failed to list directory '{}'", image_dir.display()))?
            .map(|entry| -> Result<_> { Ok(entry?.path()) })
            .filter_ok(|path| path.is_file())
            .try_collect()?;
        paths.sort();
        paths
    };

    let records: Vec<_> = image_files
        .into_iter()
        .map(|image_file| -> Result<_> {
            let sem_seg_file = ground_truth_path(&image_file, gt_dir)?;

            if check == GroundTruthCheck::EveryPair && !sem_seg_file.is_file() {
                return Err(IndexError::MissingGroundTruth(sem_seg_file).into());
            }

            let imagesize::ImageSize { height, width } = imagesize::size(&image_file)
                .with_context(|| {
                    format!("failed to read image size of '{}'", image_file.display())
                })?;

            Ok(SampleRecord {
                file_name: image_file,
                sem_seg_file_name: sem_seg_file,
                height,
                width,
            })
        })
        .try_collect()?;

    let first = records
        .first()
        .ok_or_else(|| IndexError::NoImages(image_dir.to_owned()))?;
    if !first.sem_seg_file_name.is_file() {
        return Err(IndexError::MissingGroundTruth(first.sem_seg_file_name.clone()).into());
    }

    debug!(
        "indexed {} samples in '{}'",
        records.len(),
        image_dir.display()
    );

    Ok(records)
}

/// Replaces the extension of the image file name with `.png` and places it
/// in `gt_dir`.
pub fn ground_truth_path(image_file: &Path, gt_dir: &Path) -> Result<PathBuf> {
    let file_name = image_file
        .file_name()
        .ok_or_else(|| format_err!("'{}' has no file name", image_file.display()))?;
    Ok(gt_dir
        .join(file_name)
        .with_extension(GROUND_TRUTH_EXTENSION))
}
