//! Overlay of ground truth labels on dataset images.

use crate::{common::*, record::SampleRecord};
use image::{GrayImage, Rgb, RgbImage};

/// The opacity of label colors drawn over the image.
pub const DEFAULT_ALPHA: f32 = 0.5;

/// Blends the label colors of `gt` over `image`.
///
/// Each ground truth pixel is interpreted as a train id. Pixels without a
/// trainable label keep the image color.
pub fn draw_sem_seg(image: &RgbImage, gt: &GrayImage, alpha: f32) -> Result<RgbImage> {
    ensure!(
        image.dimensions() == gt.dimensions(),
        "image size {:?} does not match ground truth size {:?}",
        image.dimensions(),
        gt.dimensions()
    );
    ensure!(
        (0.0..=1.0).contains(&alpha),
        "alpha must be in range 0..=1, but get {}",
        alpha
    );

    let output = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgb(pixel) = *image.get_pixel(x, y);
        let train_id = gt.get_pixel(x, y).0[0];

        match label::by_train_id(train_id) {
            Some(label) => {
                let mut blended = [0u8; 3];
                blended
                    .iter_mut()
                    .zip(pixel)
                    .zip(label.color)
                    .for_each(|((out, src), color)| {
                        let value = src as f32 * (1.0 - alpha) + color as f32 * alpha;
                        *out = value.round().clamp(0.0, 255.0) as u8;
                    });
                Rgb(blended)
            }
            None => Rgb(pixel),
        }
    });

    Ok(output)
}

/// Draws every record and saves the results in `output_dir` under the
/// source image file names. Records without a ground truth file are
/// skipped. Returns the number of written images.
pub fn save_visualizations(
    records: &[SampleRecord],
    output_dir: impl AsRef<Path>,
    alpha: f32,
) -> Result<usize> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let mut count = 0;

    for record in records {
        let SampleRecord {
            file_name,
            sem_seg_file_name,
            ..
        } = record;

        if !sem_seg_file_name.is_file() {
            warn!(
                "skip '{}' because ground truth '{}' is missing",
                file_name.display(),
                sem_seg_file_name.display()
            );
            continue;
        }

        let image = image::open(file_name)
            .with_context(|| format!("failed to open image '{}'", file_name.display()))?
            .to_rgb8();
        let gt = image::open(sem_seg_file_name)
            .with_context(|| format!("failed to open image '{}'", sem_seg_file_name.display()))?
            .to_luma8();
        let output = draw_sem_seg(&image, &gt, alpha)
            .with_context(|| format!("failed to draw '{}'", file_name.display()))?;

        let base_name = file_name
            .file_name()
            .ok_or_else(|| format_err!("'{}' has no file name", file_name.display()))?;
        let path = output_dir.join(base_name);
        output
            .save(&path)
            .with_context(|| format!("failed to save '{}'", path.display()))?;
        count += 1;
    }

    Ok(count)
}
