//! Image preprocessing before the model forward.

use crate::common::*;

/// Scales an image so that its shorter edge reaches a target length while
/// the longer edge stays within a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeShortestEdge {
    short_edge_length: i64,
    max_size: i64,
}

impl ResizeShortestEdge {
    pub fn new(short_edge_length: i64, max_size: i64) -> Result<Self> {
        ensure!(
            short_edge_length > 0 && max_size > 0,
            "short edge length and max size must be positive"
        );
        Ok(Self {
            short_edge_length,
            max_size,
        })
    }

    pub fn short_edge_length(&self) -> i64 {
        self.short_edge_length
    }

    pub fn max_size(&self) -> i64 {
        self.max_size
    }

    /// Computes the `(height, width)` after resizing.
    pub fn output_size(&self, height: i64, width: i64) -> (i64, i64) {
        let size = self.short_edge_length as f64;
        let max_size = self.max_size as f64;
        let (h, w) = (height as f64, width as f64);

        let scale = size / h.min(w);
        let (new_h, new_w) = if h < w {
            (size, scale * w)
        } else {
            (scale * h, size)
        };

        let (new_h, new_w) = if new_h.max(new_w) > max_size {
            let scale = max_size / new_h.max(new_w);
            (new_h * scale, new_w * scale)
        } else {
            (new_h, new_w)
        };

        ((new_h + 0.5).floor() as i64, (new_w + 0.5).floor() as i64)
    }

    /// Resizes a float image in CHW layout with bilinear interpolation.
    pub fn apply_image(&self, image: &Tensor) -> Result<Tensor> {
        let (_channels, height, width) = image.size3()?;
        let (new_h, new_w) = self.output_size(height, width);

        if (new_h, new_w) == (height, width) {
            return Ok(image.shallow_clone());
        }

        let resized = image
            .f_unsqueeze(0)?
            .f_upsample_bilinear2d(&[new_h, new_w], false, None, None)?
            .f_squeeze_dim(0)?;
        Ok(resized)
    }
}

/// Converts an HWC array to a float tensor of the same layout.
pub fn array_to_tensor(array: &Array3<f32>) -> Result<Tensor> {
    let (height, width, channels) = array.dim();
    let array = array.as_standard_layout();
    let data = array
        .as_slice()
        .ok_or_else(|| format_err!("the array is not contiguous"))?;
    let tensor =
        Tensor::of_slice(data).f_view([height as i64, width as i64, channels as i64])?;
    Ok(tensor)
}

/// Reverses the channel order of an HWC image, turning BGR into RGB and
/// vice versa.
pub fn reverse_channels(image: &Tensor) -> Result<Tensor> {
    Ok(image.f_flip(&[2])?)
}

/// Permutes an HWC image into CHW layout.
pub fn hwc_to_chw(image: &Tensor) -> Result<Tensor> {
    Ok(image.f_permute(&[2, 0, 1])?.f_contiguous()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_caps_longest_edge() {
        let resize = ResizeShortestEdge::new(800, 1333).unwrap();
        // 800/1000 scales the long edge to 1600, which is capped to 1333
        assert_eq!(resize.output_size(1000, 2000), (667, 1333));
        assert_eq!(resize.output_size(2000, 1000), (1333, 667));
    }

    #[test]
    fn resize_scales_shortest_edge() {
        let resize = ResizeShortestEdge::new(800, 1333).unwrap();
        assert_eq!(resize.output_size(600, 800), (800, 1067));
        assert_eq!(resize.output_size(480, 480), (800, 800));
        assert_eq!(resize.output_size(1600, 1200), (1067, 800));
    }

    #[test]
    fn resize_rejects_non_positive_sizes() {
        assert!(ResizeShortestEdge::new(0, 1333).is_err());
        assert!(ResizeShortestEdge::new(800, -1).is_err());
    }

    #[test]
    fn resize_image_tensor() {
        let resize = ResizeShortestEdge::new(4, 6).unwrap();
        let image = Tensor::ones(&[3, 2, 5], (Kind::Float, Device::Cpu));
        let resized = resize.apply_image(&image).unwrap();
        // 4/2 scales the width to 10, which is capped to 6
        assert_eq!(resized.size(), vec![3, 2, 6]);
        approx::assert_abs_diff_eq!(resized.double_value(&[1, 1, 3]), 1.0);
    }

    #[test]
    fn reverse_channel_order() {
        let array = Array3::from_shape_vec((1, 1, 3), vec![1.0, 2.0, 3.0]).unwrap();
        let image = array_to_tensor(&array).unwrap();
        let reversed = reverse_channels(&image).unwrap();
        assert_eq!(reversed.double_value(&[0, 0, 0]), 3.0);
        assert_eq!(reversed.double_value(&[0, 0, 2]), 1.0);

        let chw = hwc_to_chw(&reversed).unwrap();
        assert_eq!(chw.size(), vec![3, 1, 1]);
        assert_eq!(chw.double_value(&[0, 0, 0]), 3.0);
    }
}
