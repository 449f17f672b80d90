//! Single image predictor.

use crate::{
    common::*,
    config::{Config, InputFormat},
    model::{InferenceModel, ModelInput, Prediction, TorchScriptModel},
    transform::{self, ResizeShortestEdge},
};

/// A loaded model ready to serve predictions.
///
/// Input images are always in BGR order. The predictor converts them to the
/// model format, resizes them and runs the model on one image at a time.
#[derive(Debug)]
pub struct Predictor<M = TorchScriptModel> {
    model: M,
    resize: ResizeShortestEdge,
    input_format: InputFormat,
    /// The name of the dataset the model is evaluated on, if any.
    dataset_name: Option<String>,
}

impl<M> Predictor<M>
where
    M: InferenceModel,
{
    pub fn new(model: M, config: &Config) -> Result<Self> {
        let resize =
            ResizeShortestEdge::new(config.input.min_size_test, config.input.max_size_test)?;
        Ok(Self {
            model,
            resize,
            input_format: config.input.format,
            dataset_name: config.datasets.test.first().cloned(),
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn input_format(&self) -> InputFormat {
        self.input_format
    }

    pub fn dataset_name(&self) -> Option<&str> {
        self.dataset_name.as_deref()
    }

    /// Runs the model on an HWC image in BGR order and returns the
    /// prediction of that image.
    pub fn predict(&self, image: &Array3<f32>) -> Result<Prediction> {
        let (height, width, channels) = image.dim();
        ensure!(
            channels == 3,
            "expect an image with 3 channels, but get {}",
            channels
        );
        ensure!(height > 0 && width > 0, "the image is empty");

        tch::no_grad(|| -> Result<_> {
            let image = transform::array_to_tensor(image)?;
            let image = match self.input_format {
                InputFormat::Rgb => transform::reverse_channels(&image)?,
                InputFormat::Bgr => image,
            };
            let image = transform::hwc_to_chw(&image)?;
            let image = self.resize.apply_image(&image)?;

            let input = ModelInput {
                image,
                height: height as i64,
                width: width as i64,
            };
            let mut predictions = self.model.forward(&[input])?;

            ensure!(
                predictions.len() == 1,
                "expect exactly one prediction for one image, but get {}",
                predictions.len()
            );
            Ok(predictions.remove(0))
        })
    }
}

impl Predictor<TorchScriptModel> {
    /// Loads a TorchScript model file on the configured device.
    pub fn load(weights_file: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let device = config.model.device()?;
        let model = TorchScriptModel::load(weights_file, device)?;
        Self::new(model, config)
    }
}
