use crate::{
    common::*,
    config::Config,
    decode,
    model::{InferenceModel, Prediction, TorchScriptModel},
    predictor::Predictor,
};

/// The Detectron2 configuration file in the model directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";
/// The exported model file in the model directory.
pub const WEIGHTS_FILE_NAME: &str = "model_final.pth";

/// Loads the model in `model_dir` and returns a ready predictor.
pub fn model_fn(model_dir: impl AsRef<Path>) -> Result<Predictor<TorchScriptModel>> {
    let model_dir = model_dir.as_ref();
    let config_file = model_dir.join(CONFIG_FILE_NAME);
    let weights_file = model_dir.join(WEIGHTS_FILE_NAME);

    ensure!(
        config_file.is_file(),
        "config file '{}' does not exist",
        config_file.display()
    );
    ensure!(
        weights_file.is_file(),
        "weights file '{}' does not exist",
        weights_file.display()
    );

    info!("loading model from '{}'", model_dir.display());
    let config = Config::open(&config_file)
        .with_context(|| format!("failed to load config file '{}'", config_file.display()))?;
    let predictor = Predictor::load(&weights_file, &config)?;

    if let Some(name) = predictor.dataset_name() {
        info!("model is evaluated on dataset '{}'", name);
    }

    Ok(predictor)
}

/// Decodes a request payload into an array.
pub fn input_fn(payload: &[u8], content_type: &str) -> Result<ArrayD<f32>> {
    let array = decode::decode(payload, content_type)?;
    debug!("decoded input of shape {:?}", array.shape());
    Ok(array)
}

/// Runs the predictor on an HWC image array in BGR order.
pub fn predict_fn<M>(input: ArrayD<f32>, predictor: &Predictor<M>) -> Result<Prediction>
where
    M: InferenceModel,
{
    let shape = input.shape().to_vec();
    let image = input
        .into_dimensionality::<Ix3>()
        .map_err(|_| format_err!("expect an image of shape (H, W, C), but get {:?}", shape))?;
    predictor.predict(&image)
}
