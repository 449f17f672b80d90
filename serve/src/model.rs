//! Detection model backends.

use crate::common::*;

/// An image prepared for the model forward.
#[derive(Debug)]
pub struct ModelInput {
    /// Float image in CHW layout after resizing.
    pub image: Tensor,
    /// The height of the image before resizing. Outputs are scaled back to it.
    pub height: i64,
    /// The width of the image before resizing.
    pub width: i64,
}

/// The model output of one image, keyed by output name, e.g.
/// `instances.pred_boxes`.
#[derive(Debug)]
pub struct Prediction {
    outputs: IndexMap<String, Tensor>,
}

impl Prediction {
    pub fn new(outputs: IndexMap<String, Tensor>) -> Self {
        Self { outputs }
    }

    /// Flattens a TorchScript output value.
    ///
    /// Nested dictionaries produce dotted names. Elements of tuples and lists
    /// are named by their index. Non-numeric values are skipped.
    pub fn from_ivalue(value: IValue) -> Result<Self> {
        let mut outputs = IndexMap::new();
        flatten_ivalue("output", value, &mut outputs)?;
        Ok(Self { outputs })
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.outputs.get(name)
    }

    pub fn outputs(&self) -> &IndexMap<String, Tensor> {
        &self.outputs
    }

    pub fn into_outputs(self) -> IndexMap<String, Tensor> {
        self.outputs
    }
}

fn flatten_ivalue(
    prefix: &str,
    value: IValue,
    outputs: &mut IndexMap<String, Tensor>,
) -> Result<()> {
    match value {
        IValue::Tensor(tensor) => insert_output(outputs, prefix.to_owned(), tensor),
        IValue::Int(value) => insert_output(outputs, prefix.to_owned(), Tensor::of_slice(&[value])),
        IValue::Double(value) => {
            insert_output(outputs, prefix.to_owned(), Tensor::of_slice(&[value]))
        }
        IValue::IntList(values) => {
            insert_output(outputs, prefix.to_owned(), Tensor::of_slice(&values))
        }
        IValue::DoubleList(values) => {
            insert_output(outputs, prefix.to_owned(), Tensor::of_slice(&values))
        }
        IValue::TensorList(tensors) => {
            tensors.into_iter().enumerate().for_each(|(index, tensor)| {
                insert_output(outputs, format!("{}.{}", prefix, index), tensor)
            })
        }
        IValue::Tuple(values) | IValue::GenericList(values) => {
            values
                .into_iter()
                .enumerate()
                .try_for_each(|(index, value)| {
                    flatten_ivalue(&format!("{}.{}", prefix, index), value, outputs)
                })?;
        }
        IValue::GenericDict(entries) => {
            entries.into_iter().try_for_each(|(key, value)| -> Result<_> {
                let key = match key {
                    IValue::String(key) => key,
                    IValue::Int(key) => key.to_string(),
                    other => bail!("unsupported dictionary key {:?}", other),
                };
                // top level keys are used as is
                let name = if prefix == "output" {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_ivalue(&name, value, outputs)
            })?;
        }
        IValue::None => {}
        other => debug!("skip non-numeric output '{}': {:?}", prefix, other),
    }

    Ok(())
}

fn insert_output(outputs: &mut IndexMap<String, Tensor>, name: String, tensor: Tensor) {
    if outputs.contains_key(&name) {
        warn!("duplicated output name '{}'", name);
    }
    outputs.insert(name, tensor);
}

/// A model that maps a batch of images to one prediction per image.
pub trait InferenceModel {
    fn forward(&self, inputs: &[ModelInput]) -> Result<Vec<Prediction>>;
}

/// A Detectron2 model exported with TorchScript scripting or tracing.
///
/// The module receives a list of dictionaries with `image`, `height` and
/// `width` entries, as Detectron2 models do.
pub struct TorchScriptModel {
    module: tch::CModule,
    device: Device,
}

impl TorchScriptModel {
    pub fn load(path: impl AsRef<Path>, device: Device) -> Result<Self> {
        let path = path.as_ref();
        let mut module = tch::CModule::load_on_device(path, device)
            .with_context(|| format!("failed to load model '{}'", path.display()))?;
        module.set_eval();
        Ok(Self { module, device })
    }

    pub fn device(&self) -> Device {
        self.device
    }
}

impl std::fmt::Debug for TorchScriptModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TorchScriptModel")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl InferenceModel for TorchScriptModel {
    fn forward(&self, inputs: &[ModelInput]) -> Result<Vec<Prediction>> {
        let batch: Vec<_> = inputs
            .iter()
            .map(|input| {
                let ModelInput {
                    image,
                    height,
                    width,
                } = input;
                IValue::GenericDict(vec![
                    (
                        IValue::String("image".into()),
                        IValue::Tensor(image.to_device(self.device)),
                    ),
                    (IValue::String("height".into()), IValue::Int(*height)),
                    (IValue::String("width".into()), IValue::Int(*width)),
                ])
            })
            .collect();

        let output = self.module.forward_is(&[IValue::GenericList(batch)])?;

        // scripted models return one entry per image, traced models return
        // the flattened outputs of the single image
        let predictions: Vec<_> = match output {
            IValue::GenericList(values) => values
                .into_iter()
                .map(Prediction::from_ivalue)
                .try_collect()?,
            other => vec![Prediction::from_ivalue(other)?],
        };

        Ok(predictions)
    }
}
