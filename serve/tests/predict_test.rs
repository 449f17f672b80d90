use anyhow::Result;
use d2_serve::{
    config::{Config, InputFormat},
    model::{InferenceModel, ModelInput, Prediction},
    predictor::Predictor,
};
use indexmap::IndexMap;
use ndarray::{Array3, ArrayD, IxDyn};
use std::{fs, iter, sync::Mutex};
use tch::Tensor;

/// The model input as seen by the model.
#[derive(Debug, Clone, PartialEq)]
struct SeenInput {
    shape: Vec<i64>,
    /// The value of each channel at the top-left pixel.
    pixel: Vec<f64>,
    /// The values of each channel along the top row.
    top_row: Vec<Vec<f64>>,
    height: i64,
    width: i64,
}

/// Records inputs and returns a fixed number of predictions.
struct RecordingModel {
    num_outputs: usize,
    seen: Mutex<Vec<SeenInput>>,
}

impl RecordingModel {
    fn new(num_outputs: usize) -> Self {
        Self {
            num_outputs,
            seen: Mutex::new(vec![]),
        }
    }
}

impl InferenceModel for RecordingModel {
    fn forward(&self, inputs: &[ModelInput]) -> Result<Vec<Prediction>> {
        let mut seen = self.seen.lock().unwrap();
        inputs.iter().for_each(|input| {
            let shape = input.image.size();
            let pixel = (0..shape[0])
                .map(|c| input.image.double_value(&[c, 0, 0]))
                .collect();
            let top_row = (0..shape[0])
                .map(|c| {
                    (0..shape[2])
                        .map(|x| input.image.double_value(&[c, 0, x]))
                        .collect()
                })
                .collect();
            seen.push(SeenInput {
                shape,
                pixel,
                top_row,
                height: input.height,
                width: input.width,
            });
        });

        let predictions = (0..self.num_outputs)
            .map(|index| {
                let outputs: IndexMap<_, _> =
                    iter::once(("scores".to_string(), Tensor::of_slice(&[index as f32])))
                        .collect();
                Prediction::new(outputs)
            })
            .collect();
        Ok(predictions)
    }
}

fn config(format: InputFormat, min_size: i64, max_size: i64) -> Config {
    let mut config = Config::default();
    config.model.device = "cpu".into();
    config.input.format = format;
    config.input.min_size_test = min_size;
    config.input.max_size_test = max_size;
    config
}

/// A single BGR pixel with distinct channel values.
fn bgr_pixel() -> Array3<f32> {
    Array3::from_shape_vec((1, 1, 3), vec![10.0, 20.0, 30.0]).unwrap()
}

/// A 1x2 BGR image whose columns differ in every channel.
fn bgr_columns() -> Array3<f32> {
    Array3::from_shape_vec((1, 2, 3), vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0]).unwrap()
}

#[test]
fn rgb_model_receives_reversed_channels() -> Result<()> {
    let predictor = Predictor::new(RecordingModel::new(1), &config(InputFormat::Rgb, 2, 4))?;
    predictor.predict(&bgr_columns())?;

    let seen = predictor.model().seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let SeenInput {
        shape,
        top_row,
        height,
        width,
        ..
    } = &seen[0];
    assert_eq!(*shape, vec![3, 2, 4]);
    assert_eq!((*height, *width), (1, 2));

    // each channel is interpolated between its own two source columns, so the
    // channels are swapped before resizing
    let expect = [
        [30.0, 37.5, 52.5, 60.0],
        [20.0, 27.5, 42.5, 50.0],
        [10.0, 17.5, 32.5, 40.0],
    ];
    top_row
        .iter()
        .zip(expect.iter())
        .for_each(|(values, expect)| {
            assert_eq!(values.len(), expect.len());
            values.iter().zip(expect.iter()).for_each(|(&value, &expect)| {
                approx::assert_abs_diff_eq!(value, expect, epsilon = 1e-4);
            });
        });
    Ok(())
}

#[test]
fn bgr_model_receives_original_channels() -> Result<()> {
    let predictor = Predictor::new(RecordingModel::new(1), &config(InputFormat::Bgr, 2, 4))?;
    predictor.predict(&bgr_pixel())?;

    let seen = predictor.model().seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].pixel, vec![10.0, 20.0, 30.0]);
    Ok(())
}

#[test]
fn predict_resizes_to_capped_shortest_edge() -> Result<()> {
    let predictor = Predictor::new(RecordingModel::new(1), &config(InputFormat::Bgr, 8, 12))?;
    let image = Array3::zeros((4, 8, 3));
    predictor.predict(&image)?;

    // 8/4 scales the width to 16, which is capped to 12
    let seen = predictor.model().seen.lock().unwrap();
    assert_eq!(seen[0].shape, vec![3, 6, 12]);
    assert_eq!((seen[0].height, seen[0].width), (4, 8));
    Ok(())
}

#[test]
fn predict_returns_one_prediction() -> Result<()> {
    let predictor = Predictor::new(RecordingModel::new(1), &config(InputFormat::Bgr, 2, 4))?;
    let input: ArrayD<f32> = bgr_pixel().into_dyn();
    let prediction = d2_serve::predict_fn(input, &predictor)?;

    assert_eq!(prediction.outputs().len(), 1);
    assert_eq!(prediction.get("scores").unwrap().size(), vec![1]);
    assert_eq!(predictor.model().seen.lock().unwrap().len(), 1);
    Ok(())
}

#[test]
fn predict_rejects_batched_or_empty_outputs() -> Result<()> {
    let predictor = Predictor::new(RecordingModel::new(2), &config(InputFormat::Bgr, 2, 4))?;
    assert!(predictor.predict(&bgr_pixel()).is_err());

    let predictor = Predictor::new(RecordingModel::new(0), &config(InputFormat::Bgr, 2, 4))?;
    assert!(predictor.predict(&bgr_pixel()).is_err());
    Ok(())
}

#[test]
fn predict_rejects_non_image_arrays() -> Result<()> {
    let predictor = Predictor::new(RecordingModel::new(1), &config(InputFormat::Bgr, 2, 4))?;

    let flat = ArrayD::<f32>::zeros(IxDyn(&[2, 3]));
    assert!(d2_serve::predict_fn(flat, &predictor).is_err());

    let gray = ArrayD::<f32>::zeros(IxDyn(&[2, 2, 1]));
    assert!(d2_serve::predict_fn(gray, &predictor).is_err());

    assert!(predictor.model().seen.lock().unwrap().is_empty());
    Ok(())
}

#[test]
fn input_fn_decodes_json_image() -> Result<()> {
    let predictor = Predictor::new(RecordingModel::new(1), &config(InputFormat::Rgb, 2, 4))?;
    let input = d2_serve::input_fn(b"[[[10, 20, 30]]]", "application/json")?;
    d2_serve::predict_fn(input, &predictor)?;

    let seen = predictor.model().seen.lock().unwrap();
    assert_eq!(seen[0].pixel, vec![30.0, 20.0, 10.0]);
    Ok(())
}

#[test]
fn model_fn_requires_model_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let err = d2_serve::model_fn(dir.path()).unwrap_err();
    assert!(err.to_string().contains(d2_serve::CONFIG_FILE_NAME));

    fs::write(
        dir.path().join(d2_serve::CONFIG_FILE_NAME),
        "MODEL:\n  DEVICE: cpu\n",
    )?;
    let err = d2_serve::model_fn(dir.path()).unwrap_err();
    assert!(err.to_string().contains(d2_serve::WEIGHTS_FILE_NAME));

    fs::write(dir.path().join(d2_serve::WEIGHTS_FILE_NAME), b"not a model")?;
    assert!(d2_serve::model_fn(dir.path()).is_err());
    Ok(())
}
