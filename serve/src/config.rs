//! The subset of Detectron2 configuration used for inference.

use crate::common::*;

pub use datasets::*;
pub use input::*;
pub use model::*;

/// The tag PyYAML puts on dumped tuples, e.g. `MIN_SIZE_TRAIN: !!python/tuple`.
const PYTHON_TUPLE_TAG: &str = "!!python/tuple";

/// Inference configuration loaded from a Detectron2 `config.yaml`.
///
/// Keys unknown to the adapter are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub datasets: DatasetsConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parses a configuration dumped by Detectron2. Tuples are read as plain
    /// sequences.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let text = text.replace(PYTHON_TUPLE_TAG, "");
        let config: Self = serde_yaml::from_str(&text)?;
        config.input.check()?;
        Ok(config)
    }
}

mod model {
    use super::*;

    /// Model options.
    #[derive(Debug, Clone, Derivative, Serialize, Deserialize)]
    #[derivative(Default)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub struct ModelConfig {
        /// The device name, e.g. "cpu", "cuda" or "cuda:1".
        #[derivative(Default(value = "default_device()"))]
        #[serde(default = "default_device")]
        pub device: String,
        /// The weights path recorded at training time. It is not used for
        /// loading.
        #[serde(default)]
        pub weights: Option<String>,
    }

    impl ModelConfig {
        /// Resolves the device. "cuda" falls back to CPU when no GPU is
        /// available.
        pub fn device(&self) -> Result<Device> {
            parse_device(&self.device)
        }
    }

    fn default_device() -> String {
        "cuda".into()
    }

    pub fn parse_device(name: &str) -> Result<Device> {
        let device = match name.trim() {
            "cpu" => Device::Cpu,
            "cuda" => {
                let device = Device::cuda_if_available();
                if device == Device::Cpu {
                    warn!("CUDA is not available, fall back to CPU");
                }
                device
            }
            other => {
                let index = other
                    .strip_prefix("cuda:")
                    .and_then(|index| index.parse::<usize>().ok())
                    .ok_or_else(|| format_err!("invalid device name '{}'", other))?;
                Device::Cuda(index)
            }
        };
        Ok(device)
    }
}

mod input {
    use super::*;

    /// Input preprocessing options.
    #[derive(Debug, Clone, Derivative, Serialize, Deserialize)]
    #[derivative(Default)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub struct InputConfig {
        /// The channel order the model expects.
        #[serde(default)]
        pub format: InputFormat,
        /// The target length of the shorter image edge.
        #[derivative(Default(value = "800"))]
        #[serde(default = "default_min_size_test")]
        pub min_size_test: i64,
        /// The maximum length of the longer image edge.
        #[derivative(Default(value = "1333"))]
        #[serde(default = "default_max_size_test")]
        pub max_size_test: i64,
    }

    impl InputConfig {
        pub fn check(&self) -> Result<()> {
            ensure!(
                self.min_size_test > 0 && self.max_size_test > 0,
                "MIN_SIZE_TEST and MAX_SIZE_TEST must be positive, but get {} and {}",
                self.min_size_test,
                self.max_size_test
            );
            Ok(())
        }
    }

    /// The color channel order of an image.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Derivative, Serialize, Deserialize)]
    #[derivative(Default)]
    pub enum InputFormat {
        #[serde(rename = "RGB")]
        Rgb,
        #[derivative(Default)]
        #[serde(rename = "BGR")]
        Bgr,
    }

    fn default_min_size_test() -> i64 {
        800
    }

    fn default_max_size_test() -> i64 {
        1333
    }
}

mod datasets {
    use super::*;

    /// Dataset names registered at training time.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub struct DatasetsConfig {
        #[serde(default)]
        pub train: Vec<String>,
        #[serde(default)]
        pub test: Vec<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_detectron2_config() {
        let text = r#"
CUDNN_BENCHMARK: false
DATASETS:
  TEST:
  - coco_2017_val
  TRAIN:
  - coco_2017_train
INPUT:
  CROP:
    ENABLED: false
  FORMAT: RGB
  MAX_SIZE_TEST: 1000
  MIN_SIZE_TEST: 600
MODEL:
  DEVICE: cpu
  WEIGHTS: output/model_final.pth
"#;
        let config = Config::from_yaml_str(text).unwrap();
        assert_eq!(config.input.format, InputFormat::Rgb);
        assert_eq!(config.input.min_size_test, 600);
        assert_eq!(config.input.max_size_test, 1000);
        assert_eq!(config.model.device().unwrap(), Device::Cpu);
        assert_eq!(config.datasets.test, vec!["coco_2017_val".to_string()]);
    }

    #[test]
    fn load_dumped_config_with_tuples() {
        let text = r#"CUDNN_BENCHMARK: false
DATALOADER:
  ASPECT_RATIO_GROUPING: true
  FILTER_EMPTY_ANNOTATIONS: true
  NUM_WORKERS: 4
  REPEAT_THRESHOLD: 0.0
  SAMPLER_TRAIN: TrainingSampler
DATASETS:
  PRECOMPUTED_PROPOSAL_TOPK_TEST: 1000
  PRECOMPUTED_PROPOSAL_TOPK_TRAIN: 2000
  PROPOSAL_FILES_TEST: []
  PROPOSAL_FILES_TRAIN: []
  TEST: !!python/tuple
  - drone_val
  TRAIN: !!python/tuple
  - drone_train
GLOBAL:
  HACK: 1.0
INPUT:
  CROP:
    ENABLED: false
    SIZE:
    - 0.9
    - 0.9
    TYPE: relative_range
  FORMAT: BGR
  MASK_FORMAT: polygon
  MAX_SIZE_TEST: 1333
  MAX_SIZE_TRAIN: 1333
  MIN_SIZE_TEST: 800
  MIN_SIZE_TRAIN: !!python/tuple
  - 640
  - 672
  - 704
  - 736
  - 768
  - 800
  MIN_SIZE_TRAIN_SAMPLING: choice
  RANDOM_FLIP: horizontal
MODEL:
  ANCHOR_GENERATOR:
    ANGLES:
    - - -90
      - 0
      - 90
    ASPECT_RATIOS:
    - - 0.5
      - 1.0
      - 2.0
    NAME: DefaultAnchorGenerator
    OFFSET: 0.0
    SIZES: !!python/tuple
    - !!python/tuple
      - 32
    - !!python/tuple
      - 64
  BACKBONE:
    FREEZE_AT: 2
    NAME: build_resnet_fpn_backbone
  DEVICE: cuda
  KEYPOINT_ON: false
  MASK_ON: false
  META_ARCHITECTURE: SemanticSegmentor
  PIXEL_MEAN:
  - 103.53
  - 116.28
  - 123.675
  PIXEL_STD:
  - 1.0
  - 1.0
  - 1.0
  SEM_SEG_HEAD:
    IGNORE_VALUE: 255
    NUM_CLASSES: 20
  WEIGHTS: ./output/model_final.pth
SOLVER:
  BASE_LR: 0.00025
  IMS_PER_BATCH: 2
  MAX_ITER: 1000
TEST:
  AUG:
    ENABLED: false
    FLIP: true
    MAX_SIZE: 4000
    MIN_SIZES: !!python/tuple
    - 400
    - 500
  EVAL_PERIOD: 0
VERSION: 2
"#;
        let config = Config::from_yaml_str(text).unwrap();
        assert_eq!(config.input.format, InputFormat::Bgr);
        assert_eq!(config.input.min_size_test, 800);
        assert_eq!(config.input.max_size_test, 1333);
        assert_eq!(config.model.device, "cuda");
        assert_eq!(
            config.model.weights.as_deref(),
            Some("./output/model_final.pth")
        );
        assert_eq!(config.datasets.train, vec!["drone_train".to_string()]);
        assert_eq!(config.datasets.test, vec!["drone_val".to_string()]);
    }

    #[test]
    fn missing_keys_use_detectron2_defaults() {
        let config = Config::from_yaml_str("VERSION: 2\n").unwrap();
        assert_eq!(config.input.format, InputFormat::Bgr);
        assert_eq!(config.input.min_size_test, 800);
        assert_eq!(config.input.max_size_test, 1333);
        assert_eq!(config.model.device, "cuda");

        let config = Config::default();
        assert_eq!(config.input.min_size_test, 800);
        assert_eq!(config.model.device, "cuda");
    }

    #[test]
    fn reject_unknown_input_format() {
        let text = "INPUT:\n  FORMAT: YUV\n";
        assert!(Config::from_yaml_str(text).is_err());
    }

    #[test]
    fn parse_device_names() {
        assert_eq!(parse_device("cpu").unwrap(), Device::Cpu);
        assert_eq!(parse_device("cuda:1").unwrap(), Device::Cuda(1));
        assert!(parse_device("tpu").is_err());
    }
}
