//! Hyperparameter and metric definition files.

use crate::common::*;
use serde_json::Value;

/// The hyperparameter holding the Detectron2 config file name.
pub const CONFIG_FILE_HYPERPARAMETER: &str = "config-file";

/// Metrics reported by the Detectron2 training loop, as pairs of metric name
/// and the label printed in the training log.
const DETECTRON2_METRICS: [(&str, &str); 9] = [
    ("total_loss", "total_loss"),
    ("loss_cls", "loss_cls"),
    ("loss_box_reg", "loss_box_reg"),
    ("loss_mask", "loss_mask"),
    ("loss_rpn_cls", "loss_rpn_cls"),
    ("loss_rpn_loc", "loss_rpn_loc"),
    ("overall_training_speed", "Overall training speed"),
    ("lr", "lr"),
    ("iter", "iter"),
];

/// A metric extracted from the training log by a regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDefinition {
    pub name: String,
    pub regex: String,
}

/// The metric definitions for the Detectron2 training log.
pub fn default_metric_definitions() -> Vec<MetricDefinition> {
    DETECTRON2_METRICS
        .iter()
        .map(|&(name, label)| MetricDefinition {
            name: name.to_owned(),
            regex: format!(r".*{}:\s([0-9\.]+)\s*", label),
        })
        .collect()
}

/// Loads metric definitions from a newline-delimited JSON file.
pub fn load_metric_definitions(path: impl AsRef<Path>) -> Result<Vec<MetricDefinition>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read metrics file '{}'", path.display()))?;
    parse_metric_definitions(&text)
        .with_context(|| format!("invalid metrics file '{}'", path.display()))
}

/// Parses one metric definition per line. Blank lines are skipped.
pub fn parse_metric_definitions(text: &str) -> Result<Vec<MetricDefinition>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).with_context(|| format!("at line {}", index + 1))
        })
        .try_collect()
}

/// Loads hyperparameters from a JSON object file.
pub fn load_hyperparameters(path: impl AsRef<Path>) -> Result<IndexMap<String, String>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read hyperparameters file '{}'", path.display()))?;
    parse_hyperparameters(&text)
        .with_context(|| format!("invalid hyperparameters file '{}'", path.display()))
}

/// Parses a JSON object of hyperparameters. The service accepts string
/// values only, so numbers and booleans are converted to their JSON text.
pub fn parse_hyperparameters(text: &str) -> Result<IndexMap<String, String>> {
    let values: IndexMap<String, Value> = serde_json::from_str(text)?;
    values
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(value) => value,
                Value::Number(value) => value.to_string(),
                Value::Bool(value) => value.to_string(),
                other => bail!(
                    "hyperparameter '{}' must be a string, number or bool, but get {}",
                    key,
                    other
                ),
            };
            Ok((key, value))
        })
        .try_collect()
}
