//! Inference adapter of a Detectron2 model exported to TorchScript.
//!
//! A hosting platform drives the adapter through [model_fn], [input_fn] and
//! [predict_fn].

mod common;
pub mod config;
pub mod decode;
mod handler;
pub mod model;
pub mod predictor;
pub mod transform;

pub use handler::*;
