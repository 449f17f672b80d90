use anyhow::{Context, Result};
use d2_serve::decode;
use std::{fs, path::PathBuf};
use structopt::StructOpt;

#[derive(Debug, Clone, StructOpt)]
/// Run a Detectron2 model exported to TorchScript.
enum Args {
    /// Decode one payload file and print the model outputs.
    Predict {
        #[structopt(long, default_value = "model")]
        /// directory with config.yaml and model_final.pth
        model_dir: PathBuf,
        #[structopt(long, default_value = "application/x-npy")]
        /// content type of the payload
        content_type: String,
        /// payload file
        input_file: PathBuf,
    },
    /// List the supported payload content types.
    ContentTypes,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    match Args::from_args() {
        Args::Predict {
            model_dir,
            content_type,
            input_file,
        } => {
            let payload = fs::read(&input_file)
                .with_context(|| format!("failed to read '{}'", input_file.display()))?;

            let predictor = d2_serve::model_fn(&model_dir)?;
            let input = d2_serve::input_fn(&payload, &content_type)?;
            let prediction = d2_serve::predict_fn(input, &predictor)?;

            prediction.outputs().iter().for_each(|(name, tensor)| {
                println!("{}\t{:?}\t{:?}", name, tensor.kind(), tensor.size());
            });
        }
        Args::ContentTypes => {
            decode::supported_content_types()
                .into_iter()
                .for_each(|content_type| println!("{}", content_type));
        }
    }

    Ok(())
}
