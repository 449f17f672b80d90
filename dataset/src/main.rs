use anyhow::Result;
use drone_dataset::{visualize, GroundTruthCheck};
use log::info;
use prettytable::{cell, row, Table};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, Clone, StructOpt)]
/// Index and inspect the semantic drone dataset.
enum Args {
    /// Pair images with ground truth files and report the samples.
    Index {
        /// directory of source images
        image_dir: PathBuf,
        /// directory of label id images
        gt_dir: PathBuf,
        #[structopt(long)]
        /// save the records as JSON to this file
        output: Option<PathBuf>,
        #[structopt(long)]
        /// require a ground truth file for every image
        strict: bool,
        #[structopt(long)]
        /// draw ground truth overlays into this directory
        visualize_dir: Option<PathBuf>,
        #[structopt(long, default_value = "0.5")]
        /// opacity of the overlay colors
        alpha: f32,
    },
    /// Print the label catalog.
    Labels,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    match Args::from_args() {
        Args::Index {
            image_dir,
            gt_dir,
            output,
            strict,
            visualize_dir,
            alpha,
        } => {
            let check = if strict {
                GroundTruthCheck::EveryPair
            } else {
                GroundTruthCheck::FirstOnly
            };
            let records = drone_dataset::index_with(&image_dir, &gt_dir, check)?;
            info!("Done loading {} samples.", records.len());

            if let Some(output) = output {
                drone_dataset::save_records(&records, &output)?;
                info!("records saved to '{}'", output.display());
            }

            if let Some(dir) = visualize_dir {
                let count = visualize::save_visualizations(&records, &dir, alpha)?;
                info!("saved {} visualizations to '{}'", count, dir.display());
            }
        }
        Args::Labels => print_labels(),
    }

    Ok(())
}

fn print_labels() {
    let mut table = Table::new();
    table.add_row(row![
        "name",
        "id",
        "train id",
        "category",
        "category id",
        "has instances",
        "ignore in eval",
        "color"
    ]);

    label::labels().iter().for_each(|label| {
        let [r, g, b] = label.color;
        table.add_row(row![
            label.name,
            label.id,
            label.train_id,
            label.category,
            label.category_id,
            label.has_instances,
            label.ignore_in_eval,
            format!("({}, {}, {})", r, g, b),
        ]);
    });

    table.printstd();
}
