//! Print the IDs of products similar to a given product as a JSON array.

use product_similarity::predictor::Predictor;
use product_similarity::telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "predict_similar")]
#[command(about = "Find products similar to a product using a trained model")]
#[command(version)]
struct Args {
    /// ID of the product to find similar products for
    product_id: String,

    /// Path to the model file
    model_path: PathBuf,

    /// Path to the matrix file
    matrix_path: PathBuf,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    telemetry::init_tracing();

    let args = Args::try_parse().unwrap_or_else(|e| {
        if e.use_stderr() {
            eprintln!("{}", e);
            process::exit(1);
        }
        e.exit()
    });

    let predictor = Predictor::load(&args.model_path, &args.matrix_path)
        .context("Failed to load the model or the matrix")?;
    let similar = predictor
        .similar_products(&args.product_id)
        .context("Failed to make the prediction")?;

    println!("{}", serde_json::to_string(&similar)?);
    Ok(())
}
