//! Train the products similarity model from a transaction CSV.

use product_similarity::config::Settings;
use product_similarity::telemetry;
use product_similarity::trainer;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "train_model")]
#[command(about = "Fit a k-nearest-neighbors products similarity model")]
#[command(version)]
struct Args {
    /// Transaction CSV with product and sale ID columns
    csv_path: PathBuf,

    /// Directory receiving model.json and matrix.json
    output_dir: PathBuf,
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

    let settings = Settings::from_env().context("Invalid configuration")?;
    let report = trainer::train(&args.csv_path, &args.output_dir, &settings)
        .with_context(|| format!("Training failed for {}", args.csv_path.display()))?;

    println!("{}", report.duplicates);
    println!(
        "Trained on {} products x {} sales ({} purchases)",
        report.n_products, report.n_sales, report.nnz
    );
    println!("Model:  {}", report.artifacts.model.display());
    println!("Matrix: {}", report.artifacts.matrix.display());

    Ok(())
}
