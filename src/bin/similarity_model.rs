//! Train and query products similarity models kept in a versioned registry.

use product_similarity::config::{ColumnNames, Settings};
use product_similarity::predictor::Predictor;
use product_similarity::registry::{self, ModelRegistry};
use product_similarity::telemetry;
use product_similarity::trainer;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "similarity_model")]
#[command(about = "Manage products similarity models in a model registry")]
#[command(version)]
struct Args {
    /// Registry root (default: RECO_MODELS_DIR or ./models)
    #[arg(long)]
    models_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new model version from order line items and retire the previous one
    Train {
        /// CSV with quantidade_produto, preco_unitario, id_venda, id_produto columns
        orders_csv: PathBuf,
    },
    /// Print products similar to a product using the latest trained version
    Predict {
        /// ID of the product to find similar products for
        product_id: String,
    },
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
    let registry = ModelRegistry::new(args.models_dir.unwrap_or_else(|| settings.models_dir.clone()));

    match args.command {
        Commands::Train { orders_csv } => train(&registry, &settings, orders_csv),
        Commands::Predict { product_id } => predict(&registry, &product_id),
    }
}

fn train(registry: &ModelRegistry, settings: &Settings, orders_csv: PathBuf) -> Result<()> {
    let previous = registry.latest()?;
    let version = registry.create_version(Utc::now())?;
    // The exported training data always carries the canonical header.
    let settings = Settings {
        columns: ColumnNames::default(),
        ..settings.clone()
    };

    let outcome = registry::read_training_csv(&orders_csv)
        .and_then(|records| registry::write_training_csv(version.train_data(), records))
        .and_then(|_| trainer::train(version.train_data(), &version.dir, &settings));

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            error!("Error training model: {}", e);
            registry.retire(&version);
            return Err(e).with_context(|| format!("Training failed for {}", orders_csv.display()));
        }
    };

    if let Some(previous) = previous {
        registry.retire(&previous);
    }

    info!("Model version {} trained", version.name());
    println!(
        "Trained {} on {} products x {} sales",
        version.name(),
        report.n_products,
        report.n_sales
    );
    Ok(())
}

fn predict(registry: &ModelRegistry, product_id: &str) -> Result<()> {
    let version = registry.latest_trained()?;
    let paths = version.artifacts();
    let predictor = Predictor::load(&paths.model, &paths.matrix)
        .context("Failed to load the model or the matrix")?;
    let similar = predictor
        .similar_products(product_id)
        .context("Failed to make the prediction")?;

    println!("{}", serde_json::to_string(&similar)?);
    Ok(())
}
