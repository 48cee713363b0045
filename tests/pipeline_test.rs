use product_similarity::artifacts::{self, ArtifactPaths};
use product_similarity::config::{ColumnNames, Settings};
use product_similarity::incidence::IncidenceTable;
use product_similarity::predictor::Predictor;
use product_similarity::trainer;
use product_similarity::RecoError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write order line items in the exported training format.
fn write_orders(dir: &Path, name: &str, rows: &[(u32, f64, &str, &str)]) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut content = String::from("quantidade_produto,preco_unitario,id_venda,id_produto\n");
    for (quantity, price, sale, product) in rows {
        content.push_str(&format!("{},{},{},{}\n", quantity, price, sale, product));
    }
    let path = dir.join(name);
    fs::write(&path, content)?;
    Ok(path)
}

#[test]
fn test_train_then_predict_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let csv = write_orders(
        dir.path(),
        "train-data.csv",
        &[(1, 10.0, "1", "A"), (2, 5.0, "1", "B"), (1, 10.0, "2", "A")],
    )?;
    let out = dir.path().join("model");

    let report = trainer::train(&csv, &out, &Settings::default())?;
    assert!(report.duplicates.is_empty());

    let table = artifacts::load_matrix(&report.artifacts.matrix)?;
    assert_eq!(table.product_ids(), &["A".to_string(), "B".to_string()]);
    assert_eq!(table.sale_ids(), &["1".to_string(), "2".to_string()]);
    assert_eq!(table.row_vector(0), Some(vec![1.0, 1.0]));
    assert_eq!(table.row_vector(1), Some(vec![1.0, 0.0]));

    let predictor = Predictor::load(&report.artifacts.model, &report.artifacts.matrix)?;
    let similar = predictor.similar_products("A")?;
    assert!(similar.contains(&"B".to_string()));
    assert!(!similar.contains(&"A".to_string()));

    assert!(predictor.similar_products("unknown")?.is_empty());
    Ok(())
}

#[test]
fn test_exactly_two_artifacts_and_input_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let csv = write_orders(
        dir.path(),
        "orders.csv",
        &[(1, 1.0, "10", "p1"), (1, 1.0, "10", "p2"), (1, 1.0, "11", "p3")],
    )?;
    let before = fs::read(&csv)?;
    let out = dir.path().join("out");

    trainer::train(&csv, &out, &Settings::default())?;

    let mut written: Vec<String> = fs::read_dir(&out)?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    written.sort();
    assert_eq!(written, vec!["matrix.json", "model.json"]);
    assert_eq!(fs::read(&csv)?, before);
    Ok(())
}

#[test]
fn test_training_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let csv = write_orders(
        dir.path(),
        "orders.csv",
        &[
            (1, 1.0, "1", "A"),
            (1, 1.0, "1", "B"),
            (1, 1.0, "2", "B"),
            (1, 1.0, "2", "C"),
            (1, 1.0, "3", "A"),
        ],
    )?;
    let out = dir.path().join("out");
    let paths = ArtifactPaths::in_dir(&out);

    trainer::train(&csv, &out, &Settings::default())?;
    let first = (artifacts::load_model(&paths.model)?, artifacts::load_matrix(&paths.matrix)?);
    trainer::train(&csv, &out, &Settings::default())?;
    let second = (artifacts::load_model(&paths.model)?, artifacts::load_matrix(&paths.matrix)?);

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_empty_csv_fails_without_artifacts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let csv = dir.path().join("empty.csv");
    fs::write(&csv, "")?;
    let out = dir.path().join("out");

    let err = trainer::train(&csv, &out, &Settings::default()).unwrap_err();
    assert!(matches!(err, RecoError::Input(_)));
    assert!(!err.to_string().is_empty());
    assert!(!ArtifactPaths::in_dir(&out).model.exists());
    assert!(!ArtifactPaths::in_dir(&out).matrix.exists());
    Ok(())
}

#[test]
fn test_predictions_exclude_self_and_respect_k() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let mut rows = Vec::new();
    let products: Vec<String> = (0..12).map(|i| format!("prod-{}", i)).collect();
    let sales: Vec<String> = (0..30).map(|i| format!("{}", 1000 + i)).collect();
    let mut rng = StdRng::seed_from_u64(7);
    for sale in &sales {
        for product in &products {
            if rng.gen_bool(0.3) {
                rows.push((1u32, 2.5f64, sale.as_str(), product.as_str()));
            }
        }
    }
    let csv = write_orders(dir.path(), "orders.csv", &rows)?;
    let out = dir.path().join("out");
    let report = trainer::train(&csv, &out, &Settings::default())?;
    let predictor = Predictor::load(&report.artifacts.model, &report.artifacts.matrix)?;

    for product in predictor.table().product_ids().to_vec() {
        let similar = predictor.similar_products(&product)?;
        assert!(!similar.contains(&product));
        assert!(similar.len() <= 4);
        let unique: HashSet<&String> = similar.iter().collect();
        assert_eq!(unique.len(), similar.len());
    }
    Ok(())
}

#[test]
fn test_incidence_matches_random_transactions() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let n = rng.gen_range(1..60);
        let pairs: Vec<(String, String)> = (0..n)
            .map(|_| {
                (
                    format!("p{}", rng.gen_range(0..8)),
                    format!("{}", rng.gen_range(0..15)),
                )
            })
            .collect();
        let seen: HashSet<(String, String)> = pairs.iter().cloned().collect();

        let table = IncidenceTable::from_pairs(pairs.clone());
        let matrix = table.to_sparse()?;
        assert_eq!(matrix.nnz(), seen.len());

        for (r, product) in table.product_ids().iter().enumerate() {
            let row = table.row_vector(r).ok_or("missing row")?;
            assert_eq!(row.len(), table.n_sales());
            for (c, sale) in table.sale_ids().iter().enumerate() {
                let expected = if seen.contains(&(product.clone(), sale.clone())) { 1.0 } else { 0.0 };
                assert_eq!(row[c], expected);
                assert_eq!(matrix.get(r, c), expected);
            }
        }
    }
    Ok(())
}

#[test]
fn test_custom_pivot_columns() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let csv = dir.path().join("custom.csv");
    fs::write(&csv, "order,sku\n1,x\n1,y\n2,x\n")?;
    let settings = Settings {
        columns: ColumnNames {
            product: "sku".to_string(),
            sale: "order".to_string(),
        },
        ..Settings::default()
    };

    let report = trainer::train(&csv, dir.path().join("out"), &settings)?;
    let predictor = Predictor::load(&report.artifacts.model, &report.artifacts.matrix)?;
    assert_eq!(predictor.similar_products("x")?, vec!["y".to_string()]);
    Ok(())
}

#[test]
fn test_leading_zero_ids_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let csv = dir.path().join("zeros.csv");
    fs::write(&csv, "id_venda,id_produto\n1,007\n1,008\n2,007\n")?;

    let report = trainer::train(&csv, dir.path().join("out"), &Settings::default())?;
    let predictor = Predictor::load(&report.artifacts.model, &report.artifacts.matrix)?;
    assert_eq!(predictor.table().product_ids(), &["007".to_string(), "008".to_string()]);
    assert_eq!(predictor.similar_products("007")?, vec!["008".to_string()]);
    assert!(predictor.similar_products("7")?.is_empty());
    Ok(())
}

#[test]
fn test_text_product_after_numeric_rows() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let mut content = String::from("id_venda,id_produto\n");
    for i in 0..150 {
        content.push_str(&format!("{},{}\n", i, i));
    }
    content.push_str("149,sku-x\n");
    let csv = dir.path().join("mixed.csv");
    fs::write(&csv, content)?;

    let report = trainer::train(&csv, dir.path().join("out"), &Settings::default())?;
    assert_eq!(report.n_products, 151);
    let predictor = Predictor::load(&report.artifacts.model, &report.artifacts.matrix)?;
    assert!(predictor.similar_products("sku-x")?.contains(&"149".to_string()));
    Ok(())
}

#[test]
fn test_padded_ids_match_trimmed_queries() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let csv = dir.path().join("padded.csv");
    fs::write(&csv, "id_venda,id_produto\n1, A\n1,B\n2, A\n")?;

    let report = trainer::train(&csv, dir.path().join("out"), &Settings::default())?;
    let predictor = Predictor::load(&report.artifacts.model, &report.artifacts.matrix)?;
    assert_eq!(predictor.similar_products(" A")?, vec!["B".to_string()]);
    assert_eq!(predictor.similar_products("A")?, vec!["B".to_string()]);
    Ok(())
}
