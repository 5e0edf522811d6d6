//! Dataset loader for CSV and Parquet files

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use polars::prelude::*;

/// Load a dataset from a file (CSV or Parquet based on extension)
///
/// `infer_schema_length` of 0 scans the whole CSV for type inference.
/// CSV columns named in `text_columns` are always read as text, so blank
/// cells past the inference window reach the cleaning step as values to
/// coerce instead of nulls.
pub fn load_dataset(
    path: &Path,
    infer_schema_length: usize,
    text_columns: &[String],
) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let lf = match extension.as_str() {
        "csv" => {
            let csv_reader = || LazyCsvReader::new(path).with_infer_schema_length(schema_length);
            let mut lf = csv_reader()
                .finish()
                .with_context(|| format!("Failed to load CSV file: {}", path.display()))?;
            let overwrite = text_overwrite(&mut lf, text_columns)
                .with_context(|| format!("Failed to read CSV header: {}", path.display()))?;
            match overwrite {
                Some(schema) => csv_reader()
                    .with_dtype_overwrite(Some(schema))
                    .finish()
                    .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
                None => lf,
            }
        }
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    lf.collect()
        .with_context(|| format!("Failed to read dataset: {}", path.display()))
}

/// String dtype overrides for the `text_columns` present in the file
fn text_overwrite(lf: &mut LazyFrame, text_columns: &[String]) -> Result<Option<SchemaRef>> {
    let inferred = lf.collect_schema()?;
    let fields: Vec<Field> = text_columns
        .iter()
        .filter(|name| inferred.contains(name.as_str()))
        .map(|name| Field::new(name.as_str().into(), DataType::String))
        .collect();

    if fields.is_empty() {
        return Ok(None);
    }
    Ok(Some(Arc::new(Schema::from_iter(fields))))
}

/// Estimated in-memory size of a DataFrame in megabytes
pub fn estimated_memory_mb(df: &DataFrame) -> f64 {
    df.estimated_size() as f64 / (1024.0 * 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_csv_with_blank_numeric_cells() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("churn.csv");
        std::fs::write(
            &path,
            "customerID,tenure,TotalCharges,Churn\nA,1,29.85,No\nB,0, ,Yes\n",
        )
        .unwrap();

        let df = load_dataset(&path, 100, &[]).unwrap();
        assert_eq!(df.shape(), (2, 4));
        assert!(df.column("TotalCharges").is_ok());
    }

    #[test]
    fn test_text_columns_survive_short_inference_window() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("churn.csv");
        let mut csv = String::from("customerID,tenure,TotalCharges,Churn\n");
        for i in 0..20 {
            csv.push_str(&format!("C{},{},{}.50,No\n", i, i + 1, (i + 1) * 30));
        }
        csv.push_str("C20,0, ,Yes\n");
        std::fs::write(&path, csv).unwrap();

        let text = vec!["TotalCharges".to_string(), "NotInFile".to_string()];
        let df = load_dataset(&path, 5, &text).unwrap();
        let total = df.column("TotalCharges").unwrap();
        assert_eq!(total.dtype(), &DataType::String);
        assert_eq!(total.null_count(), 0);
        assert_eq!(df.column("tenure").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_dataset(Path::new("data.xlsx"), 100, &[]).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[test]
    fn test_missing_file_errors() {
        let result = load_dataset(Path::new("/nonexistent/churn.csv"), 100, &[]);
        assert!(result.is_err());
    }
}
