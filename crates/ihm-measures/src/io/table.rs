//! Delimited text tables in and out.
//!
//! Input: one header row, one instance per row, the label in a named column
//! (the last one by default). Output: one column per computed measure.
use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use ndarray::Array2;

use crate::data_handling::{Dataset, FeatureKind};
use crate::registry::HardnessTable;

/// Configuration for reading an instance table.
#[derive(Debug, Clone, Default)]
pub struct TableReaderConfig {
    /// Column holding the class label. Defaults to the last column.
    pub label_column: Option<String>,
    /// Field delimiter. Inferred from the file extension when unset.
    pub delimiter: Option<u8>,
}

/// Tab for `.tsv`/`.tab` files, comma otherwise.
pub fn infer_delimiter(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    }
}

/// Read a delimited table into a [`Dataset`].
///
/// A feature column whose cells all parse as `f64` is numeric. Any other
/// column is categorical and its values are replaced by codes in order of
/// first appearance.
pub fn read_dataset<P: AsRef<Path>>(path: P, config: &TableReaderConfig) -> Result<Dataset> {
    let path = path.as_ref();
    let delimiter = config.delimiter.unwrap_or_else(|| infer_delimiter(path));
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open input table: {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read header row")?
        .clone();
    if headers.len() < 2 {
        return Err(anyhow!(
            "Input table needs at least one feature column and a label column, found {} column(s)",
            headers.len()
        ));
    }

    let label_idx = match &config.label_column {
        Some(name) => find_column(&headers, name)
            .ok_or_else(|| anyhow!("Missing label column '{}'", name))?,
        None => headers.len() - 1,
    };
    let feature_indices: Vec<usize> = (0..headers.len()).filter(|&i| i != label_idx).collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); feature_indices.len()];
    let mut labels = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        let label = record
            .get(label_idx)
            .ok_or_else(|| anyhow!("Missing label value at row {}", row_idx + 1))?;
        labels.push(label.to_string());
        for (column, &idx) in cells.iter_mut().zip(feature_indices.iter()) {
            let value = record.get(idx).ok_or_else(|| {
                anyhow!(
                    "Missing value for '{}' at row {}",
                    headers.get(idx).unwrap_or(""),
                    row_idx + 1
                )
            })?;
            column.push(value.to_string());
        }
    }

    let n_rows = labels.len();
    let mut kinds = Vec::with_capacity(cells.len());
    let mut x = Array2::<f64>::zeros((n_rows, cells.len()));
    for (j, column) in cells.iter().enumerate() {
        let (kind, values) = encode_column(column);
        for (i, value) in values.into_iter().enumerate() {
            x[(i, j)] = value;
        }
        kinds.push(kind);
    }

    let feature_names = feature_indices
        .iter()
        .map(|&idx| headers.get(idx).unwrap_or("").to_string())
        .collect();

    let dataset = Dataset::with_kinds(x, kinds, &labels)
        .with_context(|| format!("Invalid dataset in {}", path.display()))?
        .with_feature_names(feature_names);
    Ok(dataset)
}

/// Write measure columns as CSV, one row per instance in dataset order.
///
/// With `with_index` a leading `instance` column holds the row number.
pub fn write_results<P: AsRef<Path>>(
    path: P,
    table: &HardnessTable,
    with_index: bool,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    let mut header: Vec<&str> = Vec::with_capacity(table.columns.len() + 1);
    if with_index {
        header.push("instance");
    }
    header.extend(table.names());
    writer.write_record(&header)?;

    for row in 0..table.n_rows() {
        let mut record = Vec::with_capacity(header.len());
        if with_index {
            record.push(row.to_string());
        }
        record.extend(table.columns.iter().map(|(_, values)| values[row].to_string()));
        writer
            .write_record(&record)
            .with_context(|| format!("Failed to write row {}", row + 1))?;
    }
    writer.flush()?;
    log::info!(
        "Wrote {} measure(s) for {} instances to {}",
        table.columns.len(),
        table.n_rows(),
        path.display()
    );
    Ok(())
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
}

fn encode_column(cells: &[String]) -> (FeatureKind, Vec<f64>) {
    let parsed: Option<Vec<f64>> = cells.iter().map(|c| c.parse::<f64>().ok()).collect();
    if let Some(values) = parsed {
        return (FeatureKind::Numeric, values);
    }
    let mut codes: HashMap<&str, usize> = HashMap::new();
    let values = cells
        .iter()
        .map(|cell| {
            let next = codes.len();
            *codes.entry(cell.as_str()).or_insert(next) as f64
        })
        .collect();
    (FeatureKind::Categorical, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_categorical_codes_follow_first_appearance() {
        let cells: Vec<String> = ["red", "blue", "red", "green"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (kind, values) = encode_column(&cells);
        assert_eq!(kind, FeatureKind::Categorical);
        assert_eq!(values, vec![0.0, 1.0, 0.0, 2.0]);
    }

    #[test]
    fn test_read_tsv_with_named_label() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "class\tlength\tcolor").unwrap();
        writeln!(file, "x\t1.5\tred").unwrap();
        writeln!(file, "y\t2.0\tblue").unwrap();
        writeln!(file, "x\t0.5\tred").unwrap();
        file.flush().unwrap();

        let config = TableReaderConfig {
            label_column: Some("class".to_string()),
            delimiter: None,
        };
        let dataset = read_dataset(file.path(), &config).unwrap();
        assert_eq!(dataset.n_instances(), 3);
        assert_eq!(dataset.feature_names, vec!["length", "color"]);
        assert_eq!(dataset.kinds, vec![FeatureKind::Numeric, FeatureKind::Categorical]);
        assert_eq!(dataset.labels, vec![0, 1, 0]);
    }

    #[test]
    fn test_missing_label_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a,b\n1,x\n2,y").unwrap();
        file.flush().unwrap();
        let config = TableReaderConfig {
            label_column: Some("target".to_string()),
            delimiter: Some(b','),
        };
        let err = read_dataset(file.path(), &config).unwrap_err();
        assert!(err.to_string().contains("target"));
    }
}
