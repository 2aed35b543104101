use std::time::Instant;

use anyhow::{Context, Result};

use ihm_measures::io::{read_dataset, write_results};
use ihm_measures::{HardnessTable, MeasureRegistry};

use crate::measure::input::MeasureRunConfig;

/// Read the input table, compute the configured measures and write them out.
pub fn run_measures(config: &MeasureRunConfig) -> Result<HardnessTable> {
    let start = Instant::now();
    let dataset = read_dataset(&config.input, &config.reader)?;
    dataset.log_input_data_summary();

    let mut registry = MeasureRegistry::new(&dataset, config.hardness.clone())
        .context("Invalid measure configuration")?;
    let table = registry
        .run_configured()
        .context("Failed to compute hardness measures")?;

    write_results(&config.output_file, &table, config.with_index)?;
    log::info!(
        "Computed {} measure(s) for {} instances in {:.2?}",
        table.columns.len(),
        dataset.n_instances(),
        start.elapsed()
    );
    Ok(table)
}
