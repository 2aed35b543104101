use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::ArgMatches;

use ihm_measures::config::{load_config, DistanceMetric};
use ihm_measures::io::TableReaderConfig;
use ihm_measures::HardnessConfig;

use crate::util::{default_output_path, validate_tsv_or_csv_file};

/// Everything one `ihm measure` invocation needs.
#[derive(Debug, Clone)]
pub struct MeasureRunConfig {
    pub input: PathBuf,
    pub output_file: PathBuf,
    pub reader: TableReaderConfig,
    pub hardness: HardnessConfig,
    pub with_index: bool,
}

impl MeasureRunConfig {
    /// Start from the config file (or defaults) and apply command-line
    /// overrides on top.
    pub fn from_arguments(matches: &ArgMatches) -> Result<Self> {
        let input = matches
            .get_one::<String>("input")
            .ok_or_else(|| anyhow::anyhow!("An input table is required"))?;
        validate_tsv_or_csv_file(input)?;
        let input = PathBuf::from(input);

        let mut hardness = match matches.get_one::<PathBuf>("config") {
            Some(path) => {
                log::info!("Using config: {:?}", path);
                load_config(path)?
            }
            None => HardnessConfig::default(),
        };

        if let Some(names) = matches.get_many::<String>("measures") {
            let names: Vec<String> = names.map(|n| n.trim().to_string()).collect();
            hardness.measures = Some(serde_json::json!(names));
        }
        if let Some(&k) = matches.get_one::<usize>("k") {
            hardness.k = k;
        }
        if let Some(metric) = matches.get_one::<String>("metric") {
            hardness.metric = DistanceMetric::from_str(metric).map_err(anyhow::Error::msg)?;
        }
        if let Some(&seed) = matches.get_one::<u64>("seed") {
            hardness.seed = seed;
        }
        if matches.get_flag("no_parallel") {
            hardness.parallel = false;
        }

        let output_file = matches
            .get_one::<PathBuf>("output_file")
            .cloned()
            .unwrap_or_else(|| default_output_path(&input));

        Ok(MeasureRunConfig {
            input,
            output_file,
            reader: TableReaderConfig {
                label_column: matches.get_one::<String>("label").cloned(),
                delimiter: None,
            },
            hardness,
            with_index: !matches.get_flag("no_index"),
        })
    }
}
