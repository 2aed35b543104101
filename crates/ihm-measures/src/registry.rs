//! Dispatch from measure names to measure functions.
//!
//! The registry owns the shared [`Precomputation`] and builds it on first
//! use, so a request for tree-based measures only never pays for the
//! distance matrix or the calibrated classifier.
use serde_json::Value;

use crate::config::HardnessConfig;
use crate::data_handling::Dataset;
use crate::error::{HardnessError, Result};
use crate::execution::CancelToken;
use crate::measures::likelihood::cld;
use crate::measures::neighborhood::{kdn, n2};
use crate::measures::tree_based::LeaveOneOut;
use crate::measures::{Measure, MeasureResult};
use crate::precompute::Precomputation;

/// Named result columns in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HardnessTable {
    pub columns: Vec<(String, MeasureResult)>,
}

impl HardnessTable {
    pub fn column(&self, name: &str) -> Option<&MeasureResult> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, values)| values)
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, values)| values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub struct MeasureRegistry<'a> {
    dataset: &'a Dataset,
    config: HardnessConfig,
    cancel: Option<CancelToken>,
    precomputed: Option<Precomputation>,
}

impl<'a> MeasureRegistry<'a> {
    pub fn new(dataset: &'a Dataset, config: HardnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(MeasureRegistry {
            dataset,
            config,
            cancel: None,
            precomputed: None,
        })
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn config(&self) -> &HardnessConfig {
        &self.config
    }

    /// Measures to run for a list of names.
    ///
    /// `None` selects every measure in declared order. Otherwise the result
    /// is the set of known names among `requested`, sorted by name; unknown
    /// names and duplicates are dropped.
    pub fn resolve(requested: Option<&[&str]>) -> Vec<Measure> {
        let Some(names) = requested else {
            return Measure::ALL.to_vec();
        };
        let mut known: Vec<Measure> = names
            .iter()
            .filter_map(|name| match name.parse::<Measure>() {
                Ok(measure) => Some(measure),
                Err(_) => {
                    log::warn!("Ignoring unknown measure: {}", name);
                    None
                }
            })
            .collect();
        known.sort_by_key(|measure| measure.name());
        known.dedup();
        known
    }

    /// Same as [`resolve`](Self::resolve) for an untyped request.
    ///
    /// `null` means all measures; an array must hold only strings; anything
    /// else is an `InvalidRequest`.
    pub fn resolve_value(requested: Option<&Value>) -> Result<Vec<Measure>> {
        match requested {
            None | Some(Value::Null) => Ok(Self::resolve(None)),
            Some(Value::Array(items)) => {
                let names = items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .ok_or_else(|| HardnessError::InvalidRequest(item.to_string()))
                    })
                    .collect::<Result<Vec<&str>>>()?;
                Ok(Self::resolve(Some(&names)))
            }
            Some(other) => Err(HardnessError::InvalidRequest(other.to_string())),
        }
    }

    /// Compute the requested measures, see [`resolve`](Self::resolve).
    pub fn run(&mut self, requested: Option<&[&str]>) -> Result<HardnessTable> {
        let measures = Self::resolve(requested);
        self.run_measures(&measures)
    }

    pub fn run_value(&mut self, requested: &Value) -> Result<HardnessTable> {
        let measures = Self::resolve_value(Some(requested))?;
        self.run_measures(&measures)
    }

    /// Compute the measures named by `config.measures`.
    pub fn run_configured(&mut self) -> Result<HardnessTable> {
        let measures = Self::resolve_value(self.config.measures.as_ref())?;
        self.run_measures(&measures)
    }

    pub fn run_measures(&mut self, measures: &[Measure]) -> Result<HardnessTable> {
        let mut table = HardnessTable::default();
        for &measure in measures {
            let values = self.compute(measure)?;
            table.columns.push((measure.column_name(), values));
        }
        Ok(table)
    }

    pub fn compute(&mut self, measure: Measure) -> Result<MeasureResult> {
        log::info!("Calculating measure {}", measure);
        let start = std::time::Instant::now();
        let values = match measure {
            Measure::Kdn => {
                let k = self.config.k;
                kdn(self.dataset, &self.precomputation()?.ranking, k)?
            }
            Measure::N2 => n2(self.dataset, &self.precomputation()?.ranking),
            Measure::Cld => cld(self.dataset, &self.precomputation()?.classifier),
            Measure::Dcp => self.leave_one_out().dcp(&self.config.dcp)?,
            Measure::TdPruned => self.leave_one_out().td_pruned(&self.config.td_pruned)?,
            Measure::TdUnpruned => self.leave_one_out().td_unpruned(&self.config.td_unpruned)?,
        };
        log::debug!("{} done in {:.2?}", measure, start.elapsed());
        Ok(values)
    }

    fn precomputation(&mut self) -> Result<&Precomputation> {
        let precomputed = match self.precomputed.take() {
            Some(precomputed) => precomputed,
            None => Precomputation::new(self.dataset, &self.config)?,
        };
        Ok(self.precomputed.insert(precomputed))
    }

    fn leave_one_out(&self) -> LeaveOneOut<'_> {
        let protocol = LeaveOneOut::new(self.dataset, &self.config.grid, self.config.seed)
            .parallel(self.config.parallel);
        match &self.cancel {
            Some(token) => protocol.with_cancel(token),
            None => protocol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use serde_json::json;

    fn small_dataset() -> Dataset {
        let x = Array2::from_shape_fn((8, 2), |(i, j)| {
            let base = if i < 4 { 0.0 } else { 5.0 };
            base + (i % 4) as f64 * 0.1 + j as f64
        });
        let labels = ["a", "a", "a", "a", "b", "b", "b", "b"];
        Dataset::new(x, &labels).unwrap()
    }

    fn config() -> HardnessConfig {
        HardnessConfig {
            k: 3,
            parallel: false,
            ..HardnessConfig::default()
        }
    }

    #[test]
    fn test_resolve_sorted_intersection() {
        let measures = MeasureRegistry::resolve(Some(&["TD_U", "kDN", "bogus", "kDN"]));
        assert_eq!(measures, vec![Measure::TdUnpruned, Measure::Kdn]);
        assert!(MeasureRegistry::resolve(Some(&[])).is_empty());
        assert_eq!(MeasureRegistry::resolve(None), Measure::ALL.to_vec());
    }

    #[test]
    fn test_resolve_value_rejects_non_lists() {
        assert_eq!(
            MeasureRegistry::resolve_value(Some(&json!("kDN"))),
            Err(HardnessError::InvalidRequest("\"kDN\"".to_string()))
        );
        assert!(MeasureRegistry::resolve_value(Some(&json!(["kDN", 3]))).is_err());
        assert_eq!(
            MeasureRegistry::resolve_value(Some(&json!(null))).unwrap().len(),
            6
        );
    }

    #[test]
    fn test_run_builds_named_columns() {
        let dataset = small_dataset();
        let mut registry = MeasureRegistry::new(&dataset, config()).unwrap();
        let table = registry.run(Some(&["N2", "kDN"])).unwrap();
        assert_eq!(table.names(), vec!["feature_N2", "feature_kDN"]);
        assert_eq!(table.n_rows(), 8);
        let kdn = table.column("feature_kDN").unwrap();
        assert!(kdn.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_empty_request_gives_empty_table() {
        let dataset = small_dataset();
        let mut registry = MeasureRegistry::new(&dataset, config()).unwrap();
        let table = registry.run_value(&json!([])).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.n_rows(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dataset = small_dataset();
        let bad = HardnessConfig {
            k: 0,
            ..HardnessConfig::default()
        };
        assert!(MeasureRegistry::new(&dataset, bad).is_err());
    }

    #[test]
    fn test_cancelled_registry() {
        let dataset = small_dataset();
        let token = CancelToken::new();
        token.cancel();
        let mut registry = MeasureRegistry::new(&dataset, config())
            .unwrap()
            .with_cancel(token);
        assert_eq!(registry.compute(Measure::Dcp), Err(HardnessError::Cancelled));
    }
}
