pub mod calibration;
pub mod classifier_trait;
pub mod factory;
pub mod grid_search;
pub mod naive_bayes;
pub mod tree;

pub use calibration::CalibratedClassifier;
pub use classifier_trait::ProbabilisticClassifier;
pub use naive_bayes::GaussianNB;
pub use tree::DecisionTree;
