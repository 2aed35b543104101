use crate::config::ClassifierKind;
use crate::models::classifier_trait::ProbabilisticClassifier;
use crate::models::naive_bayes::GaussianNB;
use crate::models::tree::DecisionTree;

/// Build an unfitted boxed classifier from its configuration.
pub fn build_classifier(kind: &ClassifierKind) -> Box<dyn ProbabilisticClassifier> {
    match kind {
        ClassifierKind::GaussianNB { var_smoothing } => Box::new(GaussianNB::new(*var_smoothing)),
        ClassifierKind::DecisionTree { ccp_alpha } => Box::new(DecisionTree::new(*ccp_alpha)),
    }
}
