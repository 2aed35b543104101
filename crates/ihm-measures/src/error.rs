use std::error::Error;
use std::fmt;

/// Errors raised while building hardness measures.
#[derive(Debug, Clone, PartialEq)]
pub enum HardnessError {
    /// The measure request was not a sequence of names.
    InvalidRequest(String),
    /// Fewer than two distinct labels were found.
    TooFewClasses(usize),
    EmptyDataset,
    LengthMismatch { features: usize, labels: usize },
    InvalidParameter(String),
    Cancelled,
}

impl fmt::Display for HardnessError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HardnessError::InvalidRequest(found) => {
                write!(f, "Measures must be requested as a list of names, got {}", found)
            }
            HardnessError::TooFewClasses(count) => write!(
                f,
                "At least 2 distinct labels are required, found {}",
                count
            ),
            HardnessError::EmptyDataset => write!(f, "Dataset has no instances or no features"),
            HardnessError::LengthMismatch { features, labels } => write!(
                f,
                "Feature rows ({}) and labels ({}) must have equal length",
                features, labels
            ),
            HardnessError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            HardnessError::Cancelled => write!(f, "Computation was cancelled"),
        }
    }
}

impl Error for HardnessError {}

pub type Result<T> = std::result::Result<T, HardnessError>;
