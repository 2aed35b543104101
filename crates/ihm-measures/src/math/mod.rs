//! Distance structures shared by the neighborhood measures.
pub mod distance;

pub use distance::{pairwise_distances, NeighborRanking};
