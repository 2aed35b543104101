pub mod cli;
pub mod measure;
pub mod util;
