pub mod table;

pub use table::{read_dataset, write_results, TableReaderConfig};
