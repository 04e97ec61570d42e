pub mod loaders;
pub mod record;

pub use loaders::{load_dataset, save_results};
pub use record::{EvaluationResults, GroupedDataset, QaRecord, ScoreBundle};
