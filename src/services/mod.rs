pub mod judge_service;
pub mod text_metrics;

pub use judge_service::{Judge, JudgeService};
pub use text_metrics::{calculate_bleu_scores, calculate_metrics, BleuScores, LexicalScores};
