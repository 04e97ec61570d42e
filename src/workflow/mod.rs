pub mod record_ctx;
pub mod score_flow;

pub use record_ctx::RecordCtx;
pub use score_flow::{
    category_exclusion_policy, ExclusionPolicy, ScoreFlow, ScoreOutcome, EXCLUDED_CATEGORY,
};
