mod engine;
mod types;

pub use engine::{future_value, project, summarize};
pub use types::{
    MAX_HORIZON_YEARS, MIN_ANNUAL_RETURN_PERCENT, ProjectionError, ProjectionInput,
    ProjectionPoint, ProjectionSeries, ProjectionSummary, RawProjectionInput,
};
