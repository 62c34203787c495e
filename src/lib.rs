pub mod config;
pub mod detect;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod pivot;
pub mod record;
pub mod report;

pub use config::{RunConfig, Settings};
pub use detect::{classify, CancelToken, DetectConfig};
pub use error::{ConfigError, EngineError, SchemaError};
pub use events::{aggregate, ClassificationEvent, EventIndex};
pub use pipeline::{run, RunSummary};
pub use pivot::{pivot, DuplicatePolicy, GroupBy, PivotedTable};
pub use record::{load_observations, EntityKey, RawTable};
