//! Service layer wiring the pipeline stages into the exposed operations.

mod facts;
mod forgetting;
mod ingest;
mod search;

pub use facts::{new_fact_id, FactService};
pub use forgetting::{ForgettingSweeper, EXPIRY_FORGET_REASON};
pub use ingest::IngestService;
pub use search::SearchService;
