//! High-level operations — fan-out indexing, write serialization, entry points.

pub mod fanout;
pub mod page_index;
pub mod queue;

pub use fanout::{FanOutIndexer, IndexOutcome, IndexStage, StageFailure};
pub use page_index::PageIndex;
pub use queue::WriteQueue;
