//! Log processing for logscope
//!
//! This crate provides line parsing, filtering, the queryable record
//! stores and the streaming ingestion pipeline.

mod buffer;
mod filter;
mod index;
mod parser;
mod store;
mod stream;

pub use buffer::RingBuffer;
pub use filter::{CompiledFilter, LevelConstraint, find_matches};
pub use index::IndexedStore;
pub use parser::{LogParser, parse_timestamp_str};
pub use store::{LevelCounts, LogStore, SharedStore, StoreBacking, StoreError};
pub use stream::{
    BATCH_INTERVAL, IngestError, IngestEvent, IngestPipeline, IngestSource, IngestStats,
    LineAssembler, LineCounter,
};

// Re-export types used in our public API
pub use logscope_types::{Filter, LogLevel, LogRecord, SortOrder};
