//! Snapshot file I/O for .mxi files.

pub mod compression;
pub mod reader;
pub mod writer;

pub use reader::SnapshotReader;
pub use writer::SnapshotWriter;
