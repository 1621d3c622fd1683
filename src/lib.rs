pub mod aggregate;
pub mod processor;
pub mod record;
pub mod watcher;

// Re-export main types for convenient access
pub use aggregate::{Aggregates, FileSummary};
pub use processor::{process_file, FileProcessor, ProcessError};
pub use record::{parse_line, Record, RecordKind, DELIMITER};
pub use watcher::{watch_events, ProcessingTask, WatchEvent, WatcherConfig};
