//! Built-in [`RecordSink`](crate::traits::RecordSink) implementations.

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::MemorySink;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSink;
