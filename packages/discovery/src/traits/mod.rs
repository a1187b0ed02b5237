//! Core trait abstractions: the opaque text source and the record sink.

pub mod sink;
pub mod source;

pub use sink::RecordSink;
pub use source::TextSource;
