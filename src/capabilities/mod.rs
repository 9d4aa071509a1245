//! In-process capabilities driven by the suites

pub mod audio;
pub mod filesystem;
