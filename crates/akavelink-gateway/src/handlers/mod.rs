//! Request handlers

pub mod bucket;
pub mod file;
pub mod service;

pub use bucket::*;
pub use file::*;
pub use service::*;
