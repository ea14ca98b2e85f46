//! Rate sheet access and its local snapshot.

pub mod cache;
pub mod rate_source;
