//! visor-server: HTTP surface over the vision analyzers

pub mod http;
pub mod quotes;
pub mod rest;
