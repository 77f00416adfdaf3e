//! Camera image gallery service.
//!
//! Accepts images posted by a remote camera over HTTP, stores them under
//! timestamp-derived names, and serves them back through an HTML gallery and
//! a direct-fetch route. The storage backend (local directory or object
//! bucket) is injected behind one trait so both deployment variants share
//! the handler code.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
