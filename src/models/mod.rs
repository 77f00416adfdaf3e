//! Core data model for the camera gallery service.
//!
//! The only persistent entity is a stored image, addressed by its
//! timestamp-derived name. There is no database: the storage backend's
//! namespace is the single source of truth.

pub mod image;
