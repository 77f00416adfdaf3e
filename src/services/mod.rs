pub mod bucket_store;
pub mod disk_store;
pub mod store;
