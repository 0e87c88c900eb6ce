pub mod listing;
pub mod operations;
pub mod scan;
pub mod store;
pub mod watcher;
