pub mod db;
pub mod scheduler;
pub mod serve;
pub mod service;
pub mod settings;
pub mod store;
pub mod trends;
pub mod watcher;
