pub mod boundary;
pub mod cache;
pub mod geometry;
pub mod http;
pub mod script;
pub mod service;
pub mod settings;
pub mod types;
pub mod unicode;
