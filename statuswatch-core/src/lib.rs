pub mod config;
pub mod report;
pub mod service;
pub mod store;

// Port to the chat platform SDK
pub mod client;
