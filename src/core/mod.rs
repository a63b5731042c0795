pub mod app;
pub mod builtin_presets;
pub mod chat_stream;
pub mod config;
pub mod error;
pub mod message;
pub mod models;
pub mod params;
pub mod preset;
pub mod transcript;
