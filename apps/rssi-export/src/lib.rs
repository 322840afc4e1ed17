pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod mode;
pub mod model;
pub mod pipeline;
