pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod reconciler;
pub mod records;
pub mod scanner;
pub mod sheet;
