pub mod client;
pub mod config;
pub mod fetch;
pub mod parse;
pub mod report;
