pub mod api;
pub mod app;
pub mod autocomplete;
pub mod cli;
pub mod config;
pub mod index;
pub mod output;
pub mod runner;
pub mod session;
pub mod utils;

#[cfg(test)]
mod tests;
