pub mod audit_log;
pub mod client;
pub mod config;
pub mod confirm;
pub mod filter;
pub mod locate;
pub mod model;
pub mod mutate;
pub mod removal;
pub mod reporter;
pub mod runtime;
pub mod target;

#[cfg(test)]
mod mock_hub;
