pub mod audit;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod exchange;
pub mod store;
pub mod trade;

#[cfg(feature = "keyring-store")]
pub mod keyring;
