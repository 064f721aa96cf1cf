//! Core library components.
//!
//! Everything the setup needs except terminal presentation: input files,
//! the GitHub client, secret sealing and the step sequence.

pub mod bundle;
pub mod config;
pub mod constants;
pub mod github;
pub mod orchestrator;
pub mod seal;
pub mod secrets;
pub mod settings;
pub mod tools;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;
