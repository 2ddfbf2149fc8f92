pub mod accounts;
pub mod config;
pub mod domain;
pub mod error;
pub mod mail;
pub mod store;
pub mod sync;

#[cfg(test)]
mod testing;
