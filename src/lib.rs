pub mod adapters;
pub mod config;
pub mod domain;
pub mod enrichment;
pub mod error;
pub mod ports;
pub mod scout;

#[cfg(test)]
pub mod test_helpers;
