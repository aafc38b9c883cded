pub mod yahoo;

// Re-export the client for convenient access (e.g. `use crate::provider::YahooClient`).
pub use yahoo::YahooClient;
