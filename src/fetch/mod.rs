// =============================================================================
// Market Data Fetcher
// =============================================================================
//
// One HTTP GET per logical dataset, parsed into the canonical series shape at
// the boundary.  Callers always receive either a typed payload or a
// `FetchError` kind they can show to the user; raw transport errors never
// escape this module.

pub mod client;
pub mod error;

pub use client::MarketClient;
pub use error::FetchError;
