//! Client side of the stock dashboard: a timed-out JSON HTTP client, the
//! catalog of backend endpoints, wire types, and the [`MarketApi`] seam the
//! dashboard store fetches through.

pub mod api;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod sentiment;
pub mod types;

pub use api::{HttpMarketApi, MarketApi};
pub use config::ClientConfig;
pub use endpoints::{ApiRequest, Endpoint};
pub use error::ClientError;
pub use http::JsonClient;
pub use types::*;
