//! The data-loading pipeline, leaves first.
//!
//! * [`connectivity`]: is the network usable right now?
//! * [`query`]: turn a [`SearchConfig`](crate::config::SearchConfig) into a
//!   request URL.
//! * [`guardian`]: execute the request and parse the body into
//!   [`NewsItem`]s.
//! * [`news_item`]: the records and outcomes that flow out of the pipeline.
//!
//! Orchestration (threads, generations, delivery) lives in
//! [`crate::loader`]; nothing in here keeps state between loads.
//!
//! ## For contributors: adding another news API
//!
//! 1. Create a new file in this directory (e.g. `nytimes.rs`).
//! 2. Implement [`NewsFetcher`] for a struct holding its HTTP client.
//! 3. Give it a query builder of its own if its parameters differ.
//! 4. Re-export it below and construct it in `main.rs`.

pub mod connectivity;
pub mod guardian;
pub mod news_item;
pub mod query;

pub use connectivity::{ConnectivityGate, TcpProbeGate};
pub use guardian::{GuardianFetcher, NewsFetcher};
pub use news_item::{ErrorKind, LoadOutcome, NewsItem};
pub use query::QueryBuilder;
