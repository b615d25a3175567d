pub mod connectors;
pub mod error;
pub mod fetcher;
pub mod lookup;
pub mod normalizer;
pub mod pipeline;
