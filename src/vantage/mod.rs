pub mod client;
pub mod model;

pub use client::{QuoteSource, VantageClient};
pub use model::PriceRecord;
