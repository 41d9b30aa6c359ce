pub mod config;
pub mod entities;
pub mod extractor;
pub mod fetcher;
pub mod jobs;
pub mod refresh;
pub mod scrape;
pub mod store;
