pub mod client;
pub mod content_type;
pub mod errors;
pub mod pipeline;
pub mod types;

pub use client::Fetcher;
pub use content_type::is_allowed_content_type;
pub use errors::FetchError;
pub use types::{Charset, FetchOptions, PageResponse};
