pub mod job;
pub mod metrics;
pub mod refresher;
pub mod worker;

pub use job::*;
pub use metrics::*;
pub use refresher::*;
pub use worker::*;
