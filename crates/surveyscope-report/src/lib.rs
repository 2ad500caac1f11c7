pub mod config;
pub mod error;
pub mod factory;
pub mod job;
pub mod providers;
pub mod results;
pub mod template;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{ProviderError, ReportError};
pub use factory::*;
pub use job::{ReportJob, ReportOutcome, ReportRequest};
pub use results::*;
pub use traits::*;
pub use types::*;
