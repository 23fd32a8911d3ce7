mod engine;
mod error;
mod types;

pub use engine::{MAX_PROJECTION_YEARS, project_sip, project_swp};
pub use error::ProjectionError;
pub use types::{SipInputs, SipResult, SwpInputs, SwpResult};
