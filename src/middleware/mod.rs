pub mod admission;
pub mod pipeline;
pub mod response;

pub use admission::{admission_middleware, AdmissionGate, ClientIp, ACCESS_DENIED_MESSAGE};
pub use pipeline::{Pipeline, Priority};
pub use response::{ApiResponse, ApiResult};
