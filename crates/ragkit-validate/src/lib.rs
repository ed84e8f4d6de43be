//! ragkit-validate
//!
//! Admission control for fused retrieval results and the refusal text shown
//! when evidence is rejected.
pub mod gate;
pub mod policy;
pub mod refusal;

pub use gate::{FailureReason, RetrievalValidator, ValidationMetrics, Verdict};
pub use policy::ValidationPolicy;
pub use refusal::refusal_message;
