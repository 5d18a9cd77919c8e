//! Call orchestration.
//!
//! Ties the provider, the completion poller and the user store together:
//! - **Blocking start**: persist, start the call, wait for the transcript
//! - **Detached start**: persist, start the call, watch in the background

mod registry;
mod service;
mod types;

pub use registry::ExecutionRegistry;
pub use service::CallService;
pub use types::{
    CallError, CallOutcome, CallResult, DetachedCall, PhoneNumber, STATUS_COMPLETED,
    STATUS_PENDING,
};
