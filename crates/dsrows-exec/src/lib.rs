#![forbid(unsafe_code)]
//! dsrows-exec: the row controller and what it hands back.
//!
//! Every request runs the same pipeline: resolve the dataset, check that the
//! caller may edit it, then do the work against the store traits from
//! `dsrows-io`. Results come back as a `ResponseState` that a transport layer
//! (the CLI here) serializes as-is.

pub mod auth;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod state;

pub use auth::{Authorizer, Caller, OwnerAuthorizer, UserType};
pub use controller::{Degraded, RowController};
pub use error::{ControllerError, Result};
pub use state::ResponseState;
