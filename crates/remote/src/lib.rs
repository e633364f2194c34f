//! The remote mailbox: its API, the credentials used to reach it, and the
//! Gmail binding (behind the `gmail` feature).

mod api;
mod auth;
pub mod error;
#[cfg(feature = "gmail")]
pub mod gmail;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod models;
mod session;

pub use crate::api::RemoteApi;
pub use crate::auth::{AuthProvider, CommandToken, StaticToken};
pub use crate::error::{ErrorKind, into_action};
pub use crate::models::{Ack, Credentials, ItemMetadata, Label};
pub use crate::session::Session;
use std::sync::Arc;

pub type RemoteHandle = Arc<dyn RemoteApi + Send + Sync>;
