//! Bounded-concurrency execution of retryable actions.
//!
//! An [`Executor`] pulls [`WorkItem`]s from a [`Source`] that may still be
//! growing while it is drained, keeps at most `concurrency` of them in
//! flight, and retries each failure in place according to a
//! [`RetryPolicy`]. Failures are classified by the [`FailureCode`] the action
//! attaches to its error:
//! - `Unauthorized`: refresh credentials once through the [`ReauthGate`], then
//!   back off and retry.
//! - `RateLimited` and `Unknown`: back off exponentially (with jitter) and retry.
//! - `BadRequest`: stop the whole run.
//!
//! An action still failing after the policy's attempt ceiling also stops the
//! run.

pub mod error;
mod item;
mod policy;
mod reauth;
mod run;
mod source;

pub use crate::error::{ActionError, ActionResult, FailureCode};
pub use crate::item::{ActionFuture, Completed, WorkItem};
pub use crate::policy::{Classification, RetryPolicy};
pub use crate::reauth::{ReauthGate, Reauthorize};
pub use crate::run::{Executor, POLL_INTERVAL};
pub use crate::source::{FnSource, Pull, Source, from_fn};
