//! In-memory remote for testing.

use crate::api::RemoteApi;
use crate::error::{ErrorKind, Result};
use crate::models::{Ack, ItemMetadata, Label};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Failure key consumed by [`RemoteApi::list_labels`].
pub const LIST_LABELS: &str = "labels.list";

/// An item the mock accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentItem {
    pub account: String,
    pub label_id: String,
    pub source: String,
    pub payload: Vec<u8>,
}

/// In-memory remote for testing.
///
/// Failures are scripted per key: the label name for `create_label`, the
/// item's source path for `send_item` and [`LIST_LABELS`] for
/// `list_labels`. Each call pops the next scripted failure for its key and
/// succeeds once none are left. Created labels get ids `Label_1`,
/// `Label_2`, ...
#[derive(Default)]
pub struct MockRemote {
    labels: Mutex<Vec<Label>>,
    failures: Mutex<HashMap<String, VecDeque<ErrorKind>>>,
    sent: Mutex<Vec<SentItem>>,
    created: Mutex<Vec<String>>,
    latency: Option<Duration>,
    next_id: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels that already exist, as `(id, name)`.
    pub fn with_labels<I, N>(self, labels: impl IntoIterator<Item = (I, N)>) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        lock(&self.labels).extend(labels.into_iter().map(|(id, name)| Label::new(id, name)));
        self
    }

    /// Sleep inside every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the next calls for `key` with these errors, in order.
    pub fn failing(self, key: impl Into<String>, errors: impl IntoIterator<Item = ErrorKind>) -> Self {
        lock(&self.failures).entry(key.into()).or_default().extend(errors);
        self
    }

    pub fn sent(&self) -> Vec<SentItem> {
        lock(&self.sent).clone()
    }

    /// Names of labels created, in creation order.
    pub fn created(&self) -> Vec<String> {
        lock(&self.created).clone()
    }

    pub fn labels(&self) -> Vec<Label> {
        lock(&self.labels).clone()
    }

    /// Highest number of calls that were running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn enter(&self, key: &str) -> Result<InFlight<'_>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let scripted = lock(&self.failures).get_mut(key).and_then(VecDeque::pop_front);
        match scripted {
            Some(kind) => Err(exn::Exn::from(kind)),
            None => Ok(guard),
        }
    }
}

#[async_trait]
impl RemoteApi for MockRemote {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_labels(&self, _account: &str) -> Result<Vec<Label>> {
        let _guard = self.enter(LIST_LABELS).await?;
        Ok(self.labels())
    }

    async fn create_label(&self, _account: &str, name: &str) -> Result<Label> {
        let _guard = self.enter(name).await?;
        let mut labels = lock(&self.labels);
        if labels.iter().any(|label| label.name.eq_ignore_ascii_case(name)) {
            exn::bail!(ErrorKind::BadRequest("Label name exists or conflicts".to_string()));
        }
        let id = format!("Label_{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let label = Label::new(id, name);
        labels.push(label.clone());
        lock(&self.created).push(name.to_string());
        Ok(label)
    }

    async fn send_item(&self, account: &str, label_id: &str, payload: Vec<u8>, metadata: &ItemMetadata) -> Result<Ack> {
        let _guard = self.enter(&metadata.source).await?;
        let mut sent = lock(&self.sent);
        sent.push(SentItem {
            account: account.to_string(),
            label_id: label_id.to_string(),
            source: metadata.source.clone(),
            payload,
        });
        Ok(Ack {
            id: Some(format!("msg-{}", sent.len())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_failures_are_consumed_in_order() {
        let remote = MockRemote::new().failing("Visas", [ErrorKind::RateLimited, ErrorKind::Unauthorized]);
        assert_eq!(*remote.create_label("me", "Visas").await.unwrap_err(), ErrorKind::RateLimited);
        assert_eq!(*remote.create_label("me", "Visas").await.unwrap_err(), ErrorKind::Unauthorized);
        let label = remote.create_label("me", "Visas").await.unwrap();
        assert_eq!(label, Label::new("Label_1", "Visas"));
        assert_eq!(remote.created(), ["Visas"]);
    }

    #[tokio::test]
    async fn test_duplicate_label_is_rejected() {
        let remote = MockRemote::new().with_labels([("INBOX", "INBOX")]);
        let err = remote.create_label("me", "inbox").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_send_records_items() {
        let remote = MockRemote::new();
        let metadata = ItemMetadata {
            source: "INBOX/1.".to_string(),
        };
        let ack = remote.send_item("me", "INBOX", b"mail".to_vec(), &metadata).await.unwrap();
        assert_eq!(ack.id.as_deref(), Some("msg-1"));
        assert_eq!(remote.sent()[0].label_id, "INBOX");
        assert_eq!(remote.peak_in_flight(), 1);
    }
}
