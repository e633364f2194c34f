use crate::error::Result;
use crate::models::{Ack, ItemMetadata, Label};
use async_trait::async_trait;

/// The remote mailbox.
///
/// Every call reports failures through [`ErrorKind`](crate::ErrorKind), whose
/// [`code`](crate::ErrorKind::code) tells the executor whether to reauthorize,
/// back off or give up.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Human-readable identity, used in logs.
    fn name(&self) -> &str;

    /// Every label that exists on the account.
    async fn list_labels(&self, account: &str) -> Result<Vec<Label>>;

    /// Creates a visible label called `name`.
    async fn create_label(&self, account: &str, name: &str) -> Result<Label>;

    /// Stores one raw RFC 822 message under a label, dated by its own
    /// `Date` header.
    async fn send_item(&self, account: &str, label_id: &str, payload: Vec<u8>, metadata: &ItemMetadata) -> Result<Ack>;
}
