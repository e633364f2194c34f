//! Gmail REST binding.

use crate::api::RemoteApi;
use crate::error::{ErrorKind, Result};
use crate::models::{Ack, ItemMetadata, Label};
use crate::session::Session;
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com";
const USER_AGENT: &str = concat!("mailport/", env!("CARGO_PKG_VERSION"));
// Bodies of failed responses are kept in error messages up to this length.
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Deserialize)]
struct LabelList {
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewLabel<'a> {
    name: &'a str,
    label_list_visibility: &'static str,
    message_list_visibility: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertMetadata<'a> {
    label_ids: [&'a str; 1],
}

#[derive(Deserialize)]
struct Inserted {
    id: Option<String>,
}

/// Gmail API client authenticating through a shared [`Session`].
pub struct GmailApi {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl GmailApi {
    pub fn new(session: Arc<Session>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .or_raise(|| ErrorKind::Network)?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            session,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn labels_url(&self, account: &str) -> String {
        format!("{}/gmail/v1/users/{account}/labels", self.base_url)
    }

    fn insert_url(&self, account: &str) -> String {
        format!(
            "{}/upload/gmail/v1/users/{account}/messages?uploadType=multipart&internalDateSource=dateHeader",
            self.base_url
        )
    }
}

#[async_trait]
impl RemoteApi for GmailApi {
    fn name(&self) -> &str {
        "gmail"
    }

    #[instrument(skip(self))]
    async fn list_labels(&self, account: &str) -> Result<Vec<Label>> {
        let token = self.session.bearer().await?;
        let response = self
            .client
            .get(self.labels_url(account))
            .bearer_auth(token)
            .send()
            .await
            .or_raise(|| ErrorKind::Network)?;
        let list: LabelList = check(response).await?.json().await.or_raise(|| ErrorKind::InvalidData)?;
        debug!(count = list.labels.len(), "listed labels");
        Ok(list.labels)
    }

    #[instrument(skip(self))]
    async fn create_label(&self, account: &str, name: &str) -> Result<Label> {
        let token = self.session.bearer().await?;
        let body = NewLabel {
            name,
            label_list_visibility: "labelShow",
            message_list_visibility: "show",
        };
        let response = self
            .client
            .post(self.labels_url(account))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .or_raise(|| ErrorKind::Network)?;
        check(response).await?.json().await.or_raise(|| ErrorKind::InvalidData)
    }

    #[instrument(skip(self, payload), fields(source = %metadata.source, size = payload.len()))]
    async fn send_item(&self, account: &str, label_id: &str, payload: Vec<u8>, metadata: &ItemMetadata) -> Result<Ack> {
        let token = self.session.bearer().await?;
        let boundary = format!("mailport-{:016x}", rand::random::<u64>());
        let body = multipart_related(&boundary, label_id, &payload)?;
        let response = self
            .client
            .post(self.insert_url(account))
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, format!("multipart/related; boundary={boundary}"))
            .body(body)
            .send()
            .await
            .or_raise(|| ErrorKind::Network)?;
        // The message exists once the status is 2xx; sending it again would duplicate it.
        match check(response).await?.json::<Inserted>().await {
            Ok(inserted) => Ok(Ack { id: inserted.id }),
            Err(err) => {
                warn!(error = %err, "inserted item but could not read the response");
                Ok(Ack { id: None })
            }
        }
    }
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > ERROR_BODY_LIMIT {
        let cut = (0..=ERROR_BODY_LIMIT).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
        body.truncate(cut);
    }
    let kind = classify(status, body);
    warn!(status = status.as_u16(), error = %kind, "request failed");
    Err(exn::Exn::from(kind))
}

fn classify(status: StatusCode, body: String) -> ErrorKind {
    match status.as_u16() {
        401 => ErrorKind::Unauthorized,
        403 | 429 => ErrorKind::RateLimited,
        400 | 404 | 409 | 413 => ErrorKind::BadRequest(body),
        status => ErrorKind::Unexpected { status },
    }
}

fn multipart_related(boundary: &str, label_id: &str, payload: &[u8]) -> Result<Vec<u8>> {
    let metadata = serde_json::to_vec(&InsertMetadata { label_ids: [label_id] }).or_raise(|| ErrorKind::InvalidData)?;
    let mut body = Vec::with_capacity(payload.len() + metadata.len() + 4 * boundary.len() + 128);
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n").as_bytes());
    body.extend_from_slice(&metadata);
    body.extend_from_slice(format!("\r\n--{boundary}\r\nContent-Type: message/rfc822\r\n\r\n").as_bytes());
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    Ok(body)
}
