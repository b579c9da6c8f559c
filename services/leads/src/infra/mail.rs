use std::time::Duration;

use anyhow::Context as _;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::domain::repository::MailTransport;
use crate::domain::types::{MailMessage, TransportError};

/// Mail relay reached over HTTP: `POST {url}` with a bearer key and a JSON body.
#[derive(Clone)]
pub struct HttpMailTransport {
    client: Client,
    url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
}

impl HttpMailTransport {
    pub fn new(url: &str, api_key: &str, from: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build mail relay client")?;
        Ok(Self {
            client,
            url: url.to_owned(),
            api_key: api_key.to_owned(),
            from: from.to_owned(),
        })
    }
}

impl MailTransport for HttpMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), TransportError> {
        let body = SendRequest {
            from: &self.from,
            to: &message.recipients,
            subject: &message.subject,
            text: &message.body,
        };
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let detail = resp.text().await.unwrap_or_default();
        Err(relay_error(status, &detail))
    }
}

/// The relay's own error text, unchanged. The status line stands in when the body is empty.
fn relay_error(status: StatusCode, detail: &str) -> TransportError {
    if detail.trim().is_empty() {
        TransportError(status.to_string())
    } else {
        TransportError(detail.to_owned())
    }
}
