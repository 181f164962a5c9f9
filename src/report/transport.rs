use anyhow::{anyhow, Context, Result};
use std::time::Duration;

/// Status and body of an HTTP reply. Non-2xx replies are returned, not raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking JSON POST.
///
/// `Err` means the request never produced a reply (DNS, TLS, timeout).
pub trait Transport: Send + Sync {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpReply>;
}

/// `ureq` transport with a per-request timeout.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpReply> {
        let payload = serde_json::to_string(body).context("serialize request body")?;
        let mut request = self
            .agent
            .post(url)
            .set("Content-Type", "application/json");
        for (name, value) in headers {
            request = request.set(name, value);
        }
        match request.send_string(&payload) {
            Ok(response) => {
                let status = response.status();
                let body = response.into_string().context("read response body")?;
                Ok(HttpReply { status, body })
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Ok(HttpReply { status, body })
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(anyhow!("request to {} failed: {}", url, transport))
            }
        }
    }
}
