use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tokio::sync::mpsc;

use crate::error::GatewayError;
use crate::metrics::FORWARD_FAILURES;
use crate::models::{ContactMessageRow, ForwardJob};

// Talks to the contact_messages table of the remote store
#[derive(Clone)]
pub struct StoreClient {
    client: reqwest::Client,
    endpoint: String,
    auth: Option<(HeaderValue, HeaderValue)>, // apikey + bearer, checked once up front
}

impl StoreClient {
    pub fn new(client: reqwest::Client, base_url: &str, key: Option<String>) -> Self {
        let base = base_url.trim_end_matches('/');
        let base = if base.starts_with("http") {
            base.to_string()
        } else {
            format!("http://{}", base)
        };
        let auth = key.and_then(|key| {
            let apikey = HeaderValue::from_str(&key);
            let bearer = HeaderValue::from_str(&format!("Bearer {}", key));
            match (apikey, bearer) {
                (Ok(apikey), Ok(bearer)) => Some((apikey, bearer)),
                _ => {
                    tracing::warn!("store key is not a valid header value, sending requests without it");
                    None
                }
            }
        });
        Self {
            client,
            endpoint: format!("{}/rest/v1/contact_messages", base),
            auth,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("prefer", HeaderValue::from_static("return=minimal"));
        if let Some((apikey, bearer)) = &self.auth {
            headers.insert("apikey", apikey.clone());
            headers.insert(AUTHORIZATION, bearer.clone());
        }
        headers
    }

    pub async fn insert(&self, row: &ContactMessageRow) -> Result<(), GatewayError> {
        let res = self
            .client
            .post(&self.endpoint)
            .headers(self.headers())
            .json(&[row])
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(format!("request failed: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream(format!("{} {}", status, body.trim())));
        }
        Ok(())
    }
}

// Background worker -> forwards accepted submissions one by one
pub async fn forward_worker(mut rx: mpsc::Receiver<ForwardJob>, store: StoreClient) {
    tracing::info!(
        endpoint = store.endpoint(),
        authenticated = store.is_authenticated(),
        "forward worker started"
    );

    while let Some(job) = rx.recv().await {
        let result = store.insert(&job.row).await;
        if let Err(e) = &result {
            FORWARD_FAILURES.inc();
            tracing::error!(error = %e, "failed to store contact message");
        }
        // handler may have gone away, nothing to do then
        let _ = job.response_tx.send(result);
    }

    tracing::info!("forward worker stopped");
}
