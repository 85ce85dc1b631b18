use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use common::{Error, Notify, Result, TelegramConfig};

/// One-way Telegram delivery via the Bot API `sendMessage` endpoint.
///
/// Success is exactly HTTP 200. There are no retries — a failed send is
/// logged with the response body and reported as `false`.
pub struct TelegramNotifier {
    url: String,
    chat_id: String,
    http: Client,
}

impl TelegramNotifier {
    pub fn new(cfg: &TelegramConfig) -> Self {
        Self {
            url: format!("https://api.telegram.org/bot{}/sendMessage", cfg.bot_token),
            chat_id: cfg.chat_id.clone(),
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    async fn send(&self, text: &str) -> Result<()> {
        let form = [("chat_id", self.chat_id.as_str()), ("text", text)];

        let resp = self
            .http
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Delivery(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Delivery(format!("HTTP {status}: {body}")));
        }

        debug!("Telegram message delivered");
        Ok(())
    }
}

#[async_trait]
impl Notify for TelegramNotifier {
    async fn notify(&self, text: &str) -> bool {
        match self.send(text).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Telegram delivery failed");
                false
            }
        }
    }
}
