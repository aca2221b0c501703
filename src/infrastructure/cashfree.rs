//! Cashfree PG adapter over its REST API.

use crate::config::GatewayConfig;
use crate::domain::payment::{
    GatewayOrderRequest, GatewayOrderStatus, GatewaySession, WebhookSignature,
};
use crate::domain::ports::PaymentGateway;
use crate::error::GatewayError;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use sha2::Sha256;

const HEADER_CLIENT_ID: &str = "x-client-id";
const HEADER_CLIENT_SECRET: &str = "x-client-secret";
const HEADER_API_VERSION: &str = "x-api-version";

#[derive(Clone)]
pub struct CashfreeGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl CashfreeGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.endpoint().trim_end_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(HEADER_CLIENT_ID, &self.config.client_id)
            .header(HEADER_CLIENT_SECRET, &self.config.client_secret)
            .header(HEADER_API_VERSION, &self.config.api_version)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))
    }
}

/// Base64 HMAC-SHA256 of `timestamp || body`, keyed with the client secret.
pub fn sign_webhook(secret: &str, timestamp: &str, body: &[u8]) -> Result<String, GatewayError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| GatewayError::Signature("HMAC key error".to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl PaymentGateway for CashfreeGateway {
    async fn create_order(
        &self,
        request: &GatewayOrderRequest,
    ) -> Result<GatewaySession, GatewayError> {
        let call = self.client.post(self.url("/pg/orders")).json(request);
        let session: GatewaySession = self.send(call).await?;
        tracing::debug!(order_id = %request.order_id, "gateway order created");
        Ok(session)
    }

    async fn fetch_order(&self, order_id: &str) -> Result<GatewayOrderStatus, GatewayError> {
        let call = self.client.get(self.url(&format!("/pg/orders/{order_id}")));
        self.send(call).await
    }

    fn verify_webhook(
        &self,
        body: &[u8],
        signature: &WebhookSignature,
    ) -> Result<(), GatewayError> {
        let (Some(timestamp), Some(received)) =
            (signature.timestamp.as_deref(), signature.signature.as_deref())
        else {
            return Err(GatewayError::Signature(
                "missing signature headers".to_string(),
            ));
        };

        let expected = STANDARD
            .decode(received)
            .map_err(|_| GatewayError::Signature("signature is not base64".to_string()))?;
        let mut mac = Hmac::<Sha256>::new_from_slice(self.config.client_secret.as_bytes())
            .map_err(|_| GatewayError::Signature("HMAC key error".to_string()))?;
        mac.update(timestamp.as_bytes());
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| GatewayError::Signature("signature mismatch".to_string()))
    }
}
