use crate::domain::payment::{Payment, PaymentData};
use crate::domain::ports::PlatformApi;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

/// `PlatformApi` over the platform's `/v2/payments` REST endpoints.
///
/// Every request carries `Authorization: Key <api_key>`.
#[derive(Clone)]
pub struct HttpPlatformApi {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct IncompletePayments {
    #[serde(default)]
    incomplete_server_payments: Vec<Payment>,
}

impl HttpPlatformApi {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, api_key)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Authorization", format!("Key {}", self.api_key))
    }

    /// Sends `request` and parses a 200 body; anything else is an `ApiRequest` error.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, unknown_error: &str) -> Result<T> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "platform API response");
        parse_response(status, &body, unknown_error)
    }
}

fn parse_response<T: DeserializeOwned>(status: StatusCode, body: &str, unknown_error: &str) -> Result<T> {
    if status != StatusCode::OK {
        return Err(PaymentError::ApiRequest {
            message: extract_error_message(body).unwrap_or_else(|| unknown_error.to_string()),
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    serde_json::from_str(body).map_err(|_| PaymentError::ApiRequest {
        message: "Failed to parse response body".to_string(),
        status: status.as_u16(),
        body: body.to_string(),
    })
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
    parsed
        .get("error_message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

#[async_trait]
impl PlatformApi for HttpPlatformApi {
    async fn create_payment(&self, data: &PaymentData) -> Result<Payment> {
        let request = self
            .http
            .post(self.url("/v2/payments"))
            .json(&json!({ "payment": data }));
        self.send(request, "An unknown error occurred while creating a payment")
            .await
    }

    async fn get_payment(&self, payment_id: &str) -> Result<Payment> {
        let response = self
            .authorized(self.http.get(self.url(&format!("/v2/payments/{payment_id}"))))
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PaymentError::PaymentNotFound {
                payment_id: payment_id.to_string(),
            });
        }
        let body = response.text().await?;
        parse_response(status, &body, "An unknown error occurred while fetching the payment")
    }

    async fn complete_payment(&self, payment_id: &str, txid: &str) -> Result<Payment> {
        let request = self
            .http
            .post(self.url(&format!("/v2/payments/{payment_id}/complete")))
            .json(&json!({ "txid": txid }));
        self.send(request, "An unknown error occurred while completing the payment")
            .await
    }

    async fn cancel_payment(&self, payment_id: &str) -> Result<Payment> {
        let request = self
            .http
            .post(self.url(&format!("/v2/payments/{payment_id}/cancel")))
            .json(&json!({}));
        self.send(request, "An unknown error occurred while cancelling the payment")
            .await
    }

    async fn incomplete_server_payments(&self) -> Result<Vec<Payment>> {
        let request = self
            .http
            .get(self.url("/v2/payments/incomplete_server_payments"));
        let parsed: IncompletePayments = self
            .send(
                request,
                "An unknown error occurred while fetching incomplete payments",
            )
            .await?;
        Ok(parsed.incomplete_server_payments)
    }
}
