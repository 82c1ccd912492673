use super::{
    ErpApi, ErpApiError, ErpDocumentLookup, ErpDocumentRef, ErpOrderPayload, ErpShipmentPayload,
    ExportOutcome, IdempotencyToken, ShipmentOutcome, ValidateOutcome,
};
use crate::shared::config::ErpConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contracts::shared::directories::ErpDirectories;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const CRITICAL_VALIDATION_ERROR: &str = "critical_validation_error";

/// HTTP-клиент шлюза ERP
pub struct ErpApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ErpApiClient {
    pub fn new(config: &ErpConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create ERP HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ErpApiError> {
        let url = self.url(path);
        tracing::debug!("ERP API: GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ErpApiError::Network(format!("GET {}: {}", url, e)))?;

        Self::decode(&url, response).await
    }

    async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ErpApiError> {
        let url = self.url(path);
        tracing::debug!("ERP API: POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ErpApiError::Network(format!("POST {}: {}", url, e)))?;

        Self::decode(&url, response).await
    }

    async fn decode<R: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<R, ErpApiError> {
        let status = response.status();
        tracing::debug!("ERP API response: {} for {}", status, url);

        let text = response
            .text()
            .await
            .map_err(|e| ErpApiError::Network(format!("reading body of {}: {}", url, e)))?;

        if !status.is_success() {
            return Err(ErpApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| ErpApiError::Decode(format!("{}: {} (body: {})", url, e, text)))
    }
}

// ============================================================================
// Wire formats
// ============================================================================

#[derive(Debug, Serialize)]
struct TokenRequest<'a, P: Serialize> {
    #[serde(flatten)]
    payload: &'a P,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct ValidateMetadata {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValidateResponseWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    metadata: Option<ValidateMetadata>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    details: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportMetadata {
    #[serde(rename = "saleToken", default)]
    sale_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExportResponseWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    exported: bool,
    #[serde(rename = "dilovodId", default)]
    erp_id: Option<String>,
    #[serde(rename = "dilovodExportDate", default)]
    export_date: Option<DateTime<Utc>>,
    #[serde(default)]
    metadata: Option<ExportMetadata>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShipmentResponseWire {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    created: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct LookupRequestWire<'a> {
    #[serde(rename = "orderNumbers")]
    order_numbers: &'a [String],
}

#[derive(Debug, Deserialize)]
struct DocumentRefWire {
    id: String,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct LookupItemWire {
    #[serde(rename = "orderNumber")]
    order_number: String,
    #[serde(rename = "saleOrder", default)]
    sale_order: Option<DocumentRefWire>,
    #[serde(rename = "shipmentDate", default)]
    shipment_date: Option<DateTime<Utc>>,
    #[serde(rename = "cashInDate", default)]
    cash_in_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct LookupResponseWire {
    #[serde(default)]
    data: Vec<LookupItemWire>,
}

fn details_to_string(details: Option<serde_json::Value>) -> String {
    match details {
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

impl From<ValidateResponseWire> for ValidateOutcome {
    fn from(w: ValidateResponseWire) -> Self {
        if w.kind.as_deref() == Some(CRITICAL_VALIDATION_ERROR) {
            let mut details = details_to_string(w.details);
            if details.is_empty() {
                details = w.message.or(w.error).unwrap_or_default();
            }
            return ValidateOutcome::CriticalConfiguration { details };
        }
        if w.success {
            let token = w.metadata.unwrap_or_default().token;
            return ValidateOutcome::Accepted {
                token: IdempotencyToken::from_option(token),
            };
        }
        let message = w
            .error
            .or(w.message)
            .or_else(|| w.details.map(|d| details_to_string(Some(d))))
            .unwrap_or_else(|| "ERP rejected the order without a message".to_string());
        ValidateOutcome::Rejected { message }
    }
}

/// Тело ответа с ошибочным статусом, если это критичная ошибка настройки
fn critical_from_body(body: &str) -> Option<ValidateOutcome> {
    let wire: ValidateResponseWire = serde_json::from_str(body).ok()?;
    if wire.kind.as_deref() != Some(CRITICAL_VALIDATION_ERROR) {
        return None;
    }
    Some(wire.into())
}

impl From<ExportResponseWire> for ExportOutcome {
    fn from(w: ExportResponseWire) -> Self {
        if !w.success {
            return ExportOutcome::Rejected {
                message: w
                    .error
                    .or(w.message)
                    .unwrap_or_else(|| "ERP export failed without a message".to_string()),
            };
        }
        if !w.exported {
            return ExportOutcome::NoChanges;
        }
        match w.erp_id {
            Some(doc_id) if !doc_id.is_empty() => ExportOutcome::Created {
                doc_id,
                export_date: w.export_date.unwrap_or_else(Utc::now),
                sale_token: IdempotencyToken::from_option(
                    w.metadata.unwrap_or_default().sale_token,
                ),
            },
            _ => ExportOutcome::Rejected {
                message: "ERP reported export without a document id".to_string(),
            },
        }
    }
}

impl From<ShipmentResponseWire> for ShipmentOutcome {
    fn from(w: ShipmentResponseWire) -> Self {
        let message = w.message.unwrap_or_default();
        if w.success && w.created {
            ShipmentOutcome::Created {
                date: w.date.unwrap_or_else(Utc::now),
                message,
            }
        } else {
            ShipmentOutcome::NotCreated { message }
        }
    }
}

impl From<LookupItemWire> for ErpDocumentLookup {
    fn from(w: LookupItemWire) -> Self {
        ErpDocumentLookup {
            order_number: w.order_number,
            sale_order: w.sale_order.map(|d| ErpDocumentRef {
                id: d.id,
                date: d.date,
            }),
            shipment_date: w.shipment_date,
            cash_in_date: w.cash_in_date,
        }
    }
}

#[async_trait]
impl ErpApi for ErpApiClient {
    async fn fetch_directories(&self) -> Result<ErpDirectories, ErpApiError> {
        let directories: ErpDirectories = self.get_json("directories").await?;
        tracing::info!(
            "ERP directories: {} payment forms, {} cash accounts, {} trade channels, {} delivery methods",
            directories.payment_forms.len(),
            directories.cash_accounts.len(),
            directories.trade_channels.len(),
            directories.delivery_methods.len()
        );
        Ok(directories)
    }

    async fn validate_order(
        &self,
        payload: &ErpOrderPayload,
    ) -> Result<ValidateOutcome, ErpApiError> {
        match self.post_json::<_, ValidateResponseWire>("orders/validate", payload).await {
            Ok(wire) => Ok(wire.into()),
            // критичная ошибка настройки может прийти и с 4xx/5xx
            Err(ErpApiError::Http { status, body }) => match critical_from_body(&body) {
                Some(outcome) => {
                    tracing::warn!("ERP validate answered {} with a critical error", status);
                    Ok(outcome)
                }
                None => Err(ErpApiError::Http { status, body }),
            },
            Err(e) => Err(e),
        }
    }

    async fn export_order(
        &self,
        payload: &ErpOrderPayload,
        token: IdempotencyToken,
    ) -> Result<ExportOutcome, ErpApiError> {
        let body = TokenRequest {
            payload,
            token: token.as_str(),
        };
        let wire: ExportResponseWire = self.post_json("orders/export", &body).await?;
        Ok(wire.into())
    }

    async fn create_shipment(
        &self,
        payload: &ErpShipmentPayload,
        token: IdempotencyToken,
    ) -> Result<ShipmentOutcome, ErpApiError> {
        let body = TokenRequest {
            payload,
            token: token.as_str(),
        };
        let wire: ShipmentResponseWire = self.post_json("orders/shipment", &body).await?;
        Ok(wire.into())
    }

    async fn lookup_documents(
        &self,
        order_numbers: &[String],
    ) -> Result<Vec<ErpDocumentLookup>, ErpApiError> {
        if order_numbers.is_empty() {
            return Ok(Vec::new());
        }
        let wire: LookupResponseWire = self
            .post_json("orders/lookup", &LookupRequestWire { order_numbers })
            .await?;
        Ok(wire.data.into_iter().map(Into::into).collect())
    }
}
