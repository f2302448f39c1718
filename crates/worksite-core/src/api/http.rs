//! ============================================================================
//! HTTP Work-Order API Client
//! ============================================================================
//! reqwest implementation of the work-order contract. The bearer credential
//! is passed in explicitly at construction: no ambient auth store. Timeouts
//! follow reqwest's ambient policy and surface as ordinary call failures.
//! ============================================================================

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::WorkOrderApi;
use crate::types::{
    CompletionEvidence, DocumentKind, EncodedDocument, EntityStatus, ItemizedBudgetLine,
    PaymentBasisFields, PaymentRequest, UpdatedEntity,
};

/// HTTP client for the remote work-order API
pub struct HttpWorkOrderApi {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl HttpWorkOrderApi {
    /// Create a client for the given API root, authenticating with the
    /// supplied bearer token
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
            bearer_token: bearer_token.into(),
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.bearer_token))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to call work-order API: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Work-order API error {}: {}", status, body));
        }

        response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse work-order API response: {}", e))
    }

    /// POST where success carries no body worth parsing
    async fn post_json_no_content<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + Sync,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.bearer_token))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to call work-order API: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Work-order API error {}: {}", status, body));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkOrderApi for HttpWorkOrderApi {
    async fn update_status(
        &self,
        entity_id: Uuid,
        new_status: EntityStatus,
        evidence: &CompletionEvidence,
        material_cost: Decimal,
        basis: &PaymentBasisFields,
    ) -> Result<UpdatedEntity> {
        info!("Updating status of {} to {:?}", entity_id, new_status);

        let request = UpdateStatusRequest {
            new_status,
            evidence,
            material_cost,
            basis,
        };
        let updated: UpdatedEntity = self
            .post_json(&format!("/entities/{}/status", entity_id), &request)
            .await?;

        info!("Entity {} now {:?}", updated.id, updated.status);
        Ok(updated)
    }

    async fn create_payment_request(
        &self,
        entity_id: Uuid,
        basis: &PaymentBasisFields,
        calculated_amount: Decimal,
        notes: Option<&str>,
    ) -> Result<PaymentRequest> {
        info!(
            "Creating payment request for {} ({} at {} per {:?} unit)",
            entity_id, calculated_amount, basis.rate, basis.rate_mode
        );

        let request = CreatePaymentRequest {
            entity_id,
            basis,
            calculated_amount,
            notes,
        };
        let payment: PaymentRequest = self.post_json("/payment-requests", &request).await?;

        info!("Payment request created: {}", payment.id);
        Ok(payment)
    }

    async fn generate_document(
        &self,
        entity_id: Uuid,
        kind: DocumentKind,
    ) -> Result<EncodedDocument> {
        info!("Requesting {:?} for {}", kind, entity_id);

        let request = GenerateDocumentRequest { kind };
        self.post_json(&format!("/entities/{}/documents", entity_id), &request)
            .await
    }

    async fn submit_progress_update(
        &self,
        entity_id: Uuid,
        lines: &[ItemizedBudgetLine],
    ) -> Result<()> {
        info!(
            "Submitting progress update for {} ({} budget lines)",
            entity_id,
            lines.len()
        );

        let request = ProgressUpdateRequest { lines };
        self.post_json_no_content(&format!("/entities/{}/progress", entity_id), &request)
            .await
    }
}

// ============================================================================
// Wire Request Types
// ============================================================================

#[derive(Serialize)]
struct UpdateStatusRequest<'a> {
    new_status: EntityStatus,
    evidence: &'a CompletionEvidence,
    material_cost: Decimal,
    basis: &'a PaymentBasisFields,
}

#[derive(Serialize)]
struct CreatePaymentRequest<'a> {
    entity_id: Uuid,
    basis: &'a PaymentBasisFields,
    calculated_amount: Decimal,
    notes: Option<&'a str>,
}

#[derive(Serialize)]
struct GenerateDocumentRequest {
    kind: DocumentKind,
}

#[derive(Serialize)]
struct ProgressUpdateRequest<'a> {
    lines: &'a [ItemizedBudgetLine],
}
