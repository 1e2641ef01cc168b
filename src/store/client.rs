use std::time::Duration;

use log::{
    error,
    warn,
};
use reqwest::{
    header::{
        HeaderMap,
        HeaderValue,
    },
    Client,
};
use serde::{
    de::DeserializeOwned,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};

use super::{
    wire::{
        ApiEnvelope,
        BatchEnvelope,
        BatchResult,
        DeleteBody,
        FetchParams,
        FieldSelector,
        GetParams,
        RecordsBody,
    },
    StoreConfig,
};
use crate::core::FlowCrmError;

/// Generic, table-parameterized CRUD against the hosted record store.
/// One instance is shared by every entity service.
pub struct RecordClient {
    http: Client,
    base_url: String,
}

impl RecordClient {
    pub fn new(config: &StoreConfig) -> Result<Self, FlowCrmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Project-Id",
            HeaderValue::from_str(&config.project_id)
                .map_err(|e| FlowCrmError::Custom(format!("Invalid project id: {}", e)))?,
        );
        headers.insert(
            "X-Public-Key",
            HeaderValue::from_str(&config.public_key)
                .map_err(|e| FlowCrmError::Custom(format!("Invalid public key: {}", e)))?,
        );

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, FlowCrmError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.http.post(&url).json(body).send().await?;
        Ok(response.json::<R>().await?)
    }

    /// List rows of a table. A logical store failure degrades to an empty
    /// list (logged); only transport and decode problems are errors.
    pub async fn fetch_records<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &FetchParams,
    ) -> Result<Vec<T>, FlowCrmError> {
        let envelope: ApiEnvelope<Vec<T>> =
            self.post(&format!("tables/{}/fetch", table), params).await?;

        if !envelope.success {
            error!(
                "Failed to fetch records from {}: {}",
                table,
                envelope.message.as_deref().unwrap_or("unknown store error")
            );
            return Ok(Vec::new());
        }

        Ok(envelope.data.unwrap_or_default())
    }

    /// Fetch one row by id. An absent id is `Ok(None)`, not an error.
    pub async fn get_record_by_id<T: DeserializeOwned>(
        &self,
        table: &str,
        id: i64,
        fields: Vec<FieldSelector>,
    ) -> Result<Option<T>, FlowCrmError> {
        let envelope: ApiEnvelope<T> = self
            .post(&format!("tables/{}/records/{}", table, id), &GetParams { fields })
            .await?;

        if !envelope.success {
            warn!(
                "Record {} not found in {}: {}",
                id,
                table,
                envelope.message.as_deref().unwrap_or("unknown store error")
            );
            return Ok(None);
        }

        Ok(envelope.data)
    }

    /// Create one row. The payload must already be coerced for the write
    /// path (bare integer reference ids, no empty-string numerics).
    pub async fn create_record<T: DeserializeOwned>(
        &self,
        table: &str,
        record: Map<String, Value>,
    ) -> Result<T, FlowCrmError> {
        let envelope: BatchEnvelope<T> = self
            .post(&format!("tables/{}/create", table), &RecordsBody::single(record))
            .await?;
        Self::single_write_result(table, "create", envelope)
    }

    /// Partial update: only the fields present in `record` change. `Id` is
    /// set here and is immutable on the store side.
    pub async fn update_record<T: DeserializeOwned>(
        &self,
        table: &str,
        id: i64,
        mut record: Map<String, Value>,
    ) -> Result<T, FlowCrmError> {
        record.insert("Id".to_string(), Value::from(id));
        let envelope: BatchEnvelope<T> = self
            .post(&format!("tables/{}/update", table), &RecordsBody::single(record))
            .await?;
        Self::single_write_result(table, "update", envelope)
    }

    /// Delete a batch of ids. The store may remove part of the batch and
    /// still answer `success: true`, so the per-id results are inspected and
    /// a mixed outcome surfaces as `PartialBatch`.
    pub async fn delete_records(&self, table: &str, ids: &[i64]) -> Result<(), FlowCrmError> {
        let total = ids.len();
        let envelope: BatchEnvelope<DeleteOutcome> = self
            .post(&format!("tables/{}/delete", table), &DeleteBody { record_ids: ids.to_vec() })
            .await?;

        if !envelope.success {
            let message =
                envelope.message.unwrap_or_else(|| format!("Failed to delete from {}", table));
            error!("{}", message);
            return Err(FlowCrmError::validation(message));
        }

        let results = envelope.results.unwrap_or_default();
        let failed: Vec<&BatchResult<DeleteOutcome>> =
            results.iter().filter(|r| !r.success).collect();
        if !failed.is_empty() {
            let message = failed[0]
                .message
                .clone()
                .unwrap_or_else(|| format!("Failed to delete from {}", table));
            error!("Failed to delete {} of {} records from {}: {}", failed.len(), total, table, message);
            return Err(FlowCrmError::PartialBatch { failed: failed.len(), total, message });
        }

        Ok(())
    }

    fn single_write_result<T>(
        table: &str,
        operation: &str,
        envelope: BatchEnvelope<T>,
    ) -> Result<T, FlowCrmError> {
        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("Failed to {} record in {}", operation, table));
            error!("{}", message);
            return Err(FlowCrmError::validation(message));
        }

        let results = envelope.results.unwrap_or_default();
        for result in &results {
            if !result.success {
                let message = result
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("Failed to {} record in {}", operation, table));
                error!("Failed to {} record in {}: {}", operation, table, message);
                return Err(FlowCrmError::Validation {
                    message,
                    errors: result.errors.clone().unwrap_or_default(),
                });
            }
        }

        results
            .into_iter()
            .find(|r| r.success)
            .and_then(|r| r.data)
            .ok_or_else(|| {
                FlowCrmError::Custom(format!("Store returned no record data on {}", operation))
            })
    }
}

/// Delete results carry no row data; this stands in for the generic slot.
#[derive(Debug, serde::Deserialize)]
struct DeleteOutcome {}
