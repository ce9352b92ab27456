//! HTTP client for the hosted row-store.
//!
//! Speaks the PostgREST dialect the backend exposes: one REST resource per
//! table under `/rest/v1/`, equality filters as `column=eq.value` query
//! pairs, and `Prefer: return=representation` so writes echo the affected
//! rows back.

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde_json::Value;

use super::{ApiError, Filter, Order, RowStore};

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Header asking the backend to return affected rows on insert/update/delete.
const PREFER_REPRESENTATION: &str = "return=representation";

/// REST client for the backend row-store.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    /// Create a client for the given backend project URL and API key.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        let key = header::HeaderValue::from_str(&self.api_key)
            .map_err(|e| ApiError::InvalidResponse(format!("Invalid API key: {}", e)))?;
        let bearer = header::HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| ApiError::InvalidResponse(format!("Invalid API key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Check if the response is successful, converting the status and body
    /// into an `ApiError` if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn read_rows(response: Response) -> Result<Vec<Value>, ApiError> {
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl RowStore for ApiClient {
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<Order>,
    ) -> Result<Vec<Value>, ApiError> {
        let mut query: Vec<(String, String)> = vec![("select".to_string(), "*".to_string())];
        for f in filters {
            query.push((f.column.clone(), format!("eq.{}", f.value)));
        }
        if let Some(o) = order {
            let direction = if o.ascending { "asc" } else { "desc" };
            query.push(("order".to_string(), format!("{}.{}", o.column, direction)));
        }

        let response = self
            .client
            .get(self.table_url(table))
            .headers(self.auth_headers()?)
            .query(&query)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::read_rows(response).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, ApiError> {
        let response = self
            .client
            .post(self.table_url(table))
            .headers(self.auth_headers()?)
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&row)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let mut rows = Self::read_rows(response).await?;
        if rows.is_empty() {
            return Err(ApiError::InvalidResponse(format!(
                "Insert into {} returned no rows",
                table
            )));
        }
        Ok(rows.remove(0))
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<Value, ApiError> {
        let response = self
            .client
            .patch(self.table_url(table))
            .headers(self.auth_headers()?)
            .header("Prefer", PREFER_REPRESENTATION)
            .query(&[("id", format!("eq.{}", id))])
            .json(&patch)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let mut rows = Self::read_rows(response).await?;
        if rows.is_empty() {
            // The filter matched nothing, so nothing was updated.
            return Err(ApiError::NotFound(format!("{} id {}", table, id)));
        }
        Ok(rows.remove(0))
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.table_url(table))
            .headers(self.auth_headers()?)
            .header("Prefer", PREFER_REPRESENTATION)
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let rows = Self::read_rows(response).await?;
        if rows.is_empty() {
            return Err(ApiError::NotFound(format!("{} id {}", table, id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_handles_trailing_slash() {
        let client = ApiClient::new("https://example.supabase.co/", "key").unwrap();
        assert_eq!(
            client.table_url("users"),
            "https://example.supabase.co/rest/v1/users"
        );
    }
}
