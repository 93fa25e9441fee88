use crate::domain::{DomainError, DomainResult};
use crate::supabase::{ResponseExt, SupabaseConfig};
use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::debug;

pub const API_KEY_HEADER: &str = "apikey";
pub const PREFER_HEADER: &str = "Prefer";
pub const RETURN_REPRESENTATION: &str = "return=representation";

/// HTTP client for a Supabase project (PostgREST + GoTrue).
///
/// Cheap to clone; clones share the access token installed after sign-in.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl SupabaseClient {
    /// Creates a new client with the project's anon key as default `apikey` header
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_str(&config.anon_key)?);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Request against a PostgREST table
    pub fn rest(&self, method: Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, self.rest_url(table))
            .bearer_auth(self.bearer())
    }

    /// Request against a GoTrue endpoint
    pub fn auth(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.auth_url(path))
            .bearer_auth(self.bearer())
    }

    /// Install (or clear) the user access token used as bearer
    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = token;
        }
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Pings the auth health endpoint to verify connectivity
    pub async fn ping(&self) -> Result<()> {
        self.auth(Method::GET, "health")
            .send()
            .await?
            .error_for_status()?;
        debug!(url = %self.base_url, "supabase connection successful");
        Ok(())
    }

    /// Drops the user token; requests after this run as anon
    pub fn close(&self) {
        self.set_access_token(None);
        debug!(url = %self.base_url, "supabase client closed");
    }

    fn bearer(&self) -> String {
        self.access_token
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }
}

/// Send a request and decode the JSON array of rows it returns
pub async fn read_rows<T: DeserializeOwned>(
    request: RequestBuilder,
    entity: &str,
) -> DomainResult<Vec<T>> {
    let response = request
        .send()
        .await
        .into_backend_result()
        .await
        .map_err(DomainError::from)?;

    response
        .json::<Vec<T>>()
        .await
        .map_err(|e| DomainError::SchemaMismatch(entity.to_string(), e.to_string()))
}
