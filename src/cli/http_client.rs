use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use super::credentials::Credentials;

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

/// A failed API call. `fields` carries the server's per-field validation
/// messages when the failure was a 422.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiFailure {
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl ApiFailure {
    fn transport(e: impl std::fmt::Display) -> Self {
        Self {
            message: e.to_string(),
            fields: BTreeMap::new(),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(creds: &Credentials) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: creds.server_url.trim_end_matches('/').to_string(),
            token: Some(creds.token.clone()),
        })
    }

    /// Client without a session, for register/login calls.
    pub fn anonymous(server_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: server_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiFailure> {
        let resp = self
            .authed(self.client.get(self.url(path)))
            .send()
            .map_err(ApiFailure::transport)?;
        handle_response(resp)
    }

    pub fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiFailure> {
        let resp = self
            .authed(self.client.post(self.url(path)))
            .json(body)
            .send()
            .map_err(ApiFailure::transport)?;
        handle_response(resp)
    }

    pub fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiFailure> {
        let resp = self
            .authed(self.client.put(self.url(path)))
            .json(body)
            .send()
            .map_err(ApiFailure::transport)?;
        handle_response(resp)
    }

    pub fn delete(&self, path: &str) -> Result<(), ApiFailure> {
        let resp = self
            .authed(self.client.delete(self.url(path)))
            .send()
            .map_err(ApiFailure::transport)?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(failure_from(resp))
        }
    }
}

fn handle_response<T: DeserializeOwned>(
    resp: reqwest::blocking::Response,
) -> Result<T, ApiFailure> {
    if resp.status().is_success() {
        let api_resp: ApiResponse<T> = resp.json().map_err(ApiFailure::transport)?;
        api_resp.data.ok_or_else(|| ApiFailure {
            message: "Server returned an empty response".to_string(),
            fields: BTreeMap::new(),
        })
    } else {
        Err(failure_from(resp))
    }
}

fn failure_from(resp: reqwest::blocking::Response) -> ApiFailure {
    match resp.json::<ApiResponse<serde_json::Value>>() {
        Ok(api_resp) => ApiFailure {
            message: api_resp
                .error
                .unwrap_or_else(|| "Server error (no details provided)".to_string()),
            fields: api_resp.errors,
        },
        Err(e) => ApiFailure::transport(e),
    }
}
