//! Typed access to the path editor REST API.

use chrono::{DateTime, Utc};
use path_canvas::model::{Node, Path};
use path_canvas::sync::{SyncEnvelope, SyncRequest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

use crate::config::BridgeConfig;
use crate::error::{ApiError, Result};

/// Carries the client-side sequence number of a mutating request.
pub const REQUEST_SEQ_HEADER: &str = "X-Request-Seq";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutAlgorithm {
    Grid,
    ForceDirected,
    Circular,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathGenerationAlgorithm {
    NearestNeighbor,
    FullConnectivity,
}

impl PathGenerationAlgorithm {
    fn route(self) -> &'static str {
        match self {
            PathGenerationAlgorithm::NearestNeighbor => "nearest-neighbor",
            PathGenerationAlgorithm::FullConnectivity => "full-connectivity",
        }
    }
}

/// A saved graph layout that can be re-applied to the canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_type: Option<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub paths: Vec<Path>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAsTemplate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub layout_type: String,
    pub nodes: Vec<Node>,
    pub paths: Vec<Path>,
    pub is_public: bool,
}

/// The graph a template produces for a given canvas size.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TemplateApplication {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub paths: Vec<Path>,
}

#[derive(Deserialize)]
struct NodesBody {
    nodes: Vec<Node>,
}

#[derive(Deserialize)]
struct PathsBody {
    paths: Vec<Path>,
}

/// Bulk endpoints answer with a summary and sometimes the resulting set.
#[derive(Deserialize)]
struct BulkBody {
    #[serde(default)]
    nodes: Option<Vec<Node>>,
    #[serde(default)]
    paths: Option<Vec<Path>>,
}

#[derive(Deserialize)]
struct TemplatesBody {
    templates: Vec<Template>,
}

#[derive(Deserialize)]
struct TemplateBody {
    template: Template,
}

#[derive(Deserialize)]
struct ApplyBody {
    result: TemplateApplication,
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let base = Url::parse(&config.api_url)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolves `segments` below the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Performs one sync request.
    ///
    /// Returns the sequence number the server echoed in `X-Request-Seq`, or the one
    /// that was sent when the server does not echo it.
    pub async fn execute(&self, envelope: &SyncEnvelope) -> Result<u64> {
        let builder = match &envelope.request {
            SyncRequest::CreateNode { node } => {
                self.http.post(self.endpoint(&["nodes"])?).json(node)
            }
            SyncRequest::UpdateNode { id, patch } => {
                self.http.put(self.endpoint(&["nodes", id])?).json(patch)
            }
            SyncRequest::DeleteNode { id } => self.http.delete(self.endpoint(&["nodes", id])?),
            SyncRequest::CreatePath { path } => {
                self.http.post(self.endpoint(&["paths"])?).json(path)
            }
            SyncRequest::UpdatePath { id, patch } => {
                self.http.put(self.endpoint(&["paths", id])?).json(patch)
            }
            SyncRequest::DeletePath { id } => self.http.delete(self.endpoint(&["paths", id])?),
        };

        let response = self
            .send(builder.header(REQUEST_SEQ_HEADER, envelope.seq.to_string()))
            .await?;
        let echoed = response
            .headers()
            .get(REQUEST_SEQ_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(envelope.seq);
        tracing::debug!(seq = echoed, op = envelope.request.op(), "Sync request accepted");
        Ok(echoed)
    }

    pub async fn list_nodes(&self) -> Result<Vec<Node>> {
        let body: NodesBody = self.fetch(self.http.get(self.endpoint(&["nodes"])?)).await?;
        Ok(body.nodes)
    }

    pub async fn list_paths(&self) -> Result<Vec<Path>> {
        let body: PathsBody = self.fetch(self.http.get(self.endpoint(&["paths"])?)).await?;
        Ok(body.paths)
    }

    /// Runs a layout on the server. Returns the new node set when the server includes it.
    pub async fn apply_layout(&self, algorithm: LayoutAlgorithm) -> Result<Option<Vec<Node>>> {
        let request = self
            .http
            .post(self.endpoint(&["layout", "apply"])?)
            .json(&json!({ "algorithm": algorithm }));
        let body: BulkBody = self.fetch(request).await?;
        Ok(body.nodes)
    }

    /// Generates paths on the server. Returns the new path set when the server includes it.
    pub async fn generate_paths(
        &self,
        algorithm: PathGenerationAlgorithm,
        parameters: &Value,
    ) -> Result<Option<Vec<Path>>> {
        let request = self
            .http
            .post(self.endpoint(&["path-generation", algorithm.route()])?)
            .json(parameters);
        let body: BulkBody = self.fetch(request).await?;
        Ok(body.paths)
    }

    pub async fn list_templates(&self) -> Result<Vec<Template>> {
        let body: TemplatesBody = self.fetch(self.http.get(self.endpoint(&["templates"])?)).await?;
        Ok(body.templates)
    }

    pub async fn save_as_template(&self, request: &SaveAsTemplate) -> Result<Template> {
        let builder = self
            .http
            .post(self.endpoint(&["templates", "save-as"])?)
            .json(request);
        let body: TemplateBody = self.fetch(builder).await?;
        Ok(body.template)
    }

    pub async fn apply_template(
        &self,
        id: &str,
        width: f64,
        height: f64,
    ) -> Result<TemplateApplication> {
        let builder = self
            .http
            .post(self.endpoint(&["templates", id, "apply"])?)
            .json(&json!({ "width": width, "height": height }));
        let body: ApplyBody = self.fetch(builder).await?;
        Ok(body.result)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let bytes = self.send(request).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Pulls `error` (or `message`) out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_handles_trailing_slash_and_encoding() {
        for base in ["http://host/api/v1", "http://host/api/v1/"] {
            let client = ApiClient::new(&BridgeConfig {
                api_url: base.to_string(),
                ..Default::default()
            })
            .unwrap();
            let url = client.endpoint(&["nodes", "a b"]).unwrap();
            assert_eq!(url.as_str(), "http://host/api/v1/nodes/a%20b");
        }
    }

    #[test]
    fn rejects_non_base_urls() {
        let config = BridgeConfig {
            api_url: "mailto:ops@example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(ApiClient::new(&config), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn extracts_server_error_message() {
        assert_eq!(
            error_message(r#"{"error":"node not found"}"#).as_deref(),
            Some("node not found")
        );
        assert_eq!(error_message(r#"{"message":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(error_message("<html>"), None);
    }
}
