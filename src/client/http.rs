use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;
use crate::client::ExecutionApi;
use crate::config::ClientConfig;
use crate::dsl::WorkflowDef;
use crate::error::{Error, Result};
use crate::runtime::execution::Execution;
use crate::runtime::task::{ForkTaskInput, TaskResult};

/// [`ExecutionApi`] over the server's REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("invalid base_url `{}`: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("base_url `{}` cannot carry a path", config.base_url)));
        }

        let mut headers = HeaderMap::new();
        for (k, v) in &config.headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .map_err(|_| Error::Config(format!("invalid header name `{}`", k)))?;
            let value = HeaderValue::from_str(v)
                .map_err(|_| Error::Config(format!("invalid value for header `{}`", k)))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let url_str = url.to_string();
        debug!(url = %url_str, "GET");

        let response = self.client.get(url).send().await
            .map_err(|source| Error::Transport { url: url_str.clone(), source })?;
        let status = response.status();
        let body = response.text().await
            .map_err(|source| Error::Transport { url: url_str.clone(), source })?;

        if !status.is_success() {
            return Err(Error::status(url_str, status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|source| Error::Decode { url: url_str, source })
    }
}

fn task_query(task_id: Option<&str>) -> Vec<(&'static str, String)> {
    task_id.map(|id| vec![("taskId", id.to_string())]).unwrap_or_default()
}

fn not_found_as(err: Error, missing: impl FnOnce() -> Error) -> Error {
    match err {
        Error::Status { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => missing(),
        other => other,
    }
}

#[async_trait]
impl ExecutionApi for HttpApi {
    async fn execution(&self, execution_id: &str) -> Result<Execution> {
        self.get_json(self.url(&["v2", "execution", execution_id], &[])).await
            .map_err(|e| not_found_as(e, || Error::ExecutionNotFound(execution_id.to_string())))
    }

    async fn tasks(&self, execution_id: &str) -> Result<Vec<TaskResult>> {
        self.get_json(self.url(&["v2", "execution", execution_id, "tasks"], &[])).await
    }

    async fn fork_input(&self, execution_id: &str, reference: &str, task_id: &str) -> Result<ForkTaskInput> {
        let url = self.url(
            &["v2", "execution", execution_id, "task", reference, "input"],
            &task_query(Some(task_id)),
        );
        self.get_json(url).await
    }

    async fn workflow_def(&self, name: &str, version: Option<u32>) -> Result<WorkflowDef> {
        let query: Vec<(&str, String)> = version.map(|v| vec![("version", v.to_string())]).unwrap_or_default();
        self.get_json(self.url(&["metadata", "workflow", name], &query)).await
            .map_err(|e| not_found_as(e, || Error::DefinitionNotFound(name.to_string())))
    }

    async fn variables(&self, execution_id: &str) -> Result<Map<String, Value>> {
        self.get_json(self.url(&["v2", "execution", execution_id, "variables"], &[])).await
    }

    async fn input(&self, execution_id: &str) -> Result<Map<String, Value>> {
        self.get_json(self.url(&["v2", "execution", execution_id, "input"], &[])).await
    }

    async fn output(&self, execution_id: &str) -> Result<Map<String, Value>> {
        self.get_json(self.url(&["v2", "execution", execution_id, "output"], &[])).await
    }

    async fn task(&self, execution_id: &str, reference: &str, task_id: Option<&str>) -> Result<TaskResult> {
        let url = self.url(&["v2", "execution", execution_id, "task", reference], &task_query(task_id));
        self.get_json(url).await
    }

    async fn task_input(&self, execution_id: &str, reference: &str, task_id: Option<&str>) -> Result<Map<String, Value>> {
        let url = self.url(&["v2", "execution", execution_id, "task", reference, "input"], &task_query(task_id));
        self.get_json(url).await
    }

    async fn task_output(&self, execution_id: &str, reference: &str, task_id: Option<&str>) -> Result<Map<String, Value>> {
        let url = self.url(&["v2", "execution", execution_id, "task", reference, "output"], &task_query(task_id));
        self.get_json(url).await
    }
}
