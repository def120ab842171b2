use thiserror::Error;

const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("fork input for {reference} (task {task_id}) unavailable: {source}")]
    ForkInput {
        reference: String,
        task_id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("execution not found: {0}")]
    ExecutionNotFound(String),

    #[error("workflow definition not found: {0}")]
    DefinitionNotFound(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn status(url: String, status: u16, body: &str) -> Self {
        Error::Status {
            url,
            status,
            body: preview_body(body),
        }
    }
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    if trimmed.len() <= BODY_PREVIEW_LIMIT {
        return trimmed.to_string();
    }
    let mut end = BODY_PREVIEW_LIMIT;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}
