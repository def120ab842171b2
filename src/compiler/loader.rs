use anyhow::{Result, Context as AnyhowContext};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use crate::dsl::WorkflowDef;
use crate::runtime::storage::Fixture;

fn load<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read file {}", file_path.display()))?;

    let is_json = file_path.extension().and_then(|e| e.to_str()) == Some("json");
    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to deserialize JSON content from {}", file_path.display()))
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to deserialize YAML content from {}", file_path.display()))
    }
}

/// Loads a workflow definition from a `.json` or YAML file.
pub fn load_workflow_def(file_path: &Path) -> Result<WorkflowDef> {
    load(file_path)
}

pub fn load_fixture(file_path: &Path) -> Result<Fixture> {
    load(file_path)
}
