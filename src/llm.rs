use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::{multipart::Form, Client, Response};
use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("input file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("recommendation service unavailable: {0}")]
    Http(String),
    #[error("recommendation service returned HTTP {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("recommendation response had no text output")]
    EmptyResponse,
}

const FILE_PURPOSE: &str = "user_data";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const INSTRUCTION: &str = "I would like you to look through the list of events below and pick out ones I might find interesting. To help, I have filled out a document describing the kinds of things I am interested in and anything else that might matter when choosing an event to go to. The events come from an events calendar near me.";

pub struct Recommender {
    model: String,
    base_url: String,
    api_key: String,
    client: Client,
}

impl Recommender {
    pub fn from_config(config: &AppConfig, api_key: &str) -> Result<Self, RecommendError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| RecommendError::Http(err.to_string()))?;
        Ok(Self {
            model: config.llm_model.clone(),
            base_url: config.llm_endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    /// Uploads both documents and asks the model which events match the interests.
    pub fn recommend(&self, events: &Path, interests: &Path) -> Result<String, RecommendError> {
        for path in [events, interests] {
            if !path.is_file() {
                return Err(RecommendError::MissingFile(path.to_path_buf()));
            }
        }

        let events_id = self.upload_file(events)?;
        let interests_id = self.upload_file(interests)?;
        info!("uploaded events ({events_id}) and interests ({interests_id})");

        let payload = json!({
            "model": self.model,
            "input": [
                {
                    "role": "user",
                    "content": [
                        { "type": "input_text", "text": INSTRUCTION },
                        { "type": "input_file", "file_id": interests_id },
                        { "type": "input_file", "file_id": events_id },
                    ],
                }
            ],
        });

        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .map_err(|err| RecommendError::Http(err.to_string()))?;
        let value = read_json(response)?;

        output_text(&value).ok_or(RecommendError::EmptyResponse)
    }

    fn upload_file(&self, path: &Path) -> Result<String, RecommendError> {
        debug!("uploading {}", path.display());
        let form = Form::new()
            .text("purpose", FILE_PURPOSE)
            .file("file", path)
            .map_err(|err| RecommendError::Http(err.to_string()))?;

        let response = self
            .client
            .post(format!("{}/files", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|err| RecommendError::Http(err.to_string()))?;
        let value = read_json(response)?;

        value
            .get("id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| RecommendError::Http("upload response missing file id".to_string()))
    }
}

fn read_json(response: Response) -> Result<Value, RecommendError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|err| RecommendError::Http(err.to_string()))?;
    if !status.is_success() {
        return Err(RecommendError::Api { status, body });
    }
    serde_json::from_str(&body).map_err(|err| RecommendError::Http(err.to_string()))
}

/// Joins every `output_text` part of the response's message items.
fn output_text(value: &Value) -> Option<String> {
    let direct = value
        .get("output_text")
        .and_then(|text| text.as_str())
        .map(str::trim)
        .filter(|text| !text.is_empty());
    if let Some(text) = direct {
        return Some(text.to_string());
    }

    let parts: Vec<&str> = value
        .get("output")
        .and_then(|output| output.as_array())?
        .iter()
        .filter_map(|item| item.get("content").and_then(|content| content.as_array()))
        .flatten()
        .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(|text| text.as_str()))
        .collect();

    let joined = parts.join("\n").trim().to_string();
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}
