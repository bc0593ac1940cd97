use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::images::ImagePayload;
use crate::prompts::{NESTING_PROMPT, PLACEMENT_PROMPT};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

type Result<T> = std::result::Result<T, ModelError>;

/// Input block of a composition prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionInput {
    pub prompt: String,

    /// `[previous frame result, current source image]`
    pub image_input: Vec<String>,
    pub size: String,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: String,
    pub max_images: u32,
    pub sequential_image_generation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionRequest {
    /// Model identifier
    pub version: String,
    pub input: CompositionInput,
}

impl CompositionRequest {
    /// Nest `prior` inside `current` with the fixed prompt and canvas settings
    pub fn nesting(config: &ModelConfig, prior: &ImagePayload, current: &ImagePayload) -> Self {
        Self {
            version: config.composition_model.clone(),
            input: CompositionInput {
                prompt: NESTING_PROMPT.to_string(),
                image_input: vec![prior.data_url.clone(), current.data_url.clone()],
                size: config.size.clone(),
                width: config.width,
                height: config.height,
                aspect_ratio: config.aspect_ratio.clone(),
                max_images: config.max_outputs,
                sequential_image_generation: "auto".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisInput {
    pub prompt: String,

    /// `[searched image, composite]`
    pub image_input: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub model: String,
    pub input: AnalysisInput,
}

impl AnalysisRequest {
    /// Locate `searched` within `composite` with the fixed bounding-box prompt
    pub fn placement(config: &ModelConfig, searched: &ImagePayload, composite: &ImagePayload) -> Self {
        Self {
            model: config.analysis_model.clone(),
            input: AnalysisInput {
                prompt: PLACEMENT_PROMPT.to_string(),
                image_input: vec![searched.data_url.clone(), composite.data_url.clone()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    #[serde(default)]
    output: Value,
}

/// Image-to-image composition service
#[async_trait]
pub trait CompositionModel: Send + Sync {
    /// Returns the reference (URL) of the first generated image
    async fn composite(&self, request: &CompositionRequest) -> Result<String>;
}

/// Vision-language analysis service
#[async_trait]
pub trait AnalysisModel: Send + Sync {
    /// Returns the raw text output, array outputs joined with newlines
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String>;
}

/// Bearer-authenticated client for a create-and-wait prediction endpoint.
/// Serves both model roles.
#[derive(Clone)]
pub struct ReplicateClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl ReplicateClient {
    pub fn new(config: &ModelConfig, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(config.call_timeout()).build()?;
        Ok(Self::with_client(client, config.endpoint.clone(), token))
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    async fn predict<T: Serialize + ?Sized>(&self, body: &T) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let prediction: PredictionResponse = response.json().await?;
        Ok(prediction.output)
    }
}

#[async_trait]
impl CompositionModel for ReplicateClient {
    async fn composite(&self, request: &CompositionRequest) -> Result<String> {
        let output = self.predict(request).await?;
        first_output(&output).ok_or_else(|| ModelError::EmptyOutput(request.version.clone()))
    }
}

#[async_trait]
impl AnalysisModel for ReplicateClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String> {
        let output = self.predict(request).await?;
        output_text(&output)
    }
}

fn first_output(output: &Value) -> Option<String> {
    match output {
        Value::Array(items) => items
            .first()
            .and_then(Value::as_str)
            .filter(|item| !item.is_empty())
            .map(str::to_string),
        Value::String(item) if !item.is_empty() => Some(item.clone()),
        _ => None,
    }
}

fn output_text(output: &Value) -> Result<String> {
    match output {
        Value::String(text) => Ok(text.clone()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ModelError::Malformed(format!("non-text output element {item}")))
            })
            .collect::<Result<Vec<_>>>()
            .map(|parts| parts.join("\n")),
        Value::Null => Err(ModelError::EmptyOutput("analysis".to_string())),
        other => Err(ModelError::Malformed(format!("unexpected output {other}"))),
    }
}
