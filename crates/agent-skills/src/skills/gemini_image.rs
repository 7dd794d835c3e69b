//! Gemini image generation skill
//!
//! Calls the Gemini `generateContent` endpoint with image output enabled,
//! decodes the inline base64 payload and writes it under
//! `<work_dir>/public/generated/`.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::{SkillDescriptor, SkillModule};
use crate::context::{SkillContext, GENERATED_DIR};
use crate::error::{ApiError, SkillError};
use crate::http::send_json;
use crate::tool::{parse_args, Executor, ExecutorMap, ToolDefinition, ToolOutput};

pub const DESCRIPTOR: SkillDescriptor = SkillDescriptor {
    name: "gemini_image",
    tool_names: &["generate_image"],
    summary: "Generate meme images with Google Gemini and save them to public/generated",
};

pub const CREDENTIAL: &str = "GEMINI_API_KEY";

const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
const MODELS: &[&str] = &["gemini-2.5-flash-image", "gemini-3-pro-image-preview"];
const ASPECT_RATIOS: &[&str] = &["1:1", "16:9", "9:16", "4:3", "3:4"];

pub fn resolve() -> Result<Box<dyn SkillModule>, SkillError> {
    Ok(Box::new(GeminiImageSkill))
}

pub struct GeminiImageSkill;

impl SkillModule for GeminiImageSkill {
    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new(
            "generate_image",
            "Generate an image from a text prompt using Google Gemini. The image is saved \
             under public/generated and its path is returned.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "Detailed description of the image to generate"
                    },
                    "model": {
                        "type": "string",
                        "enum": MODELS,
                        "description": "Gemini image model (default: gemini-2.5-flash-image)"
                    },
                    "filename": {
                        "type": "string",
                        "description": "Output file name, e.g. 'pepe-moon.png' (default: generated from timestamp)"
                    },
                    "aspect_ratio": {
                        "type": "string",
                        "enum": ASPECT_RATIOS,
                        "description": "Aspect ratio of the image (default: 1:1)"
                    }
                },
                "required": ["prompt"]
            }),
        )]
    }

    fn create_executors(&self, ctx: Arc<SkillContext>) -> Result<ExecutorMap, SkillError> {
        let client = ctx
            .http_client()
            .map_err(|e| SkillError::load(DESCRIPTOR.name, e.to_string()))?;

        let mut executors = ExecutorMap::new();
        executors.insert(
            "generate_image".to_string(),
            Arc::new(GenerateImage { ctx, client }),
        );
        Ok(executors)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateImageArgs {
    prompt: String,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    aspect_ratio: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Decoded image plus any text the model returned alongside it
struct GeneratedImage {
    bytes: Vec<u8>,
    mime_type: String,
    notes: Option<String>,
}

impl GenerateResponse {
    fn into_image(self) -> Result<GeneratedImage, ApiError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ApiError::EmptyResponse(format!("prompt blocked by Gemini ({})", reason)));
        }

        let parts: Vec<Part> = self
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .collect();

        let notes: Vec<&str> = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        let notes = Some(notes.join("\n").trim().to_string()).filter(|n| !n.is_empty());

        let inline = parts
            .iter()
            .find_map(|p| p.inline_data.as_ref())
            .ok_or_else(|| ApiError::EmptyResponse("no image data in Gemini response".to_string()))?;

        let bytes = STANDARD
            .decode(inline.data.trim())
            .map_err(|e| ApiError::ParseError(format!("invalid base64 image data: {}", e)))?;

        Ok(GeneratedImage {
            bytes,
            mime_type: inline.mime_type.clone(),
            notes,
        })
    }
}

/// Validate a caller-supplied file name; append `.png` when it has no extension
fn sanitize_filename(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.')
    {
        return Err(ApiError::InvalidArguments(format!(
            "invalid filename '{}': use a plain file name like 'meme.png'",
            name
        )));
    }
    if name.contains('.') {
        Ok(name.to_string())
    } else {
        Ok(format!("{}.png", name))
    }
}

fn default_filename() -> String {
    format!("meme-{}.png", Utc::now().format("%Y%m%d-%H%M%S%3f"))
}

pub struct GenerateImage {
    ctx: Arc<SkillContext>,
    client: Client,
}

impl GenerateImage {
    async fn run(&self, args: serde_json::Value) -> Result<String, ApiError> {
        let api_key = self.ctx.credential(CREDENTIAL)?;
        let args: GenerateImageArgs = parse_args("generate_image", args)?;

        if args.prompt.trim().is_empty() {
            return Err(ApiError::InvalidArguments("prompt must not be empty".to_string()));
        }
        let filename = match &args.filename {
            Some(name) => sanitize_filename(name)?,
            None => default_filename(),
        };

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(args.prompt.clone()),
                    inline_data: None,
                }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["TEXT", "IMAGE"],
                image_config: args
                    .aspect_ratio
                    .clone()
                    .map(|aspect_ratio| ImageConfig { aspect_ratio }),
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.ctx.endpoints().gemini.trim_end_matches('/'),
            args.model
        );
        debug!(model = %args.model, %filename, "Requesting Gemini image");

        let response: GenerateResponse = send_json(
            self.client
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&request),
        )
        .await?;

        let image = response.into_image()?;

        let dir = self.ctx.generated_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(&filename);
        tokio::fs::write(&path, &image.bytes).await?;

        info!(path = %path.display(), bytes = image.bytes.len(), "Image written");

        let mut output = format!(
            "Image generated successfully!\nPath: {}/{}\nSize: {} bytes\nType: {}\nModel: {}",
            GENERATED_DIR,
            filename,
            image.bytes.len(),
            image.mime_type,
            args.model
        );
        if let Some(notes) = image.notes {
            output.push_str(&format!("\nNotes: {}", notes));
        }
        Ok(output)
    }
}

#[async_trait]
impl Executor for GenerateImage {
    async fn execute(&self, args: serde_json::Value) -> ToolOutput {
        self.run(args).await.into()
    }
}
