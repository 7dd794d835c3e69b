//! v0.dev UI generation skill

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::{SkillDescriptor, SkillModule};
use crate::context::{SkillContext, GENERATED_DIR};
use crate::error::{ApiError, SkillError};
use crate::http::{chat_completion, ChatMessage, ChatRequest};
use crate::tool::{parse_args, Executor, ExecutorMap, ToolDefinition, ToolOutput};

pub const DESCRIPTOR: SkillDescriptor = SkillDescriptor {
    name: "v0_ui",
    tool_names: &["generate_ui"],
    summary: "Generate React/Next.js UI components with v0.dev",
};

pub const CREDENTIAL: &str = "V0_API_KEY";

const MODEL: &str = "v0-1.5-md";

static CODE_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```([A-Za-z0-9_+\-]*)[^\n]*\n(.*?)```").expect("valid code block regex")
});

static FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-]+\.[A-Za-z0-9]+$").expect("valid filename regex"));

pub fn resolve() -> Result<Box<dyn SkillModule>, SkillError> {
    Ok(Box::new(V0UiSkill))
}

pub struct V0UiSkill;

impl SkillModule for V0UiSkill {
    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new(
            "generate_ui",
            "Generate a UI component with v0.dev from a description. Optionally saves the \
             first code block under public/generated.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "Description of the component to build"
                    },
                    "framework": {
                        "type": "string",
                        "enum": ["react", "nextjs", "html"],
                        "description": "Target framework (default: nextjs)"
                    },
                    "filename": {
                        "type": "string",
                        "description": "Save the generated code as public/generated/<filename>, e.g. 'VoteButton.tsx'"
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
        executors.insert("generate_ui".to_string(), Arc::new(GenerateUi { ctx, client }));
        Ok(executors)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Framework {
    React,
    #[default]
    Nextjs,
    Html,
}

impl Framework {
    fn instructions(&self) -> &'static str {
        match self {
            Framework::React => "Use React with TypeScript and Tailwind CSS. Return a single component file.",
            Framework::Nextjs => "Use Next.js App Router with TypeScript, Tailwind CSS and shadcn/ui.",
            Framework::Html => "Use plain HTML with Tailwind CSS via CDN. Return a single HTML file.",
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateUiArgs {
    prompt: String,
    #[serde(default)]
    framework: Framework,
    #[serde(default)]
    filename: Option<String>,
}

/// A fenced code block from the model output
#[derive(Debug, Clone, PartialEq, Eq)]
struct CodeBlock {
    language: String,
    code: String,
}

fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    CODE_BLOCK_RE
        .captures_iter(text)
        .map(|caps| CodeBlock {
            language: caps[1].to_string(),
            code: caps[2].to_string(),
        })
        .filter(|block| !block.code.trim().is_empty())
        .collect()
}

pub struct GenerateUi {
    ctx: Arc<SkillContext>,
    client: Client,
}

impl GenerateUi {
    async fn run(&self, args: serde_json::Value) -> Result<String, ApiError> {
        let api_key = self.ctx.credential(CREDENTIAL)?;
        let args: GenerateUiArgs = parse_args("generate_ui", args)?;

        let prompt = args.prompt.trim();
        if prompt.is_empty() {
            return Err(ApiError::InvalidArguments("prompt must not be empty".to_string()));
        }

        if let Some(name) = &args.filename {
            if !FILENAME_RE.is_match(name) {
                return Err(ApiError::InvalidArguments(format!(
                    "invalid filename '{}': use a plain file name like 'VoteButton.tsx'",
                    name
                )));
            }
        }

        let request = ChatRequest {
            model: MODEL.to_string(),
            messages: vec![
                ChatMessage::system(args.framework.instructions()),
                ChatMessage::user(prompt),
            ],
            search_parameters: None,
        };

        let url = format!(
            "{}/v1/chat/completions",
            self.ctx.endpoints().v0.trim_end_matches('/')
        );
        debug!(framework = ?args.framework, "Requesting v0 component");

        let response = chat_completion(&self.client, &url, &api_key, &request).await?;
        let content = response
            .content()
            .ok_or_else(|| ApiError::EmptyResponse("v0 returned no content".to_string()))?;

        let blocks = extract_code_blocks(content);
        let mut output = format!(
            "UI generated successfully!\nCode blocks: {}\n",
            blocks.len()
        );

        if let Some(name) = &args.filename {
            let block = blocks.first().ok_or_else(|| {
                ApiError::EmptyResponse("v0 response contained no code block to save".to_string())
            })?;
            let dir = self.ctx.generated_dir();
            tokio::fs::create_dir_all(&dir).await?;
            let path = dir.join(name);
            tokio::fs::write(&path, &block.code).await?;
            info!(path = %path.display(), language = %block.language, "Component written");
            output.push_str(&format!("Saved: {}/{}\n", GENERATED_DIR, name));
        }

        output.push('\n');
        output.push_str(content.trim());
        Ok(output)
    }
}

#[async_trait]
impl Executor for GenerateUi {
    async fn execute(&self, args: serde_json::Value) -> ToolOutput {
        self.run(args).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Endpoints, StaticCredentials};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE: &str = "Here is your button:\n\n```tsx filename=\"VoteButton.tsx\"\nexport function VoteButton() {\n  return <button>Vote</button>\n}\n```\n\nAnd styles:\n```css\n.btn { color: red; }\n```\n";

    fn executor(dir: &std::path::Path, base: &str) -> GenerateUi {
        let ctx = Arc::new(
            SkillContext::new(dir)
                .with_credentials(Arc::new(StaticCredentials::new().with(CREDENTIAL, "v0-key")))
                .with_endpoints(Endpoints::uniform(base)),
        );
        GenerateUi {
            client: ctx.http_client().unwrap(),
            ctx,
        }
    }

    async fn mock_v0(server: &MockServer, content: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"model": MODEL})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": content}}]
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_extract_code_blocks() {
        let blocks = extract_code_blocks(SAMPLE);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language, "tsx");
        assert!(blocks[0].code.starts_with("export function VoteButton()"));
        assert_eq!(blocks[1].language, "css");
    }

    #[test]
    fn test_extract_ignores_empty_blocks() {
        assert!(extract_code_blocks("```\n\n```").is_empty());
        assert!(extract_code_blocks("no code here").is_empty());
    }

    #[tokio::test]
    async fn test_generate_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        mock_v0(&server, SAMPLE).await;

        let tool = executor(dir.path(), &server.uri());
        let output = tool.execute(json!({"prompt": "a vote button"})).await.into_string();

        assert!(output.starts_with("UI generated successfully!"));
        assert!(output.contains("Code blocks: 2"));
        assert!(!output.contains("Saved:"));
        assert!(!dir.path().join("public").exists());
    }

    #[tokio::test]
    async fn test_generate_saves_first_block() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        mock_v0(&server, SAMPLE).await;

        let tool = executor(dir.path(), &server.uri());
        let output = tool
            .execute(json!({"prompt": "a vote button", "filename": "VoteButton.tsx"}))
            .await
            .into_string();

        assert!(output.contains("Saved: public/generated/VoteButton.tsx"));
        let saved =
            std::fs::read_to_string(dir.path().join("public/generated/VoteButton.tsx")).unwrap();
        assert!(saved.contains("<button>Vote</button>"));
        assert!(!saved.contains(".btn"));
    }

    #[tokio::test]
    async fn test_save_without_code_block_fails() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        mock_v0(&server, "Sorry, I can only describe it.").await;

        let tool = executor(dir.path(), &server.uri());
        let output = tool
            .execute(json!({"prompt": "x", "filename": "X.tsx"}))
            .await;
        assert!(output.is_error());
        assert!(output.to_string().contains("no code block"));
    }

    #[tokio::test]
    async fn test_blank_prompt_makes_no_request() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let tool = executor(dir.path(), &server.uri());
        let output = tool.execute(json!({"prompt": "   "})).await;
        assert_eq!(output.into_string(), "Error: prompt must not be empty");
    }

    #[tokio::test]
    async fn test_bad_filename() {
        let dir = tempfile::tempdir().unwrap();
        let tool = executor(dir.path(), "http://127.0.0.1:9");
        let output = tool
            .execute(json!({"prompt": "x", "filename": "../x.tsx"}))
            .await;
        assert!(output.to_string().starts_with("Error: invalid filename"));
    }
}
