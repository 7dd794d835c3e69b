//! X account and token analysis with Grok (xAI)
//!
//! Both tools ask Grok for a structured assessment backed by live X search
//! and lift the sentiment and risk lines out of the answer so the agent can
//! act on them without re-reading the full text.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::{SkillDescriptor, SkillModule};
use crate::context::SkillContext;
use crate::error::{ApiError, SkillError};
use crate::http::{chat_completion, ChatMessage, ChatRequest};
use crate::tool::{parse_args, Executor, ExecutorMap, ToolDefinition, ToolOutput};

pub const DESCRIPTOR: SkillDescriptor = SkillDescriptor {
    name: "xai_analysis",
    tool_names: &["analyze_account", "analyze_token"],
    summary: "Assess X accounts and crypto tokens (sentiment, risk) with Grok live search",
};

pub const CREDENTIAL: &str = "XAI_API_KEY";

const MODEL: &str = "grok-4";

const ANALYST_PROMPT: &str = "You are a crypto community analyst. Be factual and skeptical. \
End your answer with two lines exactly in this form:\n\
Sentiment: <bullish|bearish|neutral|mixed>\n\
Risk: <0-10>/10";

static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{1,15}$").expect("valid handle regex"));

static SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{1,12}$").expect("valid symbol regex"));

static SENTIMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)sentiment[\s*]*[:\-][\s*]*(bullish|bearish|neutral|mixed|positive|negative)")
        .expect("valid sentiment regex")
});

static RISK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)risk(?:\s*(?:score|level))?[\s*]*[:\-][\s*]*(\d+(?:\.\d+)?)\s*/\s*10")
        .expect("valid risk regex")
});

pub fn resolve() -> Result<Box<dyn SkillModule>, SkillError> {
    Ok(Box::new(XaiAnalysisSkill))
}

pub struct XaiAnalysisSkill;

impl SkillModule for XaiAnalysisSkill {
    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "analyze_account",
                "Analyze an X (Twitter) account: what it posts about, engagement, \
                 credibility and overall sentiment.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "handle": {
                            "type": "string",
                            "description": "X handle, with or without '@'"
                        },
                        "focus": {
                            "type": "string",
                            "enum": ["overview", "sentiment", "engagement", "crypto"],
                            "description": "Aspect to focus on (default: overview)"
                        }
                    },
                    "required": ["handle"]
                }),
            ),
            ToolDefinition::new(
                "analyze_token",
                "Analyze a crypto token: community buzz on X, recent news, red flags and a 0-10 risk score.",
                serde_json::json!({
                    "type": "object",
                    "properties": {
                        "symbol": {
                            "type": "string",
                            "description": "Ticker symbol, with or without '$' (e.g. 'BONK')"
                        },
                        "chain": {
                            "type": "string",
                            "enum": ["solana", "ethereum", "base", "bsc"],
                            "description": "Chain the token lives on, if known"
                        }
                    },
                    "required": ["symbol"]
                }),
            ),
        ]
    }

    fn create_executors(&self, ctx: Arc<SkillContext>) -> Result<ExecutorMap, SkillError> {
        let client = ctx
            .http_client()
            .map_err(|e| SkillError::load(DESCRIPTOR.name, e.to_string()))?;
        let analyst = Arc::new(Analyst { ctx, client });

        let mut executors = ExecutorMap::new();
        executors.insert(
            "analyze_account".to_string(),
            Arc::new(AnalyzeAccount(Arc::clone(&analyst))),
        );
        executors.insert("analyze_token".to_string(), Arc::new(AnalyzeToken(analyst)));
        Ok(executors)
    }
}

/// Sentiment and risk lifted from an analysis
#[derive(Debug, Clone, PartialEq)]
struct Signals {
    sentiment: Option<String>,
    risk: Option<f32>,
}

fn extract_signals(text: &str) -> Signals {
    Signals {
        sentiment: SENTIMENT_RE
            .captures(text)
            .map(|c| c[1].to_lowercase()),
        risk: RISK_RE
            .captures(text)
            .and_then(|c| c[1].parse::<f32>().ok())
            .filter(|r| (0.0..=10.0).contains(r)),
    }
}

impl Signals {
    fn summary_line(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(sentiment) = &self.sentiment {
            parts.push(format!("**Sentiment:** {}", sentiment));
        }
        if let Some(risk) = self.risk {
            parts.push(format!("**Risk:** {}/10", risk));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}

fn normalize_handle(raw: &str) -> Result<String, ApiError> {
    let handle = raw.trim().trim_start_matches('@');
    if HANDLE_RE.is_match(handle) {
        Ok(handle.to_string())
    } else {
        Err(ApiError::InvalidArguments(format!("invalid X handle '{}'", raw)))
    }
}

fn normalize_symbol(raw: &str) -> Result<String, ApiError> {
    let symbol = raw.trim().trim_start_matches('$').to_uppercase();
    if SYMBOL_RE.is_match(&symbol) {
        Ok(symbol)
    } else {
        Err(ApiError::InvalidArguments(format!("invalid token symbol '{}'", raw)))
    }
}

/// Shared client for both tools
struct Analyst {
    ctx: Arc<SkillContext>,
    client: Client,
}

impl Analyst {
    async fn analyze(
        &self,
        title: String,
        question: String,
        search_parameters: serde_json::Value,
    ) -> Result<String, ApiError> {
        let api_key = self.ctx.credential(CREDENTIAL)?;

        let request = ChatRequest {
            model: MODEL.to_string(),
            messages: vec![ChatMessage::system(ANALYST_PROMPT), ChatMessage::user(question)],
            search_parameters: Some(search_parameters),
        };
        let url = format!(
            "{}/v1/chat/completions",
            self.ctx.endpoints().xai.trim_end_matches('/')
        );
        debug!(%title, "Requesting Grok analysis");

        let response = chat_completion(&self.client, &url, &api_key, &request).await?;
        let content = response
            .content()
            .ok_or_else(|| ApiError::EmptyResponse("Grok returned no analysis".to_string()))?;

        let mut output = format!("## {}\n\n", title);
        if let Some(line) = extract_signals(content).summary_line() {
            output.push_str(&line);
            output.push_str("\n\n");
        }
        output.push_str(content.trim());
        Ok(output)
    }
}

#[derive(Debug, Deserialize)]
struct AccountArgs {
    handle: String,
    #[serde(default = "default_focus")]
    focus: String,
}

fn default_focus() -> String {
    "overview".to_string()
}

pub struct AnalyzeAccount(Arc<Analyst>);

impl AnalyzeAccount {
    async fn run(&self, args: serde_json::Value) -> Result<String, ApiError> {
        // Credential first so a missing key reports before argument details
        self.0.ctx.credential(CREDENTIAL)?;
        let args: AccountArgs = parse_args("analyze_account", args)?;
        let handle = normalize_handle(&args.handle)?;

        let question = format!(
            "Analyze the X account @{} with a focus on {}. Summarize recent posts, \
             audience engagement and whether it looks credible or like a shill/bot account.",
            handle, args.focus
        );
        let search = serde_json::json!({
            "mode": "on",
            "sources": [{"type": "x", "included_x_handles": [handle]}],
            "return_citations": true
        });

        self.0
            .analyze(format!("Account analysis: @{}", handle), question, search)
            .await
    }
}

#[async_trait]
impl Executor for AnalyzeAccount {
    async fn execute(&self, args: serde_json::Value) -> ToolOutput {
        self.run(args).await.into()
    }
}

#[derive(Debug, Deserialize)]
struct TokenArgs {
    symbol: String,
    #[serde(default)]
    chain: Option<String>,
}

pub struct AnalyzeToken(Arc<Analyst>);

impl AnalyzeToken {
    async fn run(&self, args: serde_json::Value) -> Result<String, ApiError> {
        self.0.ctx.credential(CREDENTIAL)?;
        let args: TokenArgs = parse_args("analyze_token", args)?;
        let symbol = normalize_symbol(&args.symbol)?;

        let chain = args
            .chain
            .as_deref()
            .map(|c| format!(" on {}", c))
            .unwrap_or_default();
        let question = format!(
            "Analyze the crypto token ${}{}. Cover community buzz on X, recent news, \
             liquidity or rug-pull red flags, and give a risk score.",
            symbol, chain
        );
        let search = serde_json::json!({
            "mode": "on",
            "sources": [{"type": "x"}, {"type": "web"}, {"type": "news"}],
            "return_citations": true
        });

        self.0
            .analyze(format!("Token analysis: ${}{}", symbol, chain), question, search)
            .await
    }
}

#[async_trait]
impl Executor for AnalyzeToken {
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

    fn analyst(base: &str, key: Option<&str>) -> Arc<Analyst> {
        let mut creds = StaticCredentials::new();
        if let Some(key) = key {
            creds = creds.with(CREDENTIAL, key);
        }
        let ctx = Arc::new(
            SkillContext::new(std::env::temp_dir())
                .with_credentials(Arc::new(creds))
                .with_endpoints(Endpoints::uniform(base)),
        );
        Arc::new(Analyst {
            client: ctx.http_client().unwrap(),
            ctx,
        })
    }

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("@elonmusk").unwrap(), "elonmusk");
        assert_eq!(normalize_handle(" pepe_coin ").unwrap(), "pepe_coin");
        assert!(normalize_handle("has space").is_err());
        assert!(normalize_handle("@waytoolonghandle123").is_err());
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("$bonk").unwrap(), "BONK");
        assert_eq!(normalize_symbol("WIF").unwrap(), "WIF");
        assert!(normalize_symbol("not-a-symbol").is_err());
    }

    #[test]
    fn test_extract_signals() {
        let text = "Lots of hype.\nSentiment: Bullish\nRisk: 7/10";
        assert_eq!(
            extract_signals(text),
            Signals {
                sentiment: Some("bullish".to_string()),
                risk: Some(7.0)
            }
        );

        let bold = "**Sentiment:** **neutral**\n**Risk Score:** 3.5 / 10";
        let signals = extract_signals(bold);
        assert_eq!(signals.sentiment.as_deref(), Some("neutral"));
        assert_eq!(signals.risk, Some(3.5));

        let none = extract_signals("nothing structured here");
        assert_eq!(none.summary_line(), None);
    }

    #[test]
    fn test_out_of_range_risk_ignored() {
        assert_eq!(extract_signals("Risk: 42/10").risk, None);
    }

    #[tokio::test]
    async fn test_analyze_account() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": MODEL,
                "search_parameters": {"sources": [{"type": "x", "included_x_handles": ["pepe_coin"]}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant",
                    "content": "Posts memes daily.\nSentiment: mixed\nRisk: 4/10"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = AnalyzeAccount(analyst(&server.uri(), Some("xai-key")));
        let output = tool
            .execute(json!({"handle": "@pepe_coin"}))
            .await
            .into_string();

        assert!(output.starts_with("## Account analysis: @pepe_coin"));
        assert!(output.contains("**Sentiment:** mixed | **Risk:** 4/10"));
        assert!(output.contains("Posts memes daily."));
    }

    #[tokio::test]
    async fn test_analyze_token_with_chain() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Thin liquidity."}}]
            })))
            .mount(&server)
            .await;

        let tool = AnalyzeToken(analyst(&server.uri(), Some("xai-key")));
        let output = tool
            .execute(json!({"symbol": "$wif", "chain": "solana"}))
            .await
            .into_string();

        assert!(output.starts_with("## Token analysis: $WIF on solana"));
        assert!(output.ends_with("Thin liquidity."));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let tool = AnalyzeToken(analyst("http://127.0.0.1:9", None));
        let output = tool.execute(json!({"symbol": "BONK"})).await;
        assert_eq!(output.into_string(), "Error: XAI_API_KEY not configured in .env");
    }

    #[tokio::test]
    async fn test_invalid_handle_is_soft_error() {
        let tool = AnalyzeAccount(analyst("http://127.0.0.1:9", Some("k")));
        let output = tool.execute(json!({"handle": "not a handle"})).await;
        assert_eq!(output.into_string(), "Error: invalid X handle 'not a handle'");
    }
}
