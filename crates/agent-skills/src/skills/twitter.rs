//! Twitter (X) posting skill
//!
//! Posts through the v2 `tweets` endpoint with a user-context bearer token.
//! Successful posts are recorded through the context's devlog writer.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::{SkillDescriptor, SkillModule};
use crate::context::SkillContext;
use crate::devlog::DevlogEntry;
use crate::error::{ApiError, SkillError};
use crate::http::send_json;
use crate::tool::{parse_args, Executor, ExecutorMap, ToolDefinition, ToolOutput};

pub const DESCRIPTOR: SkillDescriptor = SkillDescriptor {
    name: "twitter",
    tool_names: &["post_tweet"],
    summary: "Post tweets (and replies) to the community X account",
};

pub const CREDENTIAL: &str = "TWITTER_ACCESS_TOKEN";

/// Maximum tweet length in characters
pub const MAX_TWEET_CHARS: usize = 280;

pub fn resolve() -> Result<Box<dyn SkillModule>, SkillError> {
    Ok(Box::new(TwitterSkill))
}

pub struct TwitterSkill;

impl SkillModule for TwitterSkill {
    fn tools(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new(
            "post_tweet",
            "Post a tweet from the community account. Use reply_to to answer an existing tweet.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "Tweet text",
                        "maxLength": MAX_TWEET_CHARS
                    },
                    "reply_to": {
                        "type": "string",
                        "description": "ID of the tweet to reply to"
                    }
                },
                "required": ["text"]
            }),
        )]
    }

    fn create_executors(&self, ctx: Arc<SkillContext>) -> Result<ExecutorMap, SkillError> {
        let client = ctx
            .http_client()
            .map_err(|e| SkillError::load(DESCRIPTOR.name, e.to_string()))?;

        let mut executors = ExecutorMap::new();
        executors.insert("post_tweet".to_string(), Arc::new(PostTweet { ctx, client }));
        Ok(executors)
    }
}

#[derive(Debug, Deserialize)]
struct PostTweetArgs {
    text: String,
    #[serde(default)]
    reply_to: Option<String>,
}

#[derive(Debug, Serialize)]
struct TweetRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplySettings<'a>>,
}

#[derive(Debug, Serialize)]
struct ReplySettings<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: Option<TweetData>,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

pub struct PostTweet {
    ctx: Arc<SkillContext>,
    client: Client,
}

impl PostTweet {
    async fn run(&self, args: serde_json::Value) -> Result<String, ApiError> {
        let token = self.ctx.credential(CREDENTIAL)?;
        let args: PostTweetArgs = parse_args("post_tweet", args)?;

        // Posted as given; the length rule matches the schema's maxLength
        let text = args.text.as_str();
        if text.trim().is_empty() {
            return Err(ApiError::InvalidArguments("tweet text must not be empty".to_string()));
        }
        let length = text.chars().count();
        if length > MAX_TWEET_CHARS {
            return Err(ApiError::InvalidArguments(format!(
                "tweet is {} characters long (max {})",
                length, MAX_TWEET_CHARS
            )));
        }

        let reply_to = args.reply_to.as_deref().map(str::trim).filter(|id| !id.is_empty());
        if let Some(id) = reply_to {
            if !id.chars().all(|c| c.is_ascii_digit()) {
                return Err(ApiError::InvalidArguments(format!("invalid tweet id '{}'", id)));
            }
        }

        let body = TweetRequest {
            text,
            reply: reply_to.map(|id| ReplySettings {
                in_reply_to_tweet_id: id,
            }),
        };
        let url = format!("{}/2/tweets", self.ctx.endpoints().twitter.trim_end_matches('/'));

        let response: TweetResponse =
            send_json(self.client.post(&url).bearer_auth(&token).json(&body)).await?;
        let id = response
            .data
            .map(|d| d.id)
            .ok_or_else(|| ApiError::EmptyResponse("Twitter returned no tweet id".to_string()))?;

        let status_url = format!("https://x.com/i/web/status/{}", id);
        info!(%id, reply = reply_to.is_some(), "Tweet posted");

        if let Some(writer) = self.ctx.writer() {
            let title = if reply_to.is_some() { "Replied on X" } else { "Posted on X" };
            let entry = DevlogEntry::new(title, format!("{}\n\n{}", text, status_url))
                .with_tag("twitter");
            if let Err(e) = writer.append(&entry).await {
                warn!(error = %e, "Failed to record tweet in devlog");
            }
        }

        Ok(format!(
            "Tweet posted successfully!\nID: {}\nURL: {}",
            id, status_url
        ))
    }
}

#[async_trait]
impl Executor for PostTweet {
    async fn execute(&self, args: serde_json::Value) -> ToolOutput {
        self.run(args).await.into()
    }
}
