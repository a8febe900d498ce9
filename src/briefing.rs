// src/briefing.rs
//! Daily briefing: recent records -> short LLM summary.
//! Every failure degrades to a fixed fallback text; nothing here can stall ingestion.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ai::BriefingConfig;
use crate::ingest::types::CanonicalRecord;

pub const NO_RECENT_EVENTS: &str = "No significant events in the last 24 hours.";
pub const UNAVAILABLE: &str = "AI Briefing unavailable: API configuration issue";
pub const QUOTA_FALLBACK: &str = "Strategic briefing temporarily unavailable. Please check back later.";
pub const RATE_LIMIT_FALLBACK: &str =
    "Strategic briefing generation paused. Please refresh in a few minutes.";
pub const ERROR_FALLBACK: &str =
    "Strategic briefing system encountered an issue. Using static analysis mode.";

const DESCRIPTION_CHARS: usize = 200;
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum BriefingError {
    #[error("summarizer not configured")]
    Unavailable,
    #[error("quota exhausted")]
    Quota,
    #[error("rate limited")]
    RateLimited,
    #[error("summarizer request failed: {0}")]
    Request(String),
}

impl BriefingError {
    fn fallback(&self) -> &'static str {
        match self {
            Self::Unavailable => UNAVAILABLE,
            Self::Quota => QUOTA_FALLBACK,
            Self::RateLimited => RATE_LIMIT_FALLBACK,
            Self::Request(_) => ERROR_FALLBACK,
        }
    }
}

/// Text summarizer behind the briefing.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, events_text: &str) -> Result<String, BriefingError>;
    fn name(&self) -> &'static str;
}

pub type DynSummarizer = Arc<dyn Summarizer>;

/// Always unavailable; used when the briefing is switched off.
pub struct DisabledSummarizer;

#[async_trait]
impl Summarizer for DisabledSummarizer {
    async fn summarize(&self, _events_text: &str) -> Result<String, BriefingError> {
        Err(BriefingError::Unavailable)
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// OpenAI Chat Completions.
pub struct OpenAiSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiSummarizer {
    pub fn new(api_key: &str, model: &str) -> Result<Self, BriefingError> {
        let http = reqwest::Client::builder()
            .user_agent(crate::ingest::transport::USER_AGENT)
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BriefingError::Request(e.to_string()))?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
        })
    }

    async fn call(&self, events_text: &str) -> Result<String, BriefingError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let sys = "You are a Space Force intelligence analyst providing concise, professional \
                   briefings. Focus on key developments, emerging patterns, and strategic \
                   implications. Use clear, military-style communication.";
        let user = format!(
            "Generate a brief, strategic analysis of these Space Force related events from the last 24 hours:\n\n{events_text}"
        );
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: sys,
                },
                Msg {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.7,
            max_tokens: 500,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| BriefingError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(if body.contains("insufficient_quota") {
                BriefingError::Quota
            } else if status.as_u16() == 429 || body.contains("rate_limit") {
                BriefingError::RateLimited
            } else {
                BriefingError::Request(format!("status {status}"))
            });
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| BriefingError::Request(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BriefingError::Request("empty completion".into()))
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, events_text: &str) -> Result<String, BriefingError> {
        let mut attempt = 1;
        loop {
            match self.call(events_text).await {
                Err(BriefingError::Quota) => return Err(BriefingError::Quota),
                Err(e) if attempt < MAX_ATTEMPTS => {
                    let pause = Duration::from_secs((2u64 << attempt).clamp(4, 10));
                    warn!(error = %e, attempt, "briefing request failed; retrying");
                    tokio::time::sleep(pause).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
    fn name(&self) -> &'static str {
        "openai"
    }
}

pub fn build_summarizer(cfg: &BriefingConfig) -> DynSummarizer {
    match (cfg.enabled, cfg.api_key.as_deref()) {
        (true, Some(key)) => match OpenAiSummarizer::new(key, &cfg.model) {
            Ok(s) => Arc::new(s),
            Err(e) => {
                warn!(error = %e, "cannot build briefing client; briefing disabled");
                Arc::new(DisabledSummarizer)
            }
        },
        _ => Arc::new(DisabledSummarizer),
    }
}

/// `- {title} ({category}) - {first 200 chars of description}...` per record.
pub fn events_text(records: &[&CanonicalRecord]) -> String {
    records
        .iter()
        .map(|r| {
            let desc: String = r.description.chars().take(DESCRIPTION_CHARS).collect();
            format!("- {} ({}) - {}...", r.title, r.category, desc)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summarize the records dated within 24 hours of `now`.
pub async fn generate_briefing(
    records: &[CanonicalRecord],
    summarizer: &dyn Summarizer,
    now: DateTime<Utc>,
) -> String {
    let cutoff = now - ChronoDuration::hours(24);
    let recent: Vec<&CanonicalRecord> = records.iter().filter(|r| r.date >= cutoff).collect();
    if recent.is_empty() {
        info!("no records in the last 24 hours; skipping briefing");
        return NO_RECENT_EVENTS.to_string();
    }

    info!(records = recent.len(), provider = summarizer.name(), "generating briefing");
    match summarizer.summarize(&events_text(&recent)).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, provider = summarizer.name(), "briefing failed; using fallback");
            e.fallback().to_string()
        }
    }
}
