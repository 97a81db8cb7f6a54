//! Advisory executive summary from a generative text service.
//!
//! The report never depends on this module: every failure collapses into a
//! fixed message via [`advisory_summary`].

use crate::domain::model::StockItem;
use crate::domain::ports::Summarizer;
use crate::utils::error::ServiceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SUMMARY_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_SUMMARY_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_SUMMARY_LANGUAGE: &str = "Spanish";
pub const DEFAULT_TOP_ITEMS: usize = 10;

pub const EMPTY_SUMMARY_MESSAGE: &str = "No insights could be generated at this time.";
pub const SUMMARY_FAILURE_MESSAGE: &str = "Could not reach the AI service for the analysis.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct PromptItem<'a> {
    name: &'a str,
    cd_stock: f64,
}

/// Prompt for the top `top_items` entries of an already sorted report.
pub fn build_prompt(items: &[StockItem], top_items: usize, language: &str) -> String {
    let sample: Vec<PromptItem> = items
        .iter()
        .take(top_items)
        .map(|item| PromptItem {
            name: &item.name,
            cd_stock: item.cd_stock,
        })
        .collect();
    let sample_json = serde_json::to_string_pretty(&sample).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Analyse the following list of products that have stock in the Distribution Center (CD) \
but are NOT published or have no stock on the website.\n\
There are {total} products in this situation in total.\n\n\
Here are the top {shown} by stock volume:\n{sample_json}\n\n\
Please write a short executive summary (at most 3 paragraphs) in {language} covering:\n\
1. The potential impact of not having these products online.\n\
2. A strategic recommendation on how to prioritise listing these products.\n\
3. A professional and motivating tone for the e-commerce team.\n\n\
Use Markdown formatting.",
        total = items.len(),
        shown = sample.len(),
    )
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Clone)]
pub struct GeminiSummarizer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    language: String,
    top_items: usize,
}

impl GeminiSummarizer {
    pub fn new(endpoint: &str, model: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            language: DEFAULT_SUMMARY_LANGUAGE.to_string(),
            top_items: DEFAULT_TOP_ITEMS,
        }
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn with_top_items(mut self, top_items: usize) -> Self {
        self.top_items = top_items;
        self
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl Summarizer for GeminiSummarizer {
    async fn summarize(&self, items: &[StockItem]) -> Result<String, ServiceError> {
        let prompt = build_prompt(items, self.top_items, &self.language);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        tracing::debug!("Requesting summary from: {}", self.url());
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Summary response status: {}", status);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(text)
    }
}

/// Runs the summarizer and maps every outcome to displayable text.
pub async fn advisory_summary(summarizer: &dyn Summarizer, items: &[StockItem]) -> String {
    match summarizer.summarize(items).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => EMPTY_SUMMARY_MESSAGE.to_string(),
        Err(e) => {
            tracing::warn!("⚠️ Summary service failed: {}", e);
            SUMMARY_FAILURE_MESSAGE.to_string()
        }
    }
}
