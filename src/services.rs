//! # Feature: External Services
//!
//! Thin request/response clients for the third-party APIs the commands use:
//! AI chat completion, weather, currency rates, translation, URL shortening
//! and public IP lookup. Failures are returned as errors; nothing retries.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: AI chat moved from the openai crate to a plain chat/completions call
//! - 1.1.0: Translation via MyMemory
//! - 1.0.0: Initial release

use crate::config::Config;
use crate::models::ChatTurn;
use anyhow::{Context, Result};
use log::debug;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serenity::async_trait;
use std::collections::HashMap;
use std::time::Duration;

const WEATHER_URL: &str = "https://wttr.in/";
const RATES_URL: &str = "https://open.er-api.com/v6/latest/";
const TRANSLATE_URL: &str = "https://api.mymemory.translated.net/get";
const SHORTEN_URL: &str = "https://is.gd/create.php";
const IP_URL: &str = "https://api.ipify.org";
const QR_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Outbound collaborators used by handlers; swapped for fakes in tests
#[async_trait]
pub trait ExternalServices: Send + Sync {
    /// False when no chat backend is configured
    fn chat_available(&self) -> bool;

    /// Complete a chat given the full context, system prompt first
    async fn chat(&self, messages: &[ChatTurn]) -> Result<String>;

    /// One-line current conditions for a city
    async fn weather(&self, city: &str) -> Result<String>;

    /// Convert `amount` of `from` into `to`, both ISO 4217 codes
    async fn convert_currency(&self, amount: f64, from: &str, to: &str) -> Result<f64>;

    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;

    async fn shorten_url(&self, url: &str) -> Result<String>;

    async fn public_ip(&self) -> Result<String>;

    /// Fetch a URL and report the status; used by the keep-alive job
    async fn ping(&self, url: &str) -> Result<u16>;
}

/// Build a QR image URL for `text`; pure, no request is made
pub fn qr_code_url(text: &str) -> Result<String> {
    let url = Url::parse_with_params(QR_URL, &[("size", "300x300"), ("data", text)])?;
    Ok(url.to_string())
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct RatesResponse {
    result: String,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "responseData")]
    response_data: TranslateData,
}

#[derive(Deserialize)]
struct TranslateData {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// reqwest-backed implementation talking to the public endpoints
pub struct HttpServices {
    client: reqwest::Client,
    openai_api_key: Option<String>,
    openai_model: String,
    openai_base_url: String,
}

impl HttpServices {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("helper-bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(HttpServices {
            client,
            openai_api_key: config.openai_api_key.clone().filter(|k| !k.is_empty()),
            openai_model: config.openai_model.clone(),
            openai_base_url: config.openai_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url.host_str().unwrap_or("?")))?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("{} returned {}", url.host_str().unwrap_or("?"), status);
        }

        Ok(response.text().await?.trim().to_string())
    }
}

#[async_trait]
impl ExternalServices for HttpServices {
    fn chat_available(&self) -> bool {
        self.openai_api_key.is_some()
    }

    async fn chat(&self, messages: &[ChatTurn]) -> Result<String> {
        let api_key = self
            .openai_api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("AI chat is not configured (OPENAI_API_KEY missing)"))?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.openai_base_url))
            .bearer_auth(api_key)
            .json(&ChatRequest {
                model: &self.openai_model,
                messages,
            })
            .send()
            .await
            .context("Failed to reach the OpenAI API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, body);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI API response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("OpenAI API response had no content"))
    }

    async fn weather(&self, city: &str) -> Result<String> {
        let mut url = Url::parse(WEATHER_URL)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("weather URL cannot take a path"))?
            .push(city);
        url.query_pairs_mut().append_pair("format", "3");
        self.get_text(url).await
    }

    async fn convert_currency(&self, amount: f64, from: &str, to: &str) -> Result<f64> {
        let url = Url::parse(RATES_URL)?.join(from)?;
        let response: RatesResponse = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to reach the exchange rate API")?
            .json()
            .await
            .context("Failed to parse exchange rate response")?;

        if response.result != "success" {
            anyhow::bail!("Exchange rate lookup for {from} failed");
        }

        let rate = response
            .rates
            .get(to)
            .ok_or_else(|| anyhow::anyhow!("No exchange rate for {to}"))?;
        Ok(amount * rate)
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let langpair = format!("autodetect|{target_language}");
        let url = Url::parse_with_params(TRANSLATE_URL, &[("q", text), ("langpair", langpair.as_str())])?;
        let response: TranslateResponse = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to reach the translation API")?
            .json()
            .await
            .context("Failed to parse translation response")?;

        Ok(response.response_data.translated_text)
    }

    async fn shorten_url(&self, long_url: &str) -> Result<String> {
        let url = Url::parse_with_params(SHORTEN_URL, &[("format", "simple"), ("url", long_url)])?;
        self.get_text(url).await
    }

    async fn public_ip(&self) -> Result<String> {
        self.get_text(Url::parse(IP_URL)?).await
    }

    async fn ping(&self, url: &str) -> Result<u16> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Keep-alive ping to {url} failed"))?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_code_url_encodes_text() {
        let url = qr_code_url("hello world & more").unwrap();
        assert!(url.starts_with(QR_URL));
        assert!(url.contains("data=hello+world+%26+more"));
    }
}
