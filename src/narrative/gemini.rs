// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::TextGenerator;
use crate::{config::GeneratorConfig, error::Error};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60,);

/// Google generative language API client.
pub struct GeminiGenerator
{
    client:            Client,
    endpoint:          String,
    api_key:           String,
    temperature:       f32,
    max_output_tokens: u32,
}

impl std::fmt::Debug for GeminiGenerator
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        f.debug_struct("GeminiGenerator",).field("endpoint", &self.endpoint,).finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize,)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a,>
{
    contents:          [Content<'a,>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize,)]
struct Content<'a,>
{
    parts: [Part<'a,>; 1],
}

#[derive(Debug, Serialize,)]
struct Part<'a,>
{
    text: &'a str,
}

#[derive(Debug, Serialize,)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig
{
    temperature:       f32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize,)]
struct GenerateResponse
{
    #[serde(default)]
    candidates: Vec<Candidate,>,
}

#[derive(Debug, Deserialize,)]
struct Candidate
{
    content: Option<CandidateContent,>,
}

#[derive(Debug, Deserialize,)]
struct CandidateContent
{
    #[serde(default)]
    parts: Vec<CandidatePart,>,
}

#[derive(Debug, Deserialize,)]
struct CandidatePart
{
    text: Option<String,>,
}

impl GeminiGenerator
{
    /// Creates a client for `{base_url}/models/{model}:generateContent`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without an API key and
    /// [`Error::Service`] when the HTTP client cannot be built.
    pub fn new(config: &GeneratorConfig,) -> Result<Self, Error,>
    {
        let api_key = config.api_key.clone().ok_or_else(|| Error::validation("generator.api_key is not set",),)?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT,)
            .build()
            .map_err(|e| Error::service(format!("failed to build HTTP client: {e}"),),)?;

        Ok(Self {
            client,
            endpoint: format!("{}/models/{}:generateContent", config.base_url.trim_end_matches('/'), config.model),
            api_key,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        },)
    }

    fn request<'a,>(&self, prompt: &'a str,) -> GenerateRequest<'a,>
    {
        GenerateRequest {
            contents:          [Content {
                parts: [Part {
                    text: prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature:       self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

fn status_error(status: StatusCode, body: &str,) -> Error
{
    let message = format!("generation API returned {status}: {body}");
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Error::generation(message,)
    } else {
        Error::service(message,)
    }
}

fn extract_text(response: GenerateResponse,) -> Result<String, Error,>
{
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content,)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text,).collect(),)
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::generation("generation API returned no text",),);
    }
    Ok(text,)
}

#[async_trait]
impl TextGenerator for GeminiGenerator
{
    async fn generate(&self, prompt: &str,) -> Result<String, Error,>
    {
        debug!("Sending generation request to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint,)
            .header("x-goog-api-key", &self.api_key,)
            .json(&self.request(prompt,),)
            .send()
            .await
            .map_err(|e| Error::generation(format!("generation request failed: {e}"),),)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Generation API error: {} - {}", status, body);
            return Err(status_error(status, &body,),);
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("unreadable generation response: {e}"),),)?;
        extract_text(parsed,)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn generator() -> GeminiGenerator
    {
        let config = GeneratorConfig {
            api_key: Some("test-key".to_owned(),),
            base_url: "https://example.test/v1beta/".to_owned(),
            ..GeneratorConfig::default()
        };
        GeminiGenerator::new(&config,).expect("client builds",)
    }

    #[test]
    fn endpoint_includes_model()
    {
        assert_eq!(generator().endpoint, "https://example.test/v1beta/models/gemini-2.0-flash-exp:generateContent");
    }

    #[test]
    fn missing_api_key_is_rejected()
    {
        let error = GeminiGenerator::new(&GeneratorConfig::default(),).unwrap_err();
        assert!(matches!(error, Error::Validation { .. }));
    }

    #[test]
    fn request_body_uses_api_field_names()
    {
        let body = serde_json::to_value(generator().request("hello",),).expect("serializable request",);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn text_parts_are_concatenated()
    {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Good "},{"text":"repo."}]}}]}"#,
        )
        .expect("valid response",);
        assert_eq!(extract_text(response,).expect("text present",), "Good repo.");
    }

    #[test]
    fn empty_candidates_are_a_generation_error()
    {
        let error = extract_text(GenerateResponse::default(),).unwrap_err();
        assert!(error.is_transient());
    }

    #[test]
    fn client_errors_are_not_retried()
    {
        assert!(!status_error(StatusCode::BAD_REQUEST, "bad",).is_transient());
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "slow",).is_transient());
        assert!(status_error(StatusCode::SERVICE_UNAVAILABLE, "busy",).is_transient());
    }
}
