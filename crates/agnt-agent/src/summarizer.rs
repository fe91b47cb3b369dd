//! A [`agnt_context::Summarizer`] backed by the real streaming transport,
//! issuing the dedicated summarization completion at a low temperature.

use agnt_context::Summarizer;
use agnt_llm::request::{request, Message};
use agnt_stream::{stream_once, DecodeCallbacks, ProviderConfig};

const SUMMARY_SYSTEM_PROMPT: &str = "You are summarizing an in-progress coding session. \
Create a concise summary that preserves all important context, decisions made, files \
modified, errors encountered, and current task status.";

const SUMMARY_TEMPERATURE: f32 = 0.3;

pub struct StreamSummarizer {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl StreamSummarizer {
    pub fn new(client: reqwest::Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }
}

impl Summarizer for StreamSummarizer {
    async fn summarize(&self, model: &str, transcript: &str) -> agnt_context::Result<String> {
        let generate_request = request()
            .model(model)
            .messages(vec![
                Message::system(SUMMARY_SYSTEM_PROMPT),
                Message::user(transcript),
            ])
            .temperature(SUMMARY_TEMPERATURE)
            .build();

        let turn = stream_once(
            &self.client,
            &self.config,
            &generate_request,
            false,
            DecodeCallbacks::default(),
        )
        .await
        .map_err(|e| agnt_context::Error::Summarize(e.to_string()))?;

        Ok(turn.content)
    }
}
