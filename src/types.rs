//! Shared report types

use clap::ValueEnum;
use std::fmt;

/// LLM provider a variant talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Anthropic,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
        }
    }

    /// Environment variable holding the provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is responsible for the bulletin's HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlMode {
    /// Model returns plain text; we wrap it in our own template
    SelfTemplated,
    /// Model returns a styled HTML fragment that is used as-is
    ModelTemplated,
}

/// One of the four fixed bulletin jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Variant {
    /// GPT-4o plain-text hazard list wrapped in the built-in template
    #[default]
    OpenaiPlain,
    /// GPT-4o writes the styled HTML bulletin itself
    OpenaiHtml,
    /// Claude writes the styled HTML bulletin itself
    ClaudeHtml,
    /// Claude writes the bulletin with SPC-style readiness levels
    ClaudeSpc,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::OpenaiPlain => "openai-plain",
            Variant::OpenaiHtml => "openai-html",
            Variant::ClaudeHtml => "claude-html",
            Variant::ClaudeSpc => "claude-spc",
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            Variant::OpenaiPlain | Variant::OpenaiHtml => Provider::OpenAi,
            Variant::ClaudeHtml | Variant::ClaudeSpc => Provider::Anthropic,
        }
    }

    pub fn html_mode(&self) -> HtmlMode {
        match self {
            Variant::OpenaiPlain => HtmlMode::SelfTemplated,
            _ => HtmlMode::ModelTemplated,
        }
    }

    /// Model id, token budget and sampling settings for this variant
    pub fn model_params(&self) -> ModelParams {
        match self {
            Variant::OpenaiPlain => ModelParams {
                model: "gpt-4o".to_string(),
                max_tokens: 4000,
                temperature: Some(0.1),
            },
            Variant::OpenaiHtml => ModelParams {
                model: "gpt-4o".to_string(),
                max_tokens: 4000,
                temperature: None,
            },
            Variant::ClaudeHtml | Variant::ClaudeSpc => ModelParams {
                model: "claude-sonnet-4-20250514".to_string(),
                max_tokens: 4000,
                temperature: None,
            },
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-specific request parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

/// Fully interpolated prompt, built once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPrompt {
    pub system: Option<String>,
    pub user: String,
}
