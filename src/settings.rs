//! The persistent settings file.
//!
//! Settings live in a two-section YAML file:
//!
//! ```yaml
//! api:
//!   key: sk-...
//!   model: claude-3-7-sonnet-20250219
//! parameters:
//!   temperature: 1.0
//!   max_tokens: 64000
//!   thinking_budget: 20000
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{KnownModel, Model, ThinkingConfig};

/// Default model for new settings files.
pub const DEFAULT_MODEL: KnownModel = KnownModel::Claude37Sonnet20250219;

/// Default maximum tokens per response, thinking included.
pub const DEFAULT_MAX_TOKENS: u32 = 64000;

/// Default extended-thinking budget.
pub const DEFAULT_THINKING_BUDGET: u32 = 20000;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Smallest thinking budget the API accepts.
pub const MIN_THINKING_BUDGET: u32 = 1024;

/// Default settings file name.
pub const DEFAULT_SETTINGS_FILE: &str = "config.yaml";

/// API credentials and model choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    pub key: String,
    pub model: Model,
}

/// Generation parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub temperature: f32,
    pub max_tokens: u32,
    pub thinking_budget: u32,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            thinking_budget: DEFAULT_THINKING_BUDGET,
        }
    }
}

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    #[serde(default)]
    pub parameters: Parameters,
}

impl Settings {
    /// Settings with the default model and parameters.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api: ApiSettings {
                key: api_key.into(),
                model: Model::Known(DEFAULT_MODEL),
            },
            parameters: Parameters::default(),
        }
    }

    /// Read settings from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::not_found(
                    format!("settings file {} not found", path.display()),
                    Some("settings".to_string()),
                    None,
                ));
            }
            Err(err) => {
                return Err(Error::io(format!("failed to read {}", path.display()), err));
            }
        };
        let settings: Self = serde_yaml::from_str(&content)?;
        settings.validate()?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Write settings to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)
            .map_err(|err| Error::io(format!("failed to write {}", path.display()), err))?;
        tracing::debug!(path = %path.display(), "saved settings");
        Ok(())
    }

    /// Load `path`, or create it with defaults and a key from `ask_key`.
    pub fn load_or_init<P, F>(path: P, ask_key: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: FnOnce() -> Result<String>,
    {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        let key = ask_key()?;
        let settings = Self::new(key.trim());
        settings.save(path)?;
        tracing::info!(path = %path.display(), "created settings file");
        Ok(settings)
    }

    /// Check every field against the rules `apply` enforces.
    pub fn validate(&self) -> Result<()> {
        let Parameters {
            temperature,
            max_tokens,
            thinking_budget,
        } = self.parameters;
        self.apply(SettingsEdit::ApiKey(self.api.key.clone()))?;
        self.apply(SettingsEdit::Model(self.api.model.to_string()))?;
        self.apply(SettingsEdit::Temperature(temperature))?;
        self.apply(SettingsEdit::MaxTokens(max_tokens))?;
        self.apply(SettingsEdit::ThinkingBudget(thinking_budget))?;
        Ok(())
    }

    /// Return these settings with `edit` applied, or a validation error.
    pub fn apply(&self, edit: SettingsEdit) -> Result<Settings> {
        let mut updated = self.clone();
        match edit {
            SettingsEdit::ApiKey(key) => {
                let key = key.trim();
                if key.is_empty() {
                    return Err(invalid(SettingsField::ApiKey, "API key must not be empty"));
                }
                updated.api.key = key.to_string();
            }
            SettingsEdit::Model(model) => {
                let model = model.trim();
                if model.is_empty() {
                    return Err(invalid(SettingsField::Model, "model must not be empty"));
                }
                updated.api.model = Model::from(model);
            }
            SettingsEdit::Temperature(temperature) => {
                if !(0.0..=1.0).contains(&temperature) {
                    return Err(invalid(
                        SettingsField::Temperature,
                        "temperature must be between 0 and 1",
                    ));
                }
                updated.parameters.temperature = temperature;
            }
            SettingsEdit::MaxTokens(max_tokens) => {
                if max_tokens <= self.parameters.thinking_budget {
                    return Err(invalid(
                        SettingsField::MaxTokens,
                        format!(
                            "max tokens must exceed the thinking budget ({})",
                            self.parameters.thinking_budget
                        ),
                    ));
                }
                updated.parameters.max_tokens = max_tokens;
            }
            SettingsEdit::ThinkingBudget(budget) => {
                if budget < MIN_THINKING_BUDGET || budget >= self.parameters.max_tokens {
                    return Err(invalid(
                        SettingsField::ThinkingBudget,
                        format!(
                            "thinking budget must be at least {MIN_THINKING_BUDGET} and below max tokens ({})",
                            self.parameters.max_tokens
                        ),
                    ));
                }
                updated.parameters.thinking_budget = budget;
            }
        }
        Ok(updated)
    }

    pub fn api_key(&self) -> &str {
        &self.api.key
    }

    pub fn model(&self) -> &Model {
        &self.api.model
    }

    /// The thinking configuration requests are sent with.
    pub fn thinking(&self) -> ThinkingConfig {
        ThinkingConfig::enabled(self.parameters.thinking_budget)
    }

    /// The current value of `field`, for display.  The API key is masked.
    pub fn display_value(&self, field: SettingsField) -> String {
        match field {
            SettingsField::ApiKey => mask_key(&self.api.key),
            SettingsField::Model => self.api.model.to_string(),
            SettingsField::Temperature => self.parameters.temperature.to_string(),
            SettingsField::MaxTokens => self.parameters.max_tokens.to_string(),
            SettingsField::ThinkingBudget => self.parameters.thinking_budget.to_string(),
        }
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{tail}", "*".repeat(8))
}

fn invalid(field: SettingsField, message: impl Into<String>) -> Error {
    Error::validation(message, Some(field.key().to_string()))
}

/// One editable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    ApiKey,
    Model,
    Temperature,
    MaxTokens,
    ThinkingBudget,
}

impl SettingsField {
    pub const ALL: [SettingsField; 5] = [
        SettingsField::ApiKey,
        SettingsField::Model,
        SettingsField::Temperature,
        SettingsField::MaxTokens,
        SettingsField::ThinkingBudget,
    ];

    /// The key of this field in the settings file.
    pub fn key(self) -> &'static str {
        match self {
            SettingsField::ApiKey => "key",
            SettingsField::Model => "model",
            SettingsField::Temperature => "temperature",
            SettingsField::MaxTokens => "max_tokens",
            SettingsField::ThinkingBudget => "thinking_budget",
        }
    }

    /// Parse user input into an edit.  Blank input means "leave unchanged".
    pub fn parse_edit(self, input: &str) -> Result<Option<SettingsEdit>> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }
        let number_error = |kind: &str| invalid(self, format!("{input:?} is not {kind}"));
        let edit = match self {
            SettingsField::ApiKey => SettingsEdit::ApiKey(input.to_string()),
            SettingsField::Model => SettingsEdit::Model(input.to_string()),
            SettingsField::Temperature => SettingsEdit::Temperature(
                input.parse().map_err(|_| number_error("a number"))?,
            ),
            SettingsField::MaxTokens => SettingsEdit::MaxTokens(
                input.parse().map_err(|_| number_error("a whole number"))?,
            ),
            SettingsField::ThinkingBudget => SettingsEdit::ThinkingBudget(
                input.parse().map_err(|_| number_error("a whole number"))?,
            ),
        };
        Ok(Some(edit))
    }
}

impl fmt::Display for SettingsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SettingsField::ApiKey => "API Key",
            SettingsField::Model => "Model",
            SettingsField::Temperature => "Temperature",
            SettingsField::MaxTokens => "Max Tokens",
            SettingsField::ThinkingBudget => "Thinking Budget",
        };
        f.write_str(label)
    }
}

/// A single change to the settings.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsEdit {
    ApiKey(String),
    Model(String),
    Temperature(f32),
    MaxTokens(u32),
    ThinkingBudget(u32),
}
