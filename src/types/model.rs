use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Represents an Anthropic model identifier.
///
/// This can be a predefined model version or a custom string value
/// for models that may be added in the future.  Both variants serialize
/// as the bare model id string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    /// Known model versions
    Known(KnownModel),

    /// Custom model identifier (for future models or private models)
    Custom(String),
}

/// Known Anthropic model versions that support extended thinking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownModel {
    /// Claude 3.7 Sonnet (latest version)
    Claude37SonnetLatest,

    /// Claude 3.7 Sonnet (2025-02-19 version)
    Claude37Sonnet20250219,

    /// Claude Sonnet 4 (alias)
    ClaudeSonnet40,

    /// Claude Sonnet 4 (2025-05-14 version)
    ClaudeSonnet420250514,

    /// Claude Opus 4 (alias)
    ClaudeOpus40,

    /// Claude Opus 4.1 (alias)
    ClaudeOpus41,

    /// Claude Sonnet 4.5 (alias)
    ClaudeSonnet45,

    /// Claude Haiku 4.5 (alias)
    ClaudeHaiku45,
}

impl KnownModel {
    const ALL: [KnownModel; 8] = [
        KnownModel::Claude37SonnetLatest,
        KnownModel::Claude37Sonnet20250219,
        KnownModel::ClaudeSonnet40,
        KnownModel::ClaudeSonnet420250514,
        KnownModel::ClaudeOpus40,
        KnownModel::ClaudeOpus41,
        KnownModel::ClaudeSonnet45,
        KnownModel::ClaudeHaiku45,
    ];

    /// The model id as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownModel::Claude37SonnetLatest => "claude-3-7-sonnet-latest",
            KnownModel::Claude37Sonnet20250219 => "claude-3-7-sonnet-20250219",
            KnownModel::ClaudeSonnet40 => "claude-sonnet-4-0",
            KnownModel::ClaudeSonnet420250514 => "claude-sonnet-4-20250514",
            KnownModel::ClaudeOpus40 => "claude-opus-4-0",
            KnownModel::ClaudeOpus41 => "claude-opus-4-1",
            KnownModel::ClaudeSonnet45 => "claude-sonnet-4-5",
            KnownModel::ClaudeHaiku45 => "claude-haiku-4-5",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Known(known_model) => write!(f, "{known_model}"),
            Model::Custom(custom) => write!(f, "{custom}"),
        }
    }
}

impl fmt::Display for KnownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(KnownModel::ALL
            .iter()
            .find(|known| known.as_str() == s)
            .map(|known| Model::Known(*known))
            .unwrap_or_else(|| Model::Custom(s.to_string())))
    }
}

impl From<KnownModel> for Model {
    fn from(model: KnownModel) -> Self {
        Model::Known(model)
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        match model.parse() {
            Ok(model) => model,
            Err(never) => match never {},
        }
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Model::from(s.as_str()))
    }
}
