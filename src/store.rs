//! File-backed stores for conversations and system prompts.
//!
//! Each store owns one directory.  Names are file names; the store's
//! extension is appended when a caller omits it.  Writes replace the whole
//! file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::conversation::{Conversation, SystemPrompt};
use crate::error::{Error, Result};

/// Conversations as pretty-printed JSON files.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    dir: PathBuf,
}

impl ConversationStore {
    pub const EXTENSION: &'static str = "json";

    /// Open the store, creating `dir` if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        create_dir(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The path a conversation named `name` is stored at.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        Ok(self.dir.join(file_name(name, Self::EXTENSION)?))
    }

    /// Conversation file names, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        list_files(&self.dir, Self::EXTENSION)
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.path_for(name)?.is_file())
    }

    /// Create an empty conversation and write it immediately.
    pub fn create(
        &self,
        name: &str,
        model: impl Into<String>,
        system_prompt: Option<SystemPrompt>,
    ) -> Result<Conversation> {
        let mut conversation = Conversation::new(name.trim(), model, system_prompt);
        conversation.set_file_name(file_name(name, Self::EXTENSION)?);
        self.save(&conversation)?;
        Ok(conversation)
    }

    /// Load the conversation stored in `file`.
    pub fn load(&self, file: &str) -> Result<Conversation> {
        let file = file_name(file, Self::EXTENSION)?;
        let path = self.dir.join(&file);
        let content = read(&path, "conversation")?;
        let mut conversation: Conversation = serde_json::from_str(&content).map_err(|err| {
            Error::serialization(
                format!("failed to parse conversation {}: {err}", path.display()),
                Some(Box::new(err)),
            )
        })?;
        conversation.set_file_name(file);
        tracing::debug!(path = %path.display(), "loaded conversation");
        Ok(conversation)
    }

    /// Write `conversation` to its file.
    pub fn save(&self, conversation: &Conversation) -> Result<()> {
        let file = match conversation.file_name() {
            Some(file) => file_name(file, Self::EXTENSION)?,
            None => file_name(conversation.name(), Self::EXTENSION)?,
        };
        let path = self.dir.join(file);
        let content = serde_json::to_string_pretty(conversation).map_err(|err| {
            Error::serialization("failed to serialize conversation", Some(Box::new(err)))
        })?;
        write(&path, &content)?;
        tracing::debug!(
            path = %path.display(),
            messages = conversation.messages().len(),
            "saved conversation"
        );
        Ok(())
    }
}

/// System prompts as plain-text files.
#[derive(Debug, Clone)]
pub struct PromptStore {
    dir: PathBuf,
}

impl PromptStore {
    pub const EXTENSION: &'static str = "txt";

    /// Open the store, creating `dir` if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        create_dir(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The path a prompt named `name` is stored at.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        Ok(self.dir.join(file_name(name, Self::EXTENSION)?))
    }

    /// Prompt file names, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        list_files(&self.dir, Self::EXTENSION)
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.path_for(name)?.is_file())
    }

    /// Write a prompt, returning its file name.
    pub fn create(&self, name: &str, text: &str) -> Result<String> {
        let file = file_name(name, Self::EXTENSION)?;
        write(&self.dir.join(&file), text)?;
        Ok(file)
    }

    pub fn read(&self, file: &str) -> Result<String> {
        read(&self.path_for(file)?, "system prompt")
    }

    /// Replace the text of an existing prompt.
    pub fn update(&self, file: &str, text: &str) -> Result<()> {
        let path = self.existing(file)?;
        write(&path, text)
    }

    /// Remove an existing prompt.
    pub fn delete(&self, file: &str) -> Result<()> {
        let path = self.existing(file)?;
        fs::remove_file(&path)
            .map_err(|err| Error::io(format!("failed to delete {}", path.display()), err))?;
        tracing::debug!(path = %path.display(), "deleted system prompt");
        Ok(())
    }

    /// Load a prompt for attaching to a conversation.
    pub fn load(&self, file: &str) -> Result<SystemPrompt> {
        let name = file_name(file, Self::EXTENSION)?;
        let content = self.read(&name)?;
        Ok(SystemPrompt { name, content })
    }

    fn existing(&self, file: &str) -> Result<PathBuf> {
        let path = self.path_for(file)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(not_found("system prompt", &path))
        }
    }
}

/// Validate `name` and append `.extension` when it is missing.
fn file_name(name: &str, extension: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("name must not be empty", Some("name".to_string())));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::validation(
            format!("{name:?} is not a valid file name"),
            Some("name".to_string()),
        ));
    }
    let suffix = format!(".{extension}");
    if name.ends_with(&suffix) {
        Ok(name.to_string())
    } else {
        Ok(format!("{name}{suffix}"))
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|err| Error::io(format!("failed to create {}", dir.display()), err))
}

fn list_files(dir: &Path, extension: &str) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(dir).map_err(|err| Error::io(format!("failed to list {}", dir.display()), err))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            files.push(name.to_string());
        }
    }
    files.sort();
    Ok(files)
}

fn read(path: &Path, what: &str) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(not_found(what, path)),
        Err(err) => Err(Error::io(format!("failed to read {}", path.display()), err)),
    }
}

fn write(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .map_err(|err| Error::io(format!("failed to write {}", path.display()), err))
}

fn not_found(what: &str, path: &Path) -> Error {
    let id = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    Error::not_found(
        format!("{what} {} not found", path.display()),
        Some(what.to_string()),
        id,
    )
}
