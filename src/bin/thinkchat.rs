//! Interactive terminal chat with streamed extended thinking.
//!
//! # Usage
//!
//! ```bash
//! # Use ./config.yaml, ./conversations and ./system_prompts
//! thinkchat
//!
//! # Keep everything somewhere else
//! thinkchat --config ~/.thinkchat.yaml --conversations-dir ~/chats --prompts-dir ~/prompts
//!
//! # Disable colors (useful for piping output)
//! thinkchat --no-color
//! ```
//!
//! On first run the API key is taken from `ANTHROPIC_API_KEY` or asked for,
//! and a settings file with default parameters is written.  Logging goes to
//! stderr and is controlled by `RUST_LOG` (default `warn`).

use std::env;
use std::path::PathBuf;

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use thinkchat::menu::{
    self, MainChoice, PromptChoice, SettingsChoice, is_done_line, parse_index,
    parse_optional_index, parse_yes_no,
};
use thinkchat::settings::DEFAULT_SETTINGS_FILE;
use thinkchat::{
    Anthropic, ChatSession, Conversation, ConversationStore, Error, PlainTextRenderer, PromptStore,
    Renderer, Result, Settings, SystemPrompt,
};

const DEFAULT_CONVERSATIONS_DIR: &str = "conversations";
const DEFAULT_PROMPTS_DIR: &str = "system_prompts";

/// Command-line arguments for thinkchat.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
struct ChatArgs {
    /// Settings file.
    #[arrrg(optional, "Settings file (default: config.yaml)", "PATH")]
    config: Option<String>,

    /// Directory holding conversation files.
    #[arrrg(optional, "Conversation directory (default: conversations)", "DIR")]
    conversations_dir: Option<String>,

    /// Directory holding system prompt files.
    #[arrrg(optional, "System prompt directory (default: system_prompts)", "DIR")]
    prompts_dir: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    no_color: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let (args, free) = ChatArgs::from_command_line_relaxed("thinkchat [OPTIONS]");
    if !free.is_empty() {
        tracing::warn!(?free, "ignoring extra arguments");
    }

    // Interrupting a streamed reply leaves nothing half-written: files are
    // only saved once a turn completes.
    ctrlc::set_handler(exit_cleanly)?;

    let mut console = Console::new()?;
    let config_path = PathBuf::from(args.config.as_deref().unwrap_or(DEFAULT_SETTINGS_FILE));
    let settings = Settings::load_or_init(&config_path, || first_run_key(&mut console))?;
    let conversations = ConversationStore::open(
        args.conversations_dir
            .as_deref()
            .unwrap_or(DEFAULT_CONVERSATIONS_DIR),
    )?;
    let prompts = PromptStore::open(args.prompts_dir.as_deref().unwrap_or(DEFAULT_PROMPTS_DIR))?;

    let mut app = App {
        console,
        renderer: PlainTextRenderer::with_color(!args.no_color),
        settings,
        config_path,
        conversations,
        prompts,
        streaming: true,
    };
    app.run().await;
    Ok(())
}

fn exit_cleanly() {
    println!("\nExiting application...");
    std::process::exit(0);
}

fn first_run_key(console: &mut Console) -> Result<String> {
    if let Ok(key) = env::var("ANTHROPIC_API_KEY")
        && !key.trim().is_empty()
    {
        println!("Using the API key from ANTHROPIC_API_KEY.");
        return Ok(key);
    }
    match console.line("Enter your Claude API key: ") {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(Error::authentication("no API key provided")),
    }
}

/// Line input with history.
struct Console {
    editor: DefaultEditor,
}

impl Console {
    fn new() -> Result<Self> {
        let editor = DefaultEditor::new().map_err(|err| {
            Error::io("failed to open terminal", std::io::Error::other(err.to_string()))
        })?;
        Ok(Self { editor })
    }

    /// Read one line.  `None` at end of input; Ctrl-C exits.
    fn line(&mut self, prompt: &str) -> Option<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Some(line)
            }
            Err(ReadlineError::Interrupted) => {
                exit_cleanly();
                None
            }
            Err(ReadlineError::Eof) => None,
            Err(err) => {
                tracing::error!(error = %err, "failed to read input");
                None
            }
        }
    }

    /// Read lines until one reads `DONE`.
    fn multiline(&mut self) -> String {
        let mut lines = Vec::new();
        while let Some(line) = self.line("") {
            if is_done_line(&line) {
                break;
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.line(prompt).is_some_and(|answer| parse_yes_no(&answer))
    }
}

struct App {
    console: Console,
    renderer: PlainTextRenderer,
    settings: Settings,
    config_path: PathBuf,
    conversations: ConversationStore,
    prompts: PromptStore,
    streaming: bool,
}

impl App {
    async fn run(&mut self) {
        loop {
            let conversations = match self.conversations.list() {
                Ok(conversations) => conversations,
                Err(err) => {
                    self.renderer.print_error(&err.to_string());
                    Vec::new()
                }
            };
            println!("{}", menu::main_menu(&conversations, self.streaming));
            let Some(choice) = self.console.line("\nEnter your choice: ") else {
                break;
            };
            let result = match MainChoice::parse(&choice, !conversations.is_empty()) {
                Ok(MainChoice::NewConversation) => self.new_conversation().await,
                Ok(MainChoice::LoadConversation) => self.load_conversation(&conversations).await,
                Ok(MainChoice::ManagePrompts) => self.manage_prompts(),
                Ok(MainChoice::ToggleStreaming) => {
                    self.toggle_streaming();
                    Ok(())
                }
                Ok(MainChoice::Settings) => self.configure(),
                Ok(MainChoice::Exit) => break,
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                self.renderer.print_error(&err.to_string());
            }
        }
        println!("\nExiting application...");
    }

    async fn new_conversation(&mut self) -> Result<()> {
        let Some(name) = self.console.line("Enter a name for the new conversation: ") else {
            return Ok(());
        };
        if self.conversations.exists(&name)?
            && !self.console.confirm(&format!(
                "Conversation '{}' already exists. Overwrite? (y/n): ",
                name.trim()
            ))
        {
            return Ok(());
        }
        let system_prompt = if self
            .console
            .confirm("\nWould you like to use a system prompt? (y/n): ")
        {
            self.select_system_prompt()?
        } else {
            None
        };
        let conversation =
            self.conversations
                .create(&name, self.settings.model().to_string(), system_prompt)?;
        self.chat(conversation).await
    }

    async fn load_conversation(&mut self, conversations: &[String]) -> Result<()> {
        let Some(input) = self
            .console
            .line("Enter the number of the conversation to load: ")
        else {
            return Ok(());
        };
        let index = parse_index(&input, conversations.len())?;
        let conversation = self.conversations.load(&conversations[index])?;
        self.chat(conversation).await
    }

    fn select_system_prompt(&mut self) -> Result<Option<SystemPrompt>> {
        let prompts = self.prompts.list()?;
        if prompts.is_empty() {
            println!("No system prompts available. Using no system prompt.");
            return Ok(None);
        }
        println!("\nAvailable system prompts:\n0. No system prompt");
        for (i, name) in prompts.iter().enumerate() {
            println!("{}. {name}", i + 1);
        }
        loop {
            let Some(input) = self.console.line("\nSelect a system prompt (0 for none): ") else {
                return Ok(None);
            };
            match parse_optional_index(&input, prompts.len()) {
                Ok(Some(index)) => return self.prompts.load(&prompts[index]).map(Some),
                Ok(None) => return Ok(None),
                Err(err) => self.renderer.print_error(&err.to_string()),
            }
        }
    }

    async fn chat(&mut self, conversation: Conversation) -> Result<()> {
        if !self.streaming {
            println!("This model requires streaming mode to be ON. Switching to streaming mode.");
            self.streaming = true;
        }
        let client = Anthropic::new(Some(self.settings.api_key().to_string()))?;
        let mut session =
            ChatSession::new(&client, &self.conversations, &self.settings, conversation);
        let console = &mut self.console;
        session
            .run(|prompt| console.line(prompt), &mut self.renderer)
            .await;
        Ok(())
    }

    fn manage_prompts(&mut self) -> Result<()> {
        loop {
            let prompts = self.prompts.list()?;
            println!("{}", menu::prompt_menu(&prompts));
            let Some(choice) = self.console.line("\nEnter your choice: ") else {
                return Ok(());
            };
            let result = match PromptChoice::parse(&choice, !prompts.is_empty()) {
                Ok(PromptChoice::Create) => self.create_prompt(),
                Ok(PromptChoice::View) => self.view_prompt(&prompts),
                Ok(PromptChoice::Edit) => self.edit_prompt(&prompts),
                Ok(PromptChoice::Delete) => self.delete_prompt(&prompts),
                Ok(PromptChoice::Back) => return Ok(()),
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                self.renderer.print_error(&err.to_string());
            }
        }
    }

    fn pick_prompt<'a>(&mut self, prompts: &'a [String], verb: &str) -> Result<Option<&'a str>> {
        let prompt = format!("Enter the number of the prompt to {verb}: ");
        let Some(input) = self.console.line(&prompt) else {
            return Ok(None);
        };
        let index = parse_index(&input, prompts.len())?;
        Ok(Some(prompts[index].as_str()))
    }

    fn create_prompt(&mut self) -> Result<()> {
        let Some(name) = self.console.line("Enter a name for the system prompt: ") else {
            return Ok(());
        };
        if self.prompts.exists(&name)?
            && !self.console.confirm(&format!(
                "System prompt '{}' already exists. Overwrite? (y/n): ",
                name.trim()
            ))
        {
            return Ok(());
        }
        println!("\nEnter your system prompt (type 'DONE' on a new line when finished):");
        let text = self.console.multiline();
        let file = self.prompts.create(&name, &text)?;
        println!("System prompt saved as '{file}'");
        Ok(())
    }

    fn view_prompt(&mut self, prompts: &[String]) -> Result<()> {
        let Some(file) = self.pick_prompt(prompts, "view")? else {
            return Ok(());
        };
        let content = self.prompts.read(file)?;
        println!("\n===== {file} =====\n{content}\n{}", "=".repeat(20));
        Ok(())
    }

    fn edit_prompt(&mut self, prompts: &[String]) -> Result<()> {
        let Some(file) = self.pick_prompt(prompts, "edit")? else {
            return Ok(());
        };
        let current = self.prompts.read(file)?;
        println!("\nCurrent content of '{file}':\n{current}");
        println!("\nEnter new content (type 'DONE' on a new line when finished):");
        let text = self.console.multiline();
        self.prompts.update(file, &text)?;
        println!("System prompt '{file}' has been updated.");
        Ok(())
    }

    fn delete_prompt(&mut self, prompts: &[String]) -> Result<()> {
        let Some(file) = self.pick_prompt(prompts, "delete")? else {
            return Ok(());
        };
        if self
            .console
            .confirm(&format!("Are you sure you want to delete '{file}'? (y/n): "))
        {
            self.prompts.delete(file)?;
            println!("System prompt '{file}' has been deleted.");
        }
        Ok(())
    }

    fn toggle_streaming(&mut self) {
        if !self.streaming {
            self.streaming = true;
            println!("Streaming mode is now ON. (Required for this model)");
            return;
        }
        println!("WARNING: This model requires streaming mode to be ON.");
        if self
            .console
            .confirm("Are you sure you want to turn it off? (y/n): ")
        {
            self.streaming = false;
            println!("Streaming mode is now OFF (not recommended)");
        }
    }

    fn configure(&mut self) -> Result<()> {
        loop {
            println!("{}", menu::settings_menu(&self.settings));
            let Some(choice) = self.console.line("\nEnter your choice: ") else {
                return Ok(());
            };
            let field = match SettingsChoice::parse(&choice) {
                Ok(SettingsChoice::Edit(field)) => field,
                Ok(SettingsChoice::Back) => return Ok(()),
                Err(err) => {
                    self.renderer.print_error(&err.to_string());
                    continue;
                }
            };
            let prompt = format!(
                "Enter {field} (current: {}, blank to keep): ",
                self.settings.display_value(field)
            );
            let Some(input) = self.console.line(&prompt) else {
                return Ok(());
            };
            let edit = match field.parse_edit(&input) {
                Ok(Some(edit)) => edit,
                Ok(None) => {
                    println!("{field} unchanged.");
                    continue;
                }
                Err(err) => {
                    self.renderer.print_error(&err.to_string());
                    continue;
                }
            };
            match self.settings.apply(edit) {
                Ok(updated) => {
                    updated.save(&self.config_path)?;
                    self.settings = updated;
                    println!("{field} updated.");
                }
                Err(err) => self.renderer.print_error(&err.to_string()),
            }
        }
    }
}
