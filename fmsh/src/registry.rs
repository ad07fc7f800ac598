//! Command registry
//!
//! Maps command names and aliases to handlers plus their documentation,
//! category and confirmation requirement. Aliases resolve in a single hop
//! and always by name, so re-registering a command keeps its aliases valid.

use crate::cancel::CancellationToken;
use crate::console::Console;
use crate::error::{FmshError, FmshResult};
use crate::session::Session;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Closed set of command groups used by the help listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Navigation,
    FileOperations,
    Search,
    OsInfo,
    Hash,
    Compression,
    Utility,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Navigation,
        Category::FileOperations,
        Category::Search,
        Category::OsInfo,
        Category::Hash,
        Category::Compression,
        Category::Utility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::FileOperations => "file-operations",
            Self::Search => "search",
            Self::OsInfo => "os-info",
            Self::Hash => "hash",
            Self::Compression => "compression",
            Self::Utility => "utility",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Navigation => "Navigation",
            Self::FileOperations => "File Operations",
            Self::Search => "Search",
            Self::OsInfo => "Operating System",
            Self::Hash => "Hash",
            Self::Compression => "Compression",
            Self::Utility => "Utility",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDoc {
    pub description: String,
    pub syntax: String,
    pub example: String,
    pub details: String,
    pub category: Category,
}

impl CommandDoc {
    pub fn new(category: Category, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            syntax: String::new(),
            example: String::new(),
            details: String::new(),
            category,
        }
    }

    pub fn syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = syntax.into();
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}

/// Everything a handler may touch besides its arguments and token.
pub struct CommandContext<'a> {
    pub session: &'a mut Session,
    pub console: &'a dyn Console,
    pub registry: &'a CommandRegistry,
}

/// A command implementation.
///
/// Handlers that do no long-running work simply ignore the token.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(
        &self,
        args: &[String],
        ctx: &mut CommandContext<'_>,
        token: &CancellationToken,
    ) -> FmshResult<()>;
}

#[async_trait]
impl<F> Handler for F
where
    F: Fn(&[String], &mut CommandContext<'_>) -> FmshResult<()> + Send + Sync,
{
    async fn call(
        &self,
        args: &[String],
        ctx: &mut CommandContext<'_>,
        _token: &CancellationToken,
    ) -> FmshResult<()> {
        self(args, ctx)
    }
}

#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub handler: Arc<dyn Handler>,
    pub doc: CommandDoc,
    pub requires_confirmation: bool,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("requires_confirmation", &self.requires_confirmation)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a command.
    pub fn register<H>(&mut self, name: &str, handler: H, doc: CommandDoc, requires_confirmation: bool)
    where
        H: Handler + 'static,
    {
        self.register_arc(name, Arc::new(handler), doc, requires_confirmation);
    }

    pub fn register_arc(
        &mut self,
        name: &str,
        handler: Arc<dyn Handler>,
        doc: CommandDoc,
        requires_confirmation: bool,
    ) {
        if self.commands.contains_key(name) {
            tracing::debug!(command = %name, "Replacing registered command");
        }
        self.commands.insert(
            name.to_string(),
            Command {
                name: name.to_string(),
                handler,
                doc,
                requires_confirmation,
            },
        );
    }

    /// Register a plain synchronous closure as a command.
    pub fn register_fn<F>(&mut self, name: &str, f: F, doc: CommandDoc, requires_confirmation: bool)
    where
        F: Fn(&[String], &mut CommandContext<'_>) -> FmshResult<()> + Send + Sync + 'static,
    {
        self.register(name, f, doc, requires_confirmation);
    }

    /// Point `alias` at an already registered command.
    pub fn register_alias(&mut self, alias: &str, target: &str) -> FmshResult<()> {
        if !self.commands.contains_key(target) {
            return Err(FmshError::UnknownCommand(target.to_string()));
        }
        self.aliases.insert(alias.to_string(), target.to_string());
        Ok(())
    }

    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(self.resolve(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolve `name` and run its handler once with `args`.
    pub async fn execute(
        &self,
        name: &str,
        args: &[String],
        ctx: &mut CommandContext<'_>,
        token: &CancellationToken,
    ) -> FmshResult<()> {
        let command = self
            .get(name)
            .ok_or_else(|| FmshError::UnknownCommand(name.to_string()))?;
        let handler = Arc::clone(&command.handler);
        tracing::debug!(command = %command.name, invoked_as = %name, args = args.len(), "Executing command");
        handler.call(args, ctx, token).await
    }

    pub fn requires_confirmation(&self, name: &str) -> bool {
        self.get(name).is_some_and(|c| c.requires_confirmation)
    }

    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn aliases(&self) -> HashMap<String, String> {
        self.aliases.clone()
    }

    pub fn aliases_for_command(&self, name: &str) -> Vec<String> {
        let mut found: Vec<String> = self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == name)
            .map(|(alias, _)| alias.clone())
            .collect();
        found.sort();
        found
    }

    pub fn commands_by_category(&self, category: Category) -> Vec<&Command> {
        let mut found: Vec<&Command> = self
            .commands
            .values()
            .filter(|c| c.doc.category == category)
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// Every category appears as a key, even with no commands in it.
    pub fn all_commands_by_category(&self) -> BTreeMap<Category, Vec<&Command>> {
        Category::ALL
            .iter()
            .map(|cat| (*cat, self.commands_by_category(*cat)))
            .collect()
    }

    pub fn doc(&self, name: &str) -> Option<&CommandDoc> {
        self.get(name).map(|c| &c.doc)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop every command and alias.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.aliases.clear();
    }

    /// All commands, each exactly once, ordered by name.
    pub fn list_all(&self) -> Vec<&Command> {
        let mut all: Vec<&Command> = self.commands.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn to_vec(&self) -> Vec<Command> {
        self.list_all().into_iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }
}
