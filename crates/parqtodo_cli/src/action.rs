//! Shared intents for one-shot commands and the interactive shell.

use crate::args::Command;
use parqtodo_core::{
    BridgeResult, PersistenceBridge, QueryResult, TaskId, TaskListView, Theme,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List { json: bool },
    Add(String),
    Edit(TaskId, String),
    Delete(TaskId),
    Toggle(TaskId),
    Clear,
    Sql(String),
    Theme,
    Help,
    Quit,
}

/// Result of one action, rendered by the caller.
#[derive(Debug)]
pub enum Outcome {
    /// The list changed or was requested; print the view.
    View,
    Json(String),
    Rows(QueryResult),
    Theme(Theme),
    Cleared(usize),
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  list [--json]        show tasks
  add <title>          add a task
  edit <id> <title>    change a title
  delete <id>          delete a task
  toggle <id>          flip completed
  clear                delete every task
  sql <query>          read-only query against the engine
  theme                switch light/dark
  quit                 leave the shell";

impl Action {
    /// Maps a subcommand; `None` for `shell`.
    pub fn from_command(command: Command) -> Option<Self> {
        let action = match command {
            Command::List { json } => Self::List { json },
            Command::Add { title } => Self::Add(title.join(" ")),
            Command::Edit { id, title } => Self::Edit(TaskId(id), title.join(" ")),
            Command::Delete { id } => Self::Delete(TaskId(id)),
            Command::Toggle { id } => Self::Toggle(TaskId(id)),
            Command::Clear => Self::Clear,
            Command::Sql { query } => Self::Sql(query),
            Command::Shell => return None,
        };
        Some(action)
    }

    /// Parses one shell line. Blank lines yield `Ok(None)`.
    pub fn parse_line(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let action = match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => match rest {
                "" => Self::List { json: false },
                "--json" => Self::List { json: true },
                other => return Err(format!("unexpected argument `{other}`")),
            },
            "add" => Self::Add(required(rest, "title")?.to_string()),
            "edit" => {
                let (id, title) = match rest.split_once(char::is_whitespace) {
                    Some((id, title)) => (parse_id(id)?, title.trim()),
                    None => (parse_id(rest)?, ""),
                };
                Self::Edit(id, required(title, "title")?.to_string())
            }
            "delete" | "rm" => Self::Delete(parse_id(rest)?),
            "toggle" | "done" => Self::Toggle(parse_id(rest)?),
            "clear" => Self::Clear,
            "sql" => Self::Sql(required(rest, "query")?.to_string()),
            "theme" => Self::Theme,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(format!("unknown command `{other}`; try `help`")),
        };
        Ok(Some(action))
    }

    /// Whether a failure of this action is recorded as the view's last error.
    pub fn reports_through_view(&self) -> bool {
        matches!(
            self,
            Self::Add(_) | Self::Edit(..) | Self::Delete(_) | Self::Toggle(_) | Self::Clear
        )
    }

    /// Applies the action through the view, so the list stays in step with the store.
    pub fn execute(
        self,
        view: &mut TaskListView,
        bridge: &PersistenceBridge,
    ) -> BridgeResult<Outcome> {
        match self {
            Self::List { json: false } => {
                view.load(bridge)?;
                Ok(Outcome::View)
            }
            Self::List { json: true } => {
                view.load(bridge)?;
                let body = serde_json::to_string_pretty(view.tasks())
                    .unwrap_or_else(|err| format!("{{\"error\":\"{err}\"}}"));
                Ok(Outcome::Json(body))
            }
            Self::Add(title) => view.add(bridge, &title).map(|_| Outcome::View),
            Self::Edit(id, title) => view.edit(bridge, id, &title).map(|()| Outcome::View),
            Self::Delete(id) => view.delete(bridge, id).map(|()| Outcome::View),
            Self::Toggle(id) => view.toggle_completed(bridge, id).map(|()| Outcome::View),
            Self::Clear => view.clear(bridge).map(Outcome::Cleared),
            Self::Sql(query) => bridge.query(&query).map(Outcome::Rows),
            Self::Theme => Ok(Outcome::Theme(view.toggle_theme())),
            Self::Help => Ok(Outcome::Help),
            Self::Quit => Ok(Outcome::Quit),
        }
    }
}

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str, String> {
    if value.is_empty() {
        Err(format!("missing {what}"))
    } else {
        Ok(value)
    }
}

fn parse_id(raw: &str) -> Result<TaskId, String> {
    raw.trim()
        .parse::<i64>()
        .map(TaskId)
        .map_err(|_| format!("invalid task id `{}`", raw.trim()))
}
