//! Slash-command parsing for the REPL.

use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use quill_types::Settings;

pub const HELP: &str = "\
Commands:
  /help                      Show this help
  /settings                  Show current settings
  /set <field> <value>       Change a setting (apiBaseUrl, apiKey, modelsUrl,
                             model, systemPrompt, allowEdit); empty value clears
  /save                      Persist settings
  /check                     Check the connection and refresh the model list
  /models                    List selectable models
  /log                       Show the action log
  /clearlog                  Clear the action log
  /select <para> [start end] Select paragraph <para> (1-based), optionally a
                             character range inside it
  /unselect                  Clear the selection
  /show                      Print the document
  /clear                     Forget the conversation (keeps the system prompt)
  /quit                      Exit
Anything else is sent to the model.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    ApiBaseUrl,
    ApiKey,
    ModelsUrl,
    Model,
    SystemPrompt,
    AllowEdit,
}

impl FromStr for SettingField {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        Ok(match normalized.as_str() {
            "apibaseurl" | "baseurl" => SettingField::ApiBaseUrl,
            "apikey" | "key" => SettingField::ApiKey,
            "modelsurl" => SettingField::ModelsUrl,
            "model" => SettingField::Model,
            "systemprompt" | "prompt" => SettingField::SystemPrompt,
            "allowedit" => SettingField::AllowEdit,
            _ => bail!("unknown setting '{raw}'"),
        })
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl SettingField {
    /// Apply `value` to a copy of `settings`.
    pub fn apply(self, settings: &Settings, value: &str) -> Result<Settings> {
        let mut next = settings.clone();
        match self {
            SettingField::ApiBaseUrl => next.api_base_url = value.trim().to_string(),
            SettingField::ApiKey => next.api_key = value.trim().to_string(),
            SettingField::ModelsUrl => next.models_url = optional(value),
            SettingField::Model => next.model = optional(value),
            SettingField::SystemPrompt => next.system_prompt = Some(value.trim().to_string()),
            SettingField::AllowEdit => {
                next.allow_edit = Some(match value.trim().to_ascii_lowercase().as_str() {
                    "true" | "on" | "yes" | "1" => true,
                    "false" | "off" | "no" | "0" => false,
                    other => bail!("allowEdit expects true or false, got '{other}'"),
                });
            }
        }
        Ok(next)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Settings,
    Set { field: SettingField, value: String },
    Save,
    Check,
    Models,
    Log,
    ClearLog,
    /// Zero-based paragraph; `None` range selects the whole paragraph.
    Select {
        paragraph: usize,
        range: Option<(usize, usize)>,
    },
    Unselect,
    Show,
    Clear,
    Quit,
    Chat(String),
}

fn parse_number(raw: &str, what: &str) -> Result<usize> {
    raw.parse()
        .map_err(|_| anyhow!("{what} must be a number, got '{raw}'"))
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Ok(Command::Chat(line.to_string()));
        };

        let (name, args) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(name, args)| (name, args.trim()));

        Ok(match name {
            "help" | "?" => Command::Help,
            "settings" => Command::Settings,
            "set" => {
                let (field, value) = args
                    .split_once(char::is_whitespace)
                    .unwrap_or((args, ""));
                if field.is_empty() {
                    bail!("usage: /set <field> <value>");
                }
                Command::Set {
                    field: field.parse()?,
                    value: value.trim().to_string(),
                }
            }
            "save" => Command::Save,
            "check" => Command::Check,
            "models" => Command::Models,
            "log" => Command::Log,
            "clearlog" => Command::ClearLog,
            "select" => {
                let parts: Vec<&str> = args.split_whitespace().collect();
                let (paragraph, range) = match parts.as_slice() {
                    [para] => (parse_number(para, "paragraph")?, None),
                    [para, start, end] => (
                        parse_number(para, "paragraph")?,
                        Some((parse_number(start, "start")?, parse_number(end, "end")?)),
                    ),
                    _ => bail!("usage: /select <para> [start end]"),
                };
                if paragraph == 0 {
                    bail!("paragraphs are numbered from 1");
                }
                Command::Select {
                    paragraph: paragraph - 1,
                    range,
                }
            }
            "unselect" => Command::Unselect,
            "show" => Command::Show,
            "clear" => Command::Clear,
            "quit" | "exit" | "q" => Command::Quit,
            other => bail!("unknown command '/{other}' (try /help)"),
        })
    }
}
