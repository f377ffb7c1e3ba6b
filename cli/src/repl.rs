//! Line-oriented front end over a [`ChatSession`].

use std::io::Write;

use anyhow::Result;
use quill_config::{KeyValueStore, LocalKeyValueStore, SaveReport, SettingsStore};
use quill_core::text_file::render_paragraphs;
use quill_core::{ChatSession, MemoryDocument, Selection, TurnOutcome, TurnReport};
use quill_types::truncate_with_ellipsis;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::commands::{Command, HELP};

pub struct Repl<'a, P, F> {
    pub session: ChatSession<'a>,
    /// Paragraph view of the document the session edits.
    pub document: &'a MemoryDocument,
    pub store: &'a SettingsStore<P, F>,
}

enum Flow {
    Continue,
    Quit,
}

impl<P, F> Repl<'_, P, F>
where
    P: KeyValueStore,
    F: LocalKeyValueStore,
{
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "Quill - type /help for commands.")?;
        self.report_connection(out)?;

        let mut lines = input.lines();
        loop {
            write!(out, "> ")?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(e) => {
                    writeln!(out, "{e}")?;
                    continue;
                }
            };

            if let Flow::Quit = self.execute(command, out).await? {
                break;
            }
        }
        Ok(())
    }

    async fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow> {
        match command {
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Settings => self.print_settings(out)?,
            Command::Set { field, value } => match field.apply(self.session.settings(), &value) {
                Ok(next) => {
                    let endpoint_changed = self.session.update_settings(next);
                    writeln!(out, "Updated. Use /save to keep it.")?;
                    if endpoint_changed {
                        self.session.check_connection().await;
                        self.report_connection(out)?;
                    }
                }
                Err(e) => writeln!(out, "{e}")?,
            },
            Command::Save => match self.store.save(self.session.settings()).await {
                Ok(SaveReport::Primary) => writeln!(out, "Settings saved.")?,
                Ok(SaveReport::Fallback { reason }) => {
                    writeln!(out, "Settings saved to the local fallback ({reason}).")?;
                }
                Err(e) => writeln!(out, "Could not save settings: {e}")?,
            },
            Command::Check => {
                self.session.check_connection().await;
                self.report_connection(out)?;
            }
            Command::Models => {
                let current = self.session.settings().model_or_default().to_string();
                for model in self.session.available_models() {
                    let marker = if *model == current { "*" } else { " " };
                    writeln!(out, "{marker} {model}")?;
                }
            }
            Command::Log => {
                if self.session.action_log().is_empty() {
                    writeln!(out, "(no actions yet)")?;
                }
                for entry in self.session.action_log() {
                    writeln!(out, "{entry}")?;
                }
            }
            Command::ClearLog => {
                self.session.clear_action_log();
                writeln!(out, "Action log cleared.")?;
            }
            Command::Select { paragraph, range } => self.select(paragraph, range, out)?,
            Command::Unselect => {
                self.document.clear_selection();
                writeln!(out, "Selection cleared.")?;
            }
            Command::Show => {
                let paragraphs = self.document.paragraphs();
                if paragraphs.is_empty() {
                    writeln!(out, "(empty document)")?;
                } else {
                    write!(out, "{}", render_paragraphs(&paragraphs))?;
                }
            }
            Command::Clear => {
                self.session.clear_conversation();
                writeln!(out, "Conversation cleared.")?;
            }
            Command::Quit => return Ok(Flow::Quit),
            Command::Chat(text) => self.chat(&text, out).await?,
        }
        Ok(Flow::Continue)
    }

    async fn chat<W: Write>(&mut self, text: &str, out: &mut W) -> Result<()> {
        match self.session.send(text).await {
            Ok(TurnOutcome::Ignored) => {}
            Ok(TurnOutcome::NeedsConfiguration(guidance)) => writeln!(out, "{guidance}")?,
            Ok(TurnOutcome::Replied(TurnReport {
                assistant_text,
                outcomes,
                edits_skipped,
            })) => {
                writeln!(out, "{assistant_text}")?;
                for outcome in &outcomes {
                    let mark = if outcome.succeeded { "+" } else { "!" };
                    writeln!(out, "  [{mark}] {}", outcome.message)?;
                }
                if edits_skipped > 0 {
                    writeln!(
                        out,
                        "  ({edits_skipped} edit(s) skipped: allowEdit is off)"
                    )?;
                }
            }
            Err(e) => writeln!(out, "Error: {e}")?,
        }
        Ok(())
    }

    fn select<W: Write>(
        &self,
        paragraph: usize,
        range: Option<(usize, usize)>,
        out: &mut W,
    ) -> Result<()> {
        let paragraphs = self.document.paragraphs();
        let Some(target) = paragraphs.get(paragraph) else {
            writeln!(
                out,
                "No paragraph {} (document has {}).",
                paragraph + 1,
                paragraphs.len()
            )?;
            return Ok(());
        };

        let len = target.text.chars().count();
        let (start, end) = range.unwrap_or((0, len));
        if start > end || end > len {
            writeln!(out, "Range {start}..{end} is outside 0..{len}.")?;
            return Ok(());
        }

        self.document.select(Selection::new(paragraph, start, end));
        let selected: String = target.text.chars().skip(start).take(end - start).collect();
        writeln!(out, "Selected: \"{}\"", truncate_with_ellipsis(&selected, 60))?;
        Ok(())
    }

    fn print_settings<W: Write>(&self, out: &mut W) -> Result<()> {
        let settings = self.session.settings();
        let key = if settings.api_key.is_empty() {
            "(not set)"
        } else {
            "(set)"
        };
        writeln!(out, "apiBaseUrl:   {}", settings.api_base_url)?;
        writeln!(out, "apiKey:       {key}")?;
        writeln!(
            out,
            "modelsUrl:    {}",
            settings.models_url().unwrap_or_default()
        )?;
        writeln!(out, "model:        {}", settings.model_or_default())?;
        writeln!(out, "systemPrompt: {}", settings.system_prompt())?;
        writeln!(out, "allowEdit:    {}", settings.allow_edit())?;
        Ok(())
    }

    fn report_connection<W: Write>(&self, out: &mut W) -> Result<()> {
        let connection = self.session.connection();
        match &connection.message {
            Some(message) => {
                writeln!(out, "Connection: {} ({message})", connection.status.label())?;
            }
            None => writeln!(out, "Connection: {}", connection.status.label())?,
        }
        Ok(())
    }
}
