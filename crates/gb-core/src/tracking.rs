//! Synchronization of the collaborative tracking document
//!
//! The document has a todo section (languages still to be coded) and a
//! done section (languages with a canonical sheet). Both are markdown
//! tables under level-2 headings. A single pass over the lines copies
//! everything else verbatim and replaces each tracked section with a
//! rendering recomputed from the current set of coded languages.

use crate::error::{Error, Result};
use crate::languages::LanguageIndex;
use crate::markdown::{parse_table, render_table};
use crate::sheet::CodingSheet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

pub const TODO_HEADING: &str = "## Priority";
pub const DONE_HEADING: &str = "## Finished";

const TODO_HEADER: [&str; 4] = ["Language", "iso-639-3", "Reserved By", "Comment"];
const DONE_HEADER: [&str; 3] = ["Language", "iso-639-3", "Done By"];

/// A language with a canonical sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodedLanguage {
    pub name: String,
    pub glottocode: String,
    pub iso: Option<String>,
    pub coder: String,
}

impl From<&CodingSheet> for CodedLanguage {
    fn from(sheet: &CodingSheet) -> Self {
        Self {
            name: sheet.language_name.clone(),
            glottocode: sheet.language_id.clone(),
            iso: sheet.iso.clone(),
            coder: sheet.coder.clone(),
        }
    }
}

/// Where the line scanner currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    Normal,
    InTodo,
    InDone,
}

/// What to do with the current line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Drop the line
    Skip,
    /// Copy the line to the output
    Copy,
    /// Collect the line as part of the current section's table
    Buffer,
    /// Emit the current section's rendering, then copy the line
    FlushThenCopy,
}

fn heading_state(line: &str) -> SectionState {
    if line.starts_with(TODO_HEADING) {
        SectionState::InTodo
    } else if line.starts_with(DONE_HEADING) {
        SectionState::InDone
    } else {
        SectionState::Normal
    }
}

/// Transition table of the section state machine
pub fn transition(state: SectionState, line: &str) -> (Action, SectionState) {
    let line = line.trim();
    if line == "##" {
        return (Action::Skip, state);
    }
    match state {
        SectionState::Normal => (Action::Copy, heading_state(line)),
        SectionState::InTodo | SectionState::InDone => {
            if line.starts_with("## ") {
                (Action::FlushThenCopy, heading_state(line))
            } else if line.is_empty() {
                (Action::Skip, state)
            } else {
                (Action::Buffer, state)
            }
        }
    }
}

/// A row of the todo table
#[derive(Debug, Clone, PartialEq)]
pub struct TodoRow {
    pub language: String,
    /// `/`-separated ISO codes or Glottocodes
    pub codes: String,
    pub reserved_by: String,
    pub comment: String,
}

impl TodoRow {
    /// Build a row from a table record keyed by header name; missing
    /// columns read as empty and extra columns are dropped
    fn from_record(record: &BTreeMap<&str, &str>) -> Self {
        let field = |name: &str| record.get(name).map(|v| v.to_string()).unwrap_or_default();
        Self {
            language: field(TODO_HEADER[0]),
            codes: field(TODO_HEADER[1]),
            reserved_by: field(TODO_HEADER[2]),
            comment: field(TODO_HEADER[3]),
        }
    }

    /// +2 for "SCCS", +1 for "One-per-family"
    pub fn priority(&self) -> u8 {
        let mut prio = 0;
        if self.comment.contains("SCCS") {
            prio += 2;
        }
        if self.comment.contains("One-per-family") {
            prio += 1;
        }
        prio
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.language.clone(),
            self.codes.clone(),
            self.reserved_by.clone(),
            self.comment.clone(),
        ]
    }
}

/// Result of rewriting a document
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    pub text: String,
    /// Todo rows dropped because the language is now coded
    pub now_done: Vec<String>,
    pub todo_rows: usize,
    pub done_rows: usize,
}

/// Recomputes the tracked sections of the document
#[derive(Debug, Clone, Copy)]
pub struct TrackingDocSync<'a> {
    coded: &'a [CodedLanguage],
    languages: &'a LanguageIndex,
}

impl<'a> TrackingDocSync<'a> {
    pub fn new(coded: &'a [CodedLanguage], languages: &'a LanguageIndex) -> Self {
        Self { coded, languages }
    }

    /// Rewrite the document text
    pub fn sync(&self, text: &str) -> Result<SyncOutcome> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut outcome = SyncOutcome::default();
        let mut output: Vec<String> = Vec::new();
        let mut buffer: Vec<&str> = Vec::new();
        let mut state = SectionState::Normal;
        // Rendered sections carry their own trailing newline
        let mut ends_with_section = false;

        for line in text.lines() {
            let (action, next) = transition(state, line);
            match action {
                Action::Skip => {}
                Action::Copy => {
                    output.push(line.to_string());
                    ends_with_section = false;
                }
                Action::Buffer => buffer.push(line),
                Action::FlushThenCopy => {
                    output.push(self.render_section(state, &buffer, &mut outcome)?);
                    buffer.clear();
                    output.push(line.to_string());
                    ends_with_section = false;
                }
            }
            if next != state {
                match next {
                    SectionState::InTodo => debug!("aggregating todo"),
                    SectionState::InDone => debug!("aggregating done"),
                    SectionState::Normal => {}
                }
            }
            state = next;
        }

        if state != SectionState::Normal {
            output.push(self.render_section(state, &buffer, &mut outcome)?);
            ends_with_section = true;
        }

        let mut rewritten = output.join("\n");
        if text.ends_with('\n') && !ends_with_section {
            rewritten.push('\n');
        }
        outcome.text = rewritten;
        Ok(outcome)
    }

    /// Rewrite the document file in place, atomically
    pub fn sync_file<P: AsRef<Path>>(&self, path: P) -> Result<SyncOutcome> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let outcome = self.sync(&text)?;
        write_atomic(path, &outcome.text)?;
        info!(
            path = %path.display(),
            todo = outcome.todo_rows,
            done = outcome.done_rows,
            "tracking document updated"
        );
        Ok(outcome)
    }

    fn render_section(
        &self,
        state: SectionState,
        lines: &[&str],
        outcome: &mut SyncOutcome,
    ) -> Result<String> {
        let table = parse_table(lines)?;
        let rendered = match state {
            SectionState::InTodo => {
                let records = table.records();
                let rows = self.todo_rows(records.iter().map(TodoRow::from_record), outcome);
                outcome.todo_rows = rows.len();
                render_table(&TODO_HEADER, &rows.iter().map(TodoRow::cells).collect::<Vec<_>>())
            }
            SectionState::InDone => {
                let rows = self.done_rows();
                outcome.done_rows = rows.len();
                render_table(&DONE_HEADER, &rows)
            }
            SectionState::Normal => return Ok(String::new()),
        };
        Ok(format!("\n{}\n", rendered))
    }

    /// Retained todo rows, by descending priority then language name
    fn todo_rows(
        &self,
        rows: impl Iterator<Item = TodoRow>,
        outcome: &mut SyncOutcome,
    ) -> Vec<TodoRow> {
        let coded: HashSet<&str> = self.coded.iter().map(|c| c.glottocode.as_str()).collect();
        let mut retained: Vec<TodoRow> = rows
            .filter(|row| {
                let done = row.codes.split('/').map(str::trim).any(|code| {
                    let glottocode = self
                        .languages
                        .lookup(code)
                        .map(|l| l.id.as_str())
                        .unwrap_or(code);
                    coded.contains(glottocode)
                });
                if done {
                    info!(language = %row.language, codes = %row.codes, "now done");
                    outcome.now_done.push(row.language.clone());
                }
                !done
            })
            .collect();
        retained.sort_by(|a, b| {
            b.priority()
                .cmp(&a.priority())
                .then_with(|| a.language.cmp(&b.language))
        });
        retained
    }

    /// Done rows rebuilt from the coded languages, by language name
    fn done_rows(&self) -> Vec<Vec<String>> {
        let mut coded: Vec<&CodedLanguage> = self.coded.iter().collect();
        coded.sort_by(|a, b| a.name.cmp(&b.name));
        coded
            .into_iter()
            .map(|c| {
                vec![
                    c.name.clone(),
                    format!("{} / {}", c.glottocode, c.iso.as_deref().unwrap_or(&c.glottocode)),
                    c.coder.clone(),
                ]
            })
            .collect()
    }
}

/// Replace `path` with `contents` so that readers see either the old or
/// the new file, never a partial write
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}
