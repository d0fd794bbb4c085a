use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyEvent;

use crate::config::Config;
use crate::cursor::{CursorService, MemoryCursor};
use crate::error::EditError;
use crate::fetch::{FetchQueue, Fetcher, HttpFetcher};
use crate::keys::{Chord, Key};
use crate::level::{ContentNode, LevelId, NodeId, NodeKey};
use crate::registry::Registry;
use crate::reorder::{ReorderOptions, Reorderer, SortGroup, TrackingReorderer};
use crate::sandbox::Sandbox;
use crate::template::{Mustache, TemplateRenderer};

mod cursor;
mod evaluate;
mod inspect;
mod structure;

pub use evaluate::FETCH_ERROR_MARKER;

/// Whether a key was consumed by a command. `Unhandled` tells the host to
/// apply its own default behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    Unhandled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Indent,
    Outdent,
    SplitHorizontal,
    SplitVertical,
    Erase,
    CursorUp,
    CursorDown,
    MoveUp,
    MoveDown,
    EvalHtmlInline,
    EvalHtmlBlock,
    EvalScriptInline,
    EvalScriptBlock,
    PushScriptRight,
    SendJsonToScript,
    SendJsonToTemplate,
    FetchUrl,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::Indent => "indent",
            Command::Outdent => "outdent",
            Command::SplitHorizontal => "split-horizontal",
            Command::SplitVertical => "split-vertical",
            Command::Erase => "erase",
            Command::CursorUp => "cursor-up",
            Command::CursorDown => "cursor-down",
            Command::MoveUp => "move-up",
            Command::MoveDown => "move-down",
            Command::EvalHtmlInline => "evaluate-as-html-inline",
            Command::EvalHtmlBlock => "evaluate-as-html-block",
            Command::EvalScriptInline => "evaluate-as-script-inline",
            Command::EvalScriptBlock => "evaluate-as-script-block",
            Command::PushScriptRight => "push-script-result-right",
            Command::SendJsonToScript => "send-json-to-script",
            Command::SendJsonToTemplate => "send-json-to-template",
            Command::FetchUrl => "fetch-url",
        }
    }
}

/// Key bindings in priority order. The first matching chord wins.
pub const BINDINGS: &[(Chord, Command)] = &[
    (Chord::new(Key::Tab), Command::Indent),
    (Chord::new(Key::Tab).shift(), Command::Outdent),
    (Chord::new(Key::Enter).shift(), Command::SplitHorizontal),
    (Chord::new(Key::Enter).ctrl().shift(), Command::SplitVertical),
    (Chord::new(Key::Backspace), Command::Erase),
    (Chord::new(Key::ArrowUp), Command::CursorUp),
    (Chord::new(Key::ArrowDown), Command::CursorDown),
    (Chord::new(Key::ArrowUp).ctrl().alt(), Command::MoveUp),
    (Chord::new(Key::ArrowDown).ctrl().alt(), Command::MoveDown),
    (Chord::new(Key::Char('h')).ctrl(), Command::EvalHtmlInline),
    (Chord::new(Key::Char('h')).ctrl().shift(), Command::EvalHtmlBlock),
    (Chord::new(Key::Char('j')).ctrl(), Command::EvalScriptInline),
    (Chord::new(Key::Char('j')).ctrl().shift(), Command::EvalScriptBlock),
    (Chord::new(Key::Char('k')).ctrl().shift(), Command::PushScriptRight),
    (Chord::new(Key::Char('o')).ctrl().shift(), Command::SendJsonToScript),
    (Chord::new(Key::Char('p')).ctrl().shift(), Command::SendJsonToTemplate),
    (Chord::new(Key::Char('a')).ctrl().shift(), Command::FetchUrl),
];

pub fn command_for(chord: Chord) -> Option<Command> {
    BINDINGS
        .iter()
        .find(|(binding, _)| *binding == chord)
        .map(|(_, command)| *command)
}

/// A problem a command ran into. The command still counts as handled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub level: LevelId,
    pub message: String,
}

/// The Level and line a command operates on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Target {
    pub(crate) level: LevelId,
    pub(crate) node: NodeId,
}

pub struct Editor<C: CursorService = MemoryCursor> {
    levels: Registry,
    cursor: C,
    reorderer: Box<dyn Reorderer>,
    templates: Box<dyn TemplateRenderer>,
    fetcher: Arc<dyn Fetcher>,
    fetches: FetchQueue,
    sandbox: Sandbox,
    reorder_options: ReorderOptions,
    sortables: HashSet<SortGroup>,
    reports: Vec<Report>,
}

impl Editor<MemoryCursor> {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Self::with_cursor(MemoryCursor::new(), config)
    }
}

impl Default for Editor<MemoryCursor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CursorService> Editor<C> {
    /// Creates the outline (root plus one empty first level) and puts the
    /// caret at its start.
    pub fn with_cursor(cursor: C, config: &Config) -> Self {
        let mut editor = Self {
            levels: Registry::new(),
            cursor,
            reorderer: Box::new(TrackingReorderer::new()),
            templates: Box::new(Mustache),
            fetcher: Arc::new(HttpFetcher::new(&config.fetch)),
            fetches: FetchQueue::new(),
            sandbox: Sandbox::new(config.sandbox.clone()),
            reorder_options: config.reorder.clone(),
            sortables: HashSet::new(),
            reports: Vec::new(),
        };
        if let Some(first) = editor.levels.first_level() {
            editor.focus_start(first);
        }
        editor
    }

    pub fn with_reorderer(mut self, reorderer: Box<dyn Reorderer>) -> Self {
        self.reorderer = reorderer;
        self
    }

    pub fn with_templates(mut self, templates: Box<dyn TemplateRenderer>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) -> Outcome {
        match Chord::from_key_event(event) {
            Some(chord) => self.handle_chord(chord),
            None => Outcome::Unhandled,
        }
    }

    pub fn handle_chord(&mut self, chord: Chord) -> Outcome {
        match command_for(chord) {
            Some(command) => self.run(command),
            None => Outcome::Unhandled,
        }
    }

    /// Runs `command` against the Level holding the caret. Without such a
    /// Level nothing happens.
    pub fn run(&mut self, command: Command) -> Outcome {
        let Some(target) = self.target() else {
            tracing::debug!(command = command.name(), "no level holds the caret");
            return Outcome::Unhandled;
        };
        tracing::debug!(command = command.name(), level = %target.level, "dispatching");

        let result = match command {
            Command::Indent => self.indent(target),
            Command::Outdent => self.outdent(target),
            Command::SplitHorizontal => self.split_horizontal(target),
            Command::SplitVertical => self.split_vertical(target),
            Command::Erase => self.erase(target),
            Command::CursorUp => self.cursor_up(target),
            Command::CursorDown => self.cursor_down(target),
            Command::MoveUp => self.move_level_up(target),
            Command::MoveDown => self.move_level_down(target),
            Command::EvalHtmlInline => self.evaluate_html(target, true),
            Command::EvalHtmlBlock => self.evaluate_html(target, false),
            Command::EvalScriptInline => self.evaluate_script(target, true),
            Command::EvalScriptBlock => self.evaluate_script(target, false),
            Command::PushScriptRight => self.push_script_right(target),
            Command::SendJsonToScript => self.send_json(target, JsonSink::Script),
            Command::SendJsonToTemplate => self.send_json(target, JsonSink::Template),
            Command::FetchUrl => self.fetch_url(target),
        };

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                self.report(target.level, err);
                Outcome::Handled
            }
        }
    }

    /// Reports collected since the last call.
    pub fn take_reports(&mut self) -> Vec<Report> {
        std::mem::take(&mut self.reports)
    }

    pub fn is_reorderable(&self, group: SortGroup) -> bool {
        self.sortables.contains(&group)
    }

    /// Applies a drop reported by the reordering capability: the member at
    /// `from` of `group` moves to `to`.
    pub fn reorder(&mut self, group: SortGroup, from: usize, to: usize) -> Result<(), EditError> {
        if !self.sortables.contains(&group) {
            return Err(EditError::UnknownGroup(group.to_string()));
        }
        match group {
            SortGroup::Region(level) => {
                let content = self.levels.level_mut(level)?.content_mut();
                move_item(content, from, to)
            }
            SortGroup::Row(row) => {
                let owner = self
                    .levels
                    .owner_of(NodeKey::Node(row))
                    .ok_or_else(|| EditError::UnknownGroup(group.to_string()))?;
                let row = self
                    .levels
                    .level_mut(owner)?
                    .row_mut(row)
                    .ok_or_else(|| EditError::UnknownGroup(group.to_string()))?;
                move_item(row.columns_mut(), from, to)
            }
        }
    }

    /// Applies every fetch that has completed so far. Returns how many were
    /// applied.
    pub fn poll_fetches(&mut self) -> usize {
        let completions = self.fetches.drain();
        let count = completions.len();
        for completion in completions {
            self.apply_fetch(completion);
        }
        count
    }

    /// Blocks until every in-flight fetch has completed or `timeout` passes
    /// without a completion.
    pub fn wait_for_fetches(&mut self, timeout: Duration) -> usize {
        let mut count = 0;
        while let Some(completion) = self.fetches.wait(timeout) {
            self.apply_fetch(completion);
            count += 1;
        }
        count
    }

    pub fn pending_fetches(&self) -> usize {
        self.fetches.pending()
    }

    fn target(&self) -> Option<Target> {
        let caret = self.cursor.caret()?;
        let level = self.levels.owner_of(NodeKey::Node(caret.node))?;
        self.levels.get(level)?.line(caret.node)?;
        Some(Target {
            level,
            node: caret.node,
        })
    }

    fn report(&mut self, level: LevelId, err: EditError) {
        tracing::warn!(level = %level, error = %err, "command failed");
        self.reports.push(Report {
            level,
            message: err.to_string(),
        });
    }

    fn focus_start(&mut self, level: LevelId) {
        if let Some(region) = self.levels.get(level) {
            region.focus_start(&self.levels, &mut self.cursor);
        }
    }

    fn focus_end(&mut self, level: LevelId) {
        if let Some(region) = self.levels.get(level) {
            region.focus_end(&self.levels, &mut self.cursor);
        }
    }

    fn focus_to(&mut self, level: LevelId, node: NodeId) {
        if let Some(region) = self.levels.get(level) {
            region.focus_to(node, &mut self.cursor);
        }
    }

    /// Makes `group` reorderable, replacing an earlier attachment.
    fn attach_reordering(&mut self, group: SortGroup) {
        if self.sortables.contains(&group) {
            self.reorderer.detach(group);
        }
        self.reorderer.attach(group, &self.reorder_options);
        self.sortables.insert(group);
    }

    /// Releases a node taken out of a region, detaching reordering from any
    /// group that went with it.
    fn discard(&mut self, node: ContentNode) {
        let released = self.levels.release(node);
        if released.is_empty() {
            return;
        }
        let stale: Vec<SortGroup> = self
            .sortables
            .iter()
            .copied()
            .filter(|group| match group {
                SortGroup::Region(level) => !self.levels.contains(*level),
                SortGroup::Row(row) => self.levels.owner_of(NodeKey::Node(*row)).is_none(),
            })
            .collect();
        for group in stale {
            self.sortables.remove(&group);
            self.reorderer.detach(group);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum JsonSink {
    Script,
    Template,
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), EditError> {
    let len = items.len();
    for index in [from, to] {
        if index >= len {
            return Err(EditError::ReorderOutOfBounds { index, len });
        }
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;


#[cfg(test)]
#[path = "editor/cursor_tests.rs"]
mod cursor_tests;
