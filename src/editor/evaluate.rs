use serde_json::Value;
use url::Url;

use crate::cursor::CursorService;
use crate::error::EditError;
use crate::fetch::FetchCompletion;
use crate::level::{Line, NodeKey};

use super::structure::Side;
use super::{Editor, JsonSink, Outcome, Target};

/// Prefix of the line written into a Level whose fetch failed.
pub const FETCH_ERROR_MARKER: &str = "⚠ fetch failed: ";

impl<C: CursorService> Editor<C> {
    pub(super) fn evaluate_html(&mut self, target: Target, inline: bool) -> Result<Outcome, EditError> {
        let markup = self.source_text(target, inline);
        self.apply_output(target, &markup, inline)?;
        Ok(Outcome::Handled)
    }

    pub(super) fn evaluate_script(
        &mut self,
        target: Target,
        inline: bool,
    ) -> Result<Outcome, EditError> {
        let source = self.source_text(target, inline);
        let output = self
            .sandbox
            .evaluate(&source, None)
            .ok_or(EditError::Cancelled)?;
        self.apply_output(target, &output, inline)?;
        Ok(Outcome::Handled)
    }

    /// Evaluates the block as a script and writes the result into a new
    /// sibling Level. The caret stays at the end of the evaluated Level.
    pub(super) fn push_script_right(&mut self, target: Target) -> Result<Outcome, EditError> {
        let source = self.source_text(target, false);
        let output = self
            .sandbox
            .evaluate(&source, None)
            .ok_or(EditError::Cancelled)?;

        let created = self.split_level(target.level, Some(target.node))?;
        self.replace_region(created, Line::from_markup(&output))?;
        self.focus_end(target.level);
        Ok(Outcome::Handled)
    }

    /// Feeds the block, parsed as JSON, to the script or template held by the
    /// next sibling Level and writes the result into a Level split off from
    /// that sibling.
    pub(super) fn send_json(&mut self, target: Target, sink: JsonSink) -> Result<Outcome, EditError> {
        let next = self
            .sibling(target.level, Side::After)
            .and_then(|neighbour| neighbour.level())
            .ok_or(EditError::NoNextSibling(target.level))?;
        let data: Value = serde_json::from_str(&self.source_text(target, false))?;
        let program = self.levels.text_of(next);
        let output = match sink {
            JsonSink::Script => self
                .sandbox
                .evaluate(&program, Some(&data))
                .ok_or(EditError::Cancelled)?,
            JsonSink::Template => self.templates.render(&program, &data)?,
        };

        let created = self.split_level(next, None)?;
        self.replace_region(created, Line::from_markup(&output))?;
        self.focus_end(target.level);
        Ok(Outcome::Handled)
    }

    pub(super) fn fetch_url(&mut self, target: Target) -> Result<Outcome, EditError> {
        let text = self.source_text(target, false);
        let input = text.trim();
        let url = Url::parse(input).map_err(|source| EditError::InvalidUrl {
            input: input.to_string(),
            source,
        })?;
        tracing::info!(level = %target.level, %url, "fetch started");
        self.fetches.spawn(self.fetcher.clone(), target.level, url);
        Ok(Outcome::Handled)
    }

    pub(super) fn apply_fetch(&mut self, completion: FetchCompletion) {
        let FetchCompletion {
            target,
            url,
            result,
        } = completion;
        if !self.levels.contains(target) {
            self.report(target, EditError::Detached(target));
            return;
        }

        match result {
            Ok(body) => {
                tracing::info!(level = %target, %url, bytes = body.len(), "fetch completed");
                if let Err(err) = self.replace_region(target, Line::preformatted(&body)) {
                    self.report(target, err);
                }
            }
            Err(err) => {
                let marker = Line::from_text(&format!("{FETCH_ERROR_MARKER}{err}"));
                if let Some(region) = self.levels.get_mut(target) {
                    region.write(marker.into(), None);
                }
                self.report(target, err.into());
            }
        }

        // The caret may have been on a line the fetch replaced.
        if self.target().is_none() {
            self.focus_end(target);
        }
    }

    /// The live selection, or else the caret line (inline) or the whole
    /// region (block).
    fn source_text(&self, target: Target, inline: bool) -> String {
        if let Some(selection) = self.cursor.selection() {
            return selection;
        }
        if inline {
            self.levels
                .line(target.node)
                .map(Line::text)
                .unwrap_or_default()
        } else {
            self.levels.text_of(target.level)
        }
    }

    /// Inline output replaces the caret line; block output replaces the
    /// whole region.
    fn apply_output(&mut self, target: Target, output: &str, inline: bool) -> Result<(), EditError> {
        let line = Line::from_markup(output);
        if inline {
            let id = line.id();
            let removed = self
                .levels
                .level_mut(target.level)?
                .overwrite(line.into(), Some(NodeKey::Node(target.node)));
            if let Some(removed) = removed {
                self.discard(removed);
            }
            self.focus_to(target.level, id);
        } else {
            self.replace_region(target.level, line)?;
            self.focus_end(target.level);
        }
        Ok(())
    }
}
