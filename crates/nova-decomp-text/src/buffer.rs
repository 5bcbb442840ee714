use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::group::{Group, Groups, Reformatter, Replacement};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    #[error("cannot pop the root newline group")]
    PopRoot,
    #[error("operation requires all newline groups to be closed")]
    OpenGroup,
    #[error("buffer was already reformatted")]
    AlreadyReformatted,
}

/// Rendering settings shared by every buffer of one output unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextConfig {
    pub indent: String,
    pub line_separator: String,
    pub preferred_line_length: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            line_separator: "\n".to_string(),
            preferred_line_length: 160,
        }
    }
}

/// Append-only source text with deferred line-wrap groups and bytecode offset tracking.
///
/// Wrapping works on a stack of newline groups. Inside a group,
/// [`append_possible_newline`](TextBuffer::append_possible_newline) appends its alternative
/// text but remembers the position; [`reformat`](TextBuffer::reformat) later replaces either
/// none or all of a group's positions with line breaks, depending on whether the flat rendering
/// fits the preferred line length.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    config: TextConfig,
    text: String,
    groups: Groups,
    current: usize,
    reformatted: bool,
    /// Bytecode offset -> byte position in `text`. The first writer wins.
    mappings: BTreeMap<u32, usize>,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new(TextConfig::default())
    }
}

impl TextBuffer {
    pub fn new(config: TextConfig) -> Self {
        Self {
            config,
            text: String::new(),
            groups: Groups::new(),
            current: 0,
            reformatted: false,
            mappings: BTreeMap::new(),
        }
    }

    /// An empty buffer sharing this buffer's configuration.
    pub fn sibling(&self) -> Self {
        Self::new(self.config.clone())
    }

    pub fn config(&self) -> &TextConfig {
        &self.config
    }

    pub fn append(&mut self, s: &str) -> &mut Self {
        self.text.push_str(s);
        self
    }

    pub fn append_char(&mut self, ch: char) -> &mut Self {
        self.text.push(ch);
        self
    }

    pub fn append_line_separator(&mut self) -> &mut Self {
        self.text.push_str(&self.config.line_separator);
        self
    }

    pub fn append_indent(&mut self, level: usize) -> &mut Self {
        for _ in 0..level {
            self.text.push_str(&self.config.indent);
        }
        self
    }

    /// Appends `other`, carrying over its groups and bytecode mappings.
    pub fn append_buffer(&mut self, other: &TextBuffer) -> Result<&mut Self, TextError> {
        if other.current != 0 {
            return Err(TextError::OpenGroup);
        }
        let shift = self.text.len();
        for (&offset, &pos) in &other.mappings {
            self.mappings.entry(offset).or_insert(pos + shift);
        }
        self.groups.import_root(&other.groups, self.current, shift);
        self.text.push_str(&other.text);
        Ok(self)
    }

    pub fn prepend(&mut self, s: &str) -> &mut Self {
        self.text.insert_str(0, s);
        self.shift(s.len() as isize);
        self
    }

    pub fn enclose(&mut self, left: &str, right: &str) -> &mut Self {
        self.prepend(left);
        self.append(right)
    }

    pub fn enclose_with_parens(&mut self) -> &mut Self {
        self.enclose("(", ")")
    }

    fn shift(&mut self, amount: isize) {
        for pos in self.mappings.values_mut() {
            *pos = pos.saturating_add_signed(amount);
        }
        self.groups.shift_contents(0, amount);
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Truncates the text; groups and mappings past the new end are dropped.
    pub fn set_length(&mut self, len: usize) {
        if len >= self.text.len() {
            return;
        }
        let mut len = len;
        while !self.text.is_char_boundary(len) {
            len -= 1;
        }
        self.text.truncate(len);
        self.mappings.retain(|_, pos| *pos <= len);
        self.groups.truncate(0, len);
        while !self.groups.is_attached(self.current) {
            self.current = self.groups.nodes[self.current].parent.unwrap_or(0);
        }
    }

    /// Whether the text consists of spaces only (or is empty).
    pub fn contains_only_whitespace(&self) -> bool {
        self.text.chars().all(|c| c == ' ')
    }

    pub fn content_equals(&self, s: &str) -> bool {
        self.text == s
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn count_lines(&self) -> usize {
        self.text.matches(self.config.line_separator.as_str()).count()
    }

    /// Opens a group. `base_indent` is the indent already applied at this point and
    /// `extra_indent` is added to wrapped lines when the group is applied.
    pub fn push_newline_group(&mut self, base_indent: usize, extra_indent: usize) -> &mut Self {
        let idx = self.groups.nodes.len();
        self.groups.nodes.push(Group::new(
            Some(self.current),
            self.text.len(),
            base_indent,
            extra_indent,
        ));
        self.groups.nodes[self.current].children.push(idx);
        self.current = idx;
        self
    }

    /// Appends `alternative`, which becomes a line break if the current group is applied.
    pub fn append_possible_newline(&mut self, alternative: &str) -> &mut Self {
        self.add_replacement(alternative, false)
    }

    /// Like [`append_possible_newline`](Self::append_possible_newline), but the group's extra
    /// indent stops applying from here on.
    pub fn append_possible_newline_dedent(&mut self, alternative: &str) -> &mut Self {
        self.add_replacement(alternative, true)
    }

    fn add_replacement(&mut self, alternative: &str, dedent: bool) -> &mut Self {
        self.groups.nodes[self.current].replacements.push(Replacement {
            start: self.text.len(),
            len: alternative.len(),
            dedent,
        });
        self.append(alternative)
    }

    pub fn pop_newline_group(&mut self) -> Result<&mut Self, TextError> {
        if self.current == 0 {
            return Err(TextError::PopRoot);
        }
        let len = self.text.len();
        let group = &mut self.groups.nodes[self.current];
        group.len = len - group.start;
        self.current = group.parent.unwrap_or(0);
        Ok(self)
    }

    /// Applies every group whose flat rendering is too long. Can run once, with no open group.
    pub fn reformat(&mut self) -> Result<(), TextError> {
        if self.current != 0 {
            return Err(TextError::OpenGroup);
        }
        if self.reformatted {
            return Err(TextError::AlreadyReformatted);
        }
        self.reformatted = true;
        self.groups.nodes[0].start = 0;
        self.groups.nodes[0].len = self.text.len();

        let (text, offsets) = Reformatter::new(
            &self.text,
            &self.groups,
            &self.config.indent,
            &self.config.line_separator,
            self.config.preferred_line_length,
        )
        .run();
        for pos in self.mappings.values_mut() {
            *pos = offsets.get(*pos).copied().unwrap_or(text.len());
        }
        self.text = text;
        Ok(())
    }

    /// Records that the text appended next originates from `offsets`.
    pub fn add_bytecode_mapping(&mut self, offsets: impl IntoIterator<Item = u32>) {
        let pos = self.text.len();
        for offset in offsets {
            self.mappings.entry(offset).or_insert(pos);
        }
    }

    /// Records `offsets` at the start of the buffer.
    pub fn add_start_bytecode_mapping(&mut self, offsets: impl IntoIterator<Item = u32>) {
        for offset in offsets {
            self.mappings.entry(offset).or_insert(0);
        }
    }

    /// `(bytecode offset, zero-based line)` for every recorded offset, ordered by offset.
    pub fn line_mapping(&self) -> Vec<(u32, usize)> {
        let sep = self.config.line_separator.as_str();
        let newlines: Vec<usize> = self.text.match_indices(sep).map(|(idx, _)| idx).collect();
        self.mappings
            .iter()
            .map(|(&offset, &pos)| {
                let line = newlines.partition_point(|&nl| nl < pos);
                (offset, line)
            })
            .collect()
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn popping_root_is_an_error() {
        let mut buf = TextBuffer::default();
        assert_eq!(buf.pop_newline_group().err(), Some(TextError::PopRoot));
    }

    #[test]
    fn reformat_requires_closed_groups_and_runs_once() {
        let mut buf = TextBuffer::default();
        buf.push_newline_group(0, 1);
        assert_eq!(buf.reformat(), Err(TextError::OpenGroup));
        buf.pop_newline_group().unwrap();
        buf.reformat().unwrap();
        assert_eq!(buf.reformat(), Err(TextError::AlreadyReformatted));
    }

    #[test]
    fn prepend_shifts_mappings() {
        let mut buf = TextBuffer::default();
        buf.append("a");
        buf.add_bytecode_mapping([7]);
        buf.append("b");
        buf.enclose_with_parens();
        assert_eq!(buf.as_str(), "(ab)");
        assert_eq!(buf.mappings.get(&7), Some(&2));
    }

    #[test]
    fn set_length_drops_groups_past_the_end() {
        let mut buf = TextBuffer::default();
        buf.append("abc");
        buf.push_newline_group(0, 1);
        buf.append_possible_newline(" ");
        buf.append("def");
        buf.set_length(2);
        assert_eq!(buf.as_str(), "ab");
        assert_eq!(buf.current, 0);
        assert!(buf.groups.nodes[0].children.is_empty());
    }
}
