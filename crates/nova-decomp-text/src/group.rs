//! Deferred line-wrap groups and the reformat pass that materializes them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Replacement {
    pub(crate) start: usize,
    pub(crate) len: usize,
    pub(crate) dedent: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Group {
    pub(crate) parent: Option<usize>,
    pub(crate) start: usize,
    pub(crate) len: usize,
    pub(crate) base_indent: usize,
    pub(crate) extra_indent: usize,
    pub(crate) children: Vec<usize>,
    pub(crate) replacements: Vec<Replacement>,
}

impl Group {
    pub(crate) fn new(parent: Option<usize>, start: usize, base_indent: usize, extra_indent: usize) -> Self {
        Self {
            parent,
            start,
            len: 0,
            base_indent,
            extra_indent,
            children: Vec::new(),
            replacements: Vec::new(),
        }
    }

    fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Arena of groups; index 0 is the root and always spans the whole text.
#[derive(Debug, Clone)]
pub(crate) struct Groups {
    pub(crate) nodes: Vec<Group>,
}

impl Groups {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Group::new(None, 0, 0, 0)],
        }
    }

    /// Moves every group below `idx` (and its replacements) by `amount`.
    pub(crate) fn shift_contents(&mut self, idx: usize, amount: isize) {
        for r in &mut self.nodes[idx].replacements {
            r.start = r.start.saturating_add_signed(amount);
        }
        let children = self.nodes[idx].children.clone();
        for child in children {
            self.nodes[child].start = self.nodes[child].start.saturating_add_signed(amount);
            self.shift_contents(child, amount);
        }
    }

    /// Copies the children and replacements of `other`'s root under `parent`, shifted by
    /// `shift`.
    pub(crate) fn import_root(&mut self, other: &Groups, parent: usize, shift: usize) {
        for r in &other.nodes[0].replacements {
            self.nodes[parent].replacements.push(Replacement {
                start: r.start + shift,
                ..*r
            });
        }
        for &child in &other.nodes[0].children {
            let idx = self.import(other, child, parent, shift);
            self.nodes[parent].children.push(idx);
        }
    }

    fn import(&mut self, other: &Groups, src: usize, parent: usize, shift: usize) -> usize {
        let g = &other.nodes[src];
        let idx = self.nodes.len();
        self.nodes.push(Group {
            parent: Some(parent),
            start: g.start + shift,
            len: g.len,
            base_indent: g.base_indent,
            extra_indent: g.extra_indent,
            children: Vec::new(),
            replacements: g
                .replacements
                .iter()
                .map(|r| Replacement {
                    start: r.start + shift,
                    ..*r
                })
                .collect(),
        });
        for &child in &g.children {
            let c = self.import(other, child, idx, shift);
            self.nodes[idx].children.push(c);
        }
        idx
    }

    /// Drops everything that starts past `len` and clips the rest.
    pub(crate) fn truncate(&mut self, idx: usize, len: usize) {
        if self.nodes[idx].end() > len {
            self.nodes[idx].len = len.saturating_sub(self.nodes[idx].start);
        }
        self.nodes[idx].replacements.retain(|r| r.start <= len);
        let children = std::mem::take(&mut self.nodes[idx].children);
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            if self.nodes[child].start <= len {
                self.truncate(child, len);
                kept.push(child);
            } else {
                self.nodes[child].parent = None;
            }
        }
        self.nodes[idx].children = kept;
    }

    /// Whether `idx` is still reachable from the root.
    pub(crate) fn is_attached(&self, mut idx: usize) -> bool {
        while idx != 0 {
            match self.nodes[idx].parent {
                Some(parent) if self.nodes[parent].children.contains(&idx) => idx = parent,
                _ => return false,
            }
        }
        true
    }
}

pub(crate) struct Reformatter<'a> {
    pub(crate) text: &'a str,
    pub(crate) groups: &'a Groups,
    pub(crate) indent: &'a str,
    pub(crate) separator: &'a str,
    pub(crate) preferred_line_length: usize,
    pub(crate) out: String,
    /// Old byte offset to new byte offset, one entry per old offset plus the end.
    pub(crate) offsets: Vec<usize>,
}

impl<'a> Reformatter<'a> {
    pub(crate) fn new(
        text: &'a str,
        groups: &'a Groups,
        indent: &'a str,
        separator: &'a str,
        preferred_line_length: usize,
    ) -> Self {
        Self {
            text,
            groups,
            indent,
            separator,
            preferred_line_length,
            out: String::with_capacity(text.len()),
            offsets: vec![0; text.len() + 1],
        }
    }

    pub(crate) fn run(mut self) -> (String, Vec<usize>) {
        self.render(0, 0);
        let end = self.text.len();
        self.offsets[end] = self.out.len();
        (self.out, self.offsets)
    }

    fn current_column(&self) -> usize {
        let line_start = self
            .out
            .rfind(self.separator)
            .map_or(0, |idx| idx + self.separator.len());
        self.out[line_start..].chars().count()
    }

    /// Longest line the group would produce if it stays flat, counting text already on the line
    /// it starts on.
    fn longest_line(&self, group: &Group, extra_indent: usize) -> usize {
        let body = &self.text[group.start..group.end().min(self.text.len())];
        let mut lines = body.split(self.separator);
        let first = lines.next().map_or(0, |l| l.chars().count());
        let mut longest = self.current_column() + first;
        for line in lines {
            let width = extra_indent * self.indent.chars().count() + line.chars().count();
            longest = longest.max(width);
        }
        longest
    }

    fn render(&mut self, idx: usize, mut extra_indent: usize) {
        let groups = self.groups;
        let group = &groups.nodes[idx];
        let end = group.end().min(self.text.len());
        let apply = self.longest_line(group, extra_indent) > self.preferred_line_length;
        let original_extra = extra_indent;
        if apply && !group.replacements.is_empty() {
            extra_indent += group.extra_indent;
        }

        let mut pos = group.start;
        let mut next_child = 0;
        let mut next_replacement = 0;
        loop {
            while group.replacements.get(next_replacement).is_some_and(|r| r.start < pos) {
                next_replacement += 1;
            }
            while group
                .children
                .get(next_child)
                .is_some_and(|&c| groups.nodes[c].start < pos)
            {
                next_child += 1;
            }
            if apply {
                if let Some(r) = group.replacements.get(next_replacement).filter(|r| r.start == pos) {
                    if r.dedent {
                        extra_indent = original_extra;
                    }
                    self.out.push_str(self.separator);
                    for _ in 0..group.base_indent + extra_indent {
                        self.out.push_str(self.indent);
                    }
                    let skip_end = (pos + r.len).min(end);
                    for old in pos..skip_end {
                        self.offsets[old] = self.out.len();
                    }
                    pos = skip_end;
                    next_replacement += 1;
                    continue;
                }
            }
            if let Some(&child) = group.children.get(next_child) {
                if groups.nodes[child].start == pos {
                    self.render(child, extra_indent);
                    pos = groups.nodes[child].end().min(end).max(pos);
                    next_child += 1;
                    continue;
                }
            }
            if pos >= end {
                break;
            }
            self.offsets[pos] = self.out.len();
            if self.text[pos..].starts_with(self.separator) {
                self.out.push_str(self.separator);
                for old in pos + 1..pos + self.separator.len() {
                    self.offsets[old] = self.out.len();
                }
                pos += self.separator.len();
                for _ in 0..extra_indent {
                    self.out.push_str(self.indent);
                }
                continue;
            }
            let Some(ch) = self.text[pos..].chars().next() else {
                break;
            };
            self.out.push(ch);
            for old in pos + 1..pos + ch.len_utf8() {
                self.offsets[old] = self.out.len();
            }
            pos += ch.len_utf8();
        }
        self.offsets[end] = self.out.len();
    }
}
