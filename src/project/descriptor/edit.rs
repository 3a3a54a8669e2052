//! Text-splicing edits on a [`DescriptorDocument`]
//!
//! Every edit rewrites only the bytes of the element it targets, then
//! re-derives spans. Removed elements take their whole line with them when
//! they were alone on it; inserted markup copies the indentation and line
//! ending style already used by the file.

use quick_xml::escape::escape;
use std::ops::Range;

use super::{Block, DescriptorDocument, GroupKind};
use crate::core::constants::DEFAULT_INDENT;
use crate::core::errors::DescriptorError;
use crate::core::types::Metadata;

impl DescriptorDocument {
    /// Remove the given `(group, element)` pairs in one pass
    pub fn remove_elements(&mut self, targets: &[(usize, usize)]) -> Result<(), DescriptorError> {
        let ranges = targets
            .iter()
            .filter_map(|&(g, e)| self.groups.get(g)?.elements.get(e))
            .map(|element| self.line_extent(&element.block.span))
            .collect();
        self.splice_out(ranges)
    }

    /// Remove whole groups in one pass. A group alone on its lines takes one
    /// neighbouring blank line with it, the preceding one if there is one.
    pub fn remove_groups(&mut self, indices: &[usize]) -> Result<(), DescriptorError> {
        let ranges = indices
            .iter()
            .filter_map(|&g| self.groups.get(g))
            .map(|group| self.group_extent(&group.block.span))
            .collect();
        self.splice_out(ranges)
    }

    /// Replace the text of a property element
    pub fn set_property_value(
        &mut self,
        group: usize,
        element: usize,
        value: &str,
    ) -> Result<(), DescriptorError> {
        let Some(target) = self.groups.get(group).and_then(|g| g.elements.get(element)) else {
            return Ok(());
        };
        let escaped = escape(value).into_owned();
        let (range, replacement) = match &target.block.content {
            Some(content) => (content.clone(), escaped),
            None => {
                let open = self.open_tag_of_empty(&target.block.span);
                (
                    target.block.span.clone(),
                    format!("{open}{escaped}</{}>", target.name),
                )
            }
        };
        self.splice(range, &replacement)
    }

    /// Append `<name>value</name>` to a property group
    pub fn append_property(
        &mut self,
        group: usize,
        name: &str,
        value: &str,
    ) -> Result<(), DescriptorError> {
        let markup = format!("<{name}>{}</{name}>", escape(value));
        self.append_to_group(group, &markup)
    }

    /// Append an item with its metadata written as attributes in key order
    pub fn append_item(
        &mut self,
        group: usize,
        item_type: &str,
        identifier: &str,
        metadata: &Metadata,
    ) -> Result<(), DescriptorError> {
        let mut markup = format!("<{item_type} Include=\"{}\"", escape(identifier));
        for (key, value) in metadata.iter() {
            markup.push_str(&format!(" {key}=\"{}\"", escape(value)));
        }
        markup.push_str(" />");
        self.append_to_group(group, &markup)
    }

    /// Index of the first unconditional group of `kind`, creating one at the
    /// end of the root element when none exists
    pub fn ensure_unconditional_group(&mut self, kind: GroupKind) -> Result<usize, DescriptorError> {
        if let Some(index) = self.first_unconditional(kind) {
            return Ok(index);
        }
        let indent = self
            .groups
            .first()
            .map(|g| self.indent_at(g.block.span.start).to_string())
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| DEFAULT_INDENT.to_string());
        let nl = self.newline();
        let name = kind.element_name();
        let markup = format!("<{name}>{nl}{indent}</{name}>");
        let root = self.root.clone();
        self.append_to_block(&root, &markup, &indent, "")?;
        self.first_unconditional(kind)
            .ok_or_else(|| DescriptorError::malformed(&self.context, 0, "group insertion failed"))
    }

    fn append_to_group(&mut self, group: usize, markup: &str) -> Result<(), DescriptorError> {
        let Some(target) = self.groups.get(group) else {
            return Err(DescriptorError::malformed(
                &self.context,
                0,
                format!("no group at index {group}"),
            ));
        };
        let block = target.block.clone();
        let group_indent = self.indent_at(block.span.start).to_string();
        let child_indent = match target.elements.first() {
            Some(first) if !self.indent_at(first.block.span.start).is_empty() => {
                self.indent_at(first.block.span.start).to_string()
            }
            _ => format!("{group_indent}{}", indent_unit(&group_indent)),
        };
        self.append_to_block(&block, markup, &child_indent, &group_indent)
    }

    /// Insert `markup` as the last child of `block` on its own line
    fn append_to_block(
        &mut self,
        block: &Block,
        markup: &str,
        child_indent: &str,
        block_indent: &str,
    ) -> Result<(), DescriptorError> {
        let nl = self.newline();
        match &block.content {
            Some(content) => {
                let inner = &self.text[content.clone()];
                let at = content.start + inner.trim_end().len();
                let tail = &self.text[at..content.end];
                let mut insertion = format!("{nl}{child_indent}{markup}");
                if !tail.contains('\n') {
                    insertion.push_str(&format!("{nl}{block_indent}"));
                }
                self.splice(at..at, &insertion)
            }
            None => {
                let open = self.open_tag_of_empty(&block.span);
                let close_name = open
                    .trim_start_matches('<')
                    .split(|c: char| c.is_whitespace() || c == '>')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                let replacement =
                    format!("{open}{nl}{child_indent}{markup}{nl}{block_indent}</{close_name}>");
                self.splice(block.span.clone(), &replacement)
            }
        }
    }

    /// `<Name attrs />` rewritten as the opening tag `<Name attrs>`
    fn open_tag_of_empty(&self, span: &Range<usize>) -> String {
        let raw = &self.text[span.clone()];
        let trimmed = raw.trim_end_matches('>').trim_end_matches('/').trim_end();
        format!("{trimmed}>")
    }

    /// Span widened to full lines when the element sits alone on its line
    fn line_extent(&self, span: &Range<usize>) -> Range<usize> {
        let bytes = self.text.as_bytes();
        let mut start = span.start;
        while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
            start -= 1;
        }
        let mut end = span.end;
        while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
            end += 1;
        }
        let starts_line = start == 0 || bytes[start - 1] == b'\n';
        let ends_line = end == bytes.len() || matches!(bytes[end], b'\r' | b'\n');
        if !(starts_line && ends_line) {
            return span.clone();
        }
        if end < bytes.len() && bytes[end] == b'\r' {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == b'\n' {
            end += 1;
        }
        start..end
    }

    fn group_extent(&self, span: &Range<usize>) -> Range<usize> {
        let range = self.line_extent(span);
        let bytes = self.text.as_bytes();
        let whole_lines = (range.start == 0 || bytes[range.start - 1] == b'\n')
            && range.end > range.start
            && bytes[range.end - 1] == b'\n';
        if !whole_lines {
            return range;
        }
        if let Some(start) = self.blank_line_before(range.start) {
            return start..range.end;
        }
        if let Some(end) = self.blank_line_after(range.end) {
            return range.start..end;
        }
        range
    }

    /// Start of the line just before `line_start` when it holds only whitespace
    fn blank_line_before(&self, line_start: usize) -> Option<usize> {
        if line_start == 0 {
            return None;
        }
        let bytes = self.text.as_bytes();
        let mut start = line_start - 1;
        while start > 0 && matches!(bytes[start - 1], b' ' | b'\t' | b'\r') {
            start -= 1;
        }
        (start == 0 || bytes[start - 1] == b'\n').then_some(start)
    }

    /// End of the line starting at `line_end` when it holds only whitespace
    fn blank_line_after(&self, line_end: usize) -> Option<usize> {
        let bytes = self.text.as_bytes();
        let mut end = line_end;
        while end < bytes.len() && matches!(bytes[end], b' ' | b'\t' | b'\r') {
            end += 1;
        }
        (end < bytes.len() && bytes[end] == b'\n').then_some(end + 1)
    }

    /// Leading whitespace of the line containing `pos`, if only whitespace
    /// precedes `pos` on that line
    fn indent_at(&self, pos: usize) -> &str {
        let bytes = self.text.as_bytes();
        let mut start = pos;
        while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
            start -= 1;
        }
        if start == 0 || bytes[start - 1] == b'\n' {
            &self.text[start..pos]
        } else {
            ""
        }
    }

    fn newline(&self) -> &'static str {
        if self.text.contains("\r\n") {
            "\r\n"
        } else {
            "\n"
        }
    }

    fn splice(&mut self, range: Range<usize>, replacement: &str) -> Result<(), DescriptorError> {
        self.text_mut().replace_range(range, replacement);
        self.reparse()
    }

    fn splice_out(&mut self, mut ranges: Vec<Range<usize>>) -> Result<(), DescriptorError> {
        if ranges.is_empty() {
            return Ok(());
        }
        ranges.sort_by_key(|r| r.start);
        // Neighbouring groups may claim the same blank line
        let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start < last.end => last.end = last.end.max(range.end),
                _ => merged.push(range),
            }
        }
        for range in merged.into_iter().rev() {
            self.text_mut().replace_range(range, "");
        }
        self.reparse()
    }
}

fn indent_unit(indent: &str) -> &str {
    if indent.is_empty() {
        DEFAULT_INDENT
    } else {
        indent
    }
}
