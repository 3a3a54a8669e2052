//! Project descriptor documents
//!
//! A [`DescriptorDocument`] keeps the original file text and the byte spans of
//! every top-level property/item group and of each element inside them. Edits
//! splice the text directly (see [`edit`]) so that everything outside the
//! edited span survives byte-for-byte, including comments, attribute quoting,
//! line endings and a leading BOM.
//!
//! Each document is exclusively owned by the operation that loaded it and is
//! dropped after saving; nothing caches documents between files or phases.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::ops::Range;
use std::path::Path;

use crate::core::constants::{attributes, elements, EMPTY_DESCRIPTOR};
use crate::core::errors::{DescriptorError, PersistError};
use crate::core::io_utils;
use crate::core::types::{file_name, Metadata};

pub mod edit;

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Property,
    Item,
}

impl GroupKind {
    pub fn element_name(self) -> &'static str {
        match self {
            Self::Property => elements::PROPERTY_GROUP,
            Self::Item => elements::ITEM_GROUP,
        }
    }

    fn from_element_name(name: &str) -> Option<Self> {
        match name {
            elements::PROPERTY_GROUP => Some(Self::Property),
            elements::ITEM_GROUP => Some(Self::Item),
            _ => None,
        }
    }
}

/// Location of an element in the document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Block {
    /// From `<` of the start tag to just past the end tag (or `/>`)
    pub span: Range<usize>,
    /// Between the start and end tags; `None` for self-closing elements
    pub content: Option<Range<usize>>,
}

/// A property or item element inside a group
#[derive(Debug, Clone)]
pub struct DescriptorElement {
    pub name: String,
    attributes: Vec<(String, String)>,
    /// Direct child elements as (name, trimmed text)
    children: Vec<(String, String)>,
    text: String,
    pub(crate) block: Block,
}

impl DescriptorElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn condition(&self) -> Option<&str> {
        self.attribute(attributes::CONDITION).filter(|c| !c.is_empty())
    }

    pub fn is_conditional(&self) -> bool {
        self.condition().is_some()
    }

    /// Item identifier (the `Include` attribute)
    pub fn include(&self) -> Option<&str> {
        self.attribute(attributes::INCLUDE)
    }

    /// Property value: the element text with surrounding whitespace trimmed
    pub fn value(&self) -> &str {
        self.text.trim()
    }

    /// Item metadata from non-structural attributes and child elements.
    /// A child element wins over an attribute of the same name.
    pub fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        for (key, value) in &self.attributes {
            if !attributes::STRUCTURAL.contains(&key.as_str()) {
                metadata.insert(key.as_str(), value.as_str());
            }
        }
        for (key, value) in &self.children {
            metadata.insert(key.as_str(), value.as_str());
        }
        metadata
    }
}

/// A top-level `PropertyGroup` or `ItemGroup`
#[derive(Debug, Clone)]
pub struct DescriptorGroup {
    pub kind: GroupKind,
    condition: Option<String>,
    pub elements: Vec<DescriptorElement>,
    pub(crate) block: Block,
}

impl DescriptorGroup {
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref().filter(|c| !c.is_empty())
    }

    pub fn is_conditional(&self) -> bool {
        self.condition().is_some()
    }
}

/// Parsed descriptor plus the exact text it came from
#[derive(Debug, Clone)]
pub struct DescriptorDocument {
    context: String,
    has_bom: bool,
    text: String,
    pub(crate) root: Block,
    groups: Vec<DescriptorGroup>,
}

impl DescriptorDocument {
    /// Parse descriptor text. `context` names the file in error messages.
    pub fn parse(context: &str, source: &str) -> Result<Self, DescriptorError> {
        let (has_bom, text) = match source.strip_prefix(BOM) {
            Some(rest) => (true, rest.to_string()),
            None => (false, source.to_string()),
        };
        let (root, groups) = parse_structure(context, &text)?;
        Ok(Self {
            context: context.to_string(),
            has_bom,
            text,
            root,
            groups,
        })
    }

    /// Read and parse a descriptor from disk
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        let source = io_utils::read_descriptor(path)?;
        Self::parse(&file_name(path), &source)
    }

    /// Load `path` if it exists, otherwise start from an empty descriptor
    pub fn load_or_create(path: &Path) -> Result<(Self, bool), DescriptorError> {
        if path.exists() {
            Ok((Self::load(path)?, false))
        } else {
            Ok((Self::parse(&file_name(path), EMPTY_DESCRIPTOR)?, true))
        }
    }

    /// Write the document atomically
    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        io_utils::write_atomic(path, &self.render())
    }

    /// Full file content, including the BOM if the source had one
    pub fn render(&self) -> String {
        if self.has_bom {
            format!("{BOM}{}", self.text)
        } else {
            self.text.clone()
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn groups(&self) -> &[DescriptorGroup] {
        &self.groups
    }

    /// Index of the first group of `kind` without a condition
    pub fn first_unconditional(&self, kind: GroupKind) -> Option<usize> {
        self.groups
            .iter()
            .position(|g| g.kind == kind && !g.is_conditional())
    }

    /// Re-derive spans after the text changed
    pub(crate) fn reparse(&mut self) -> Result<(), DescriptorError> {
        let (root, groups) = parse_structure(&self.context, &self.text)?;
        self.root = root;
        self.groups = groups;
        Ok(())
    }

    pub(crate) fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }
}

/// Generic element tree node used while parsing
struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    block: Block,
    children: Vec<Node>,
}

struct OpenFrame {
    name: String,
    attributes: Vec<(String, String)>,
    start: usize,
    content_start: usize,
    text: String,
    children: Vec<Node>,
}

fn parse_structure(
    context: &str,
    text: &str,
) -> Result<(Block, Vec<DescriptorGroup>), DescriptorError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<OpenFrame> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DescriptorError::malformed(context, reader.buffer_position(), e))?;
        let end = reader.buffer_position();

        match event {
            Event::Start(ref e) => {
                let start = tag_start(context, text, end)?;
                stack.push(OpenFrame {
                    name: element_name(e),
                    attributes: read_attributes(context, e, end)?,
                    start,
                    content_start: end,
                    text: String::new(),
                    children: Vec::new(),
                });
            }
            Event::Empty(ref e) => {
                let start = tag_start(context, text, end)?;
                let node = Node {
                    name: element_name(e),
                    attributes: read_attributes(context, e, end)?,
                    text: String::new(),
                    block: Block {
                        span: start..end,
                        content: None,
                    },
                    children: Vec::new(),
                };
                attach(&mut stack, &mut root, node);
            }
            Event::End(_) => {
                let close_start = tag_start(context, text, end)?;
                let Some(frame) = stack.pop() else {
                    return Err(DescriptorError::malformed(context, end, "unexpected end tag"));
                };
                let node = Node {
                    name: frame.name,
                    attributes: frame.attributes,
                    text: frame.text,
                    block: Block {
                        span: frame.start..end,
                        content: Some(frame.content_start..close_start),
                    },
                    children: frame.children,
                };
                attach(&mut stack, &mut root, node);
            }
            Event::Text(ref t) => {
                if let Some(frame) = stack.last_mut() {
                    let unescaped = t
                        .unescape()
                        .map_err(|e| DescriptorError::malformed(context, end, e))?;
                    frame.text.push_str(&unescaped);
                }
            }
            Event::CData(c) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(frame) = stack.pop() {
        return Err(DescriptorError::Unclosed {
            context: context.to_string(),
            element: frame.name,
        });
    }

    let root = root.ok_or_else(|| DescriptorError::MissingRoot {
        context: context.to_string(),
    })?;

    let groups = root
        .children
        .into_iter()
        .filter_map(|node| {
            let kind = GroupKind::from_element_name(&node.name)?;
            let condition = find_attribute(&node.attributes, attributes::CONDITION);
            let elements = node.children.into_iter().map(into_element).collect();
            Some(DescriptorGroup {
                kind,
                condition,
                elements,
                block: node.block,
            })
        })
        .collect();

    Ok((root.block, groups))
}

fn attach(stack: &mut [OpenFrame], root: &mut Option<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        // Only the first top-level element is the document root
        None if root.is_none() => *root = Some(node),
        None => {}
    }
}

fn into_element(node: Node) -> DescriptorElement {
    let children = node
        .children
        .into_iter()
        .map(|child| (child.name, child.text.trim().to_string()))
        .collect();
    DescriptorElement {
        name: node.name,
        attributes: node.attributes,
        children,
        text: node.text,
        block: node.block,
    }
}

fn find_attribute(attributes: &[(String, String)], name: &str) -> Option<String> {
    attributes
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn read_attributes(
    context: &str,
    e: &BytesStart<'_>,
    position: usize,
) -> Result<Vec<(String, String)>, DescriptorError> {
    let mut result = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| DescriptorError::malformed(context, position, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| DescriptorError::malformed(context, position, err))?
            .into_owned();
        result.push((key, value));
    }
    Ok(result)
}

/// Start of the tag that ends at `end`. Well-formed tags never contain a raw
/// `<`, so the nearest one before the tag end is its opening bracket.
fn tag_start(context: &str, text: &str, end: usize) -> Result<usize, DescriptorError> {
    text[..end]
        .rfind('<')
        .ok_or_else(|| DescriptorError::malformed(context, end, "tag without opening bracket"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = r#"<Project Sdk="Microsoft.NET.Sdk">

  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
    <Nullable>enable</Nullable>
    <Description>Fish &amp; chips</Description>
  </PropertyGroup>

  <PropertyGroup Condition="'$(Configuration)' == 'Release'">
    <Optimize>true</Optimize>
  </PropertyGroup>

  <ItemGroup>
    <PackageReference Include="Serilog" Version="3.1.0" PrivateAssets="all" />
    <PackageReference Include="Polly">
      <Version>8.2.0</Version>
    </PackageReference>
    <Using Include="System.Text" />
  </ItemGroup>

</Project>
"#;

    #[test]
    fn test_parse_groups_and_elements() {
        let doc = DescriptorDocument::parse("App.csproj", PROJECT).unwrap();
        let groups = doc.groups();
        assert_eq!(groups.len(), 3);

        assert_eq!(groups[0].kind, GroupKind::Property);
        assert!(!groups[0].is_conditional());
        let names: Vec<_> = groups[0].elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["TargetFramework", "Nullable", "Description"]);
        assert_eq!(groups[0].elements[2].value(), "Fish & chips");

        assert!(groups[1].is_conditional());
        assert_eq!(groups[2].kind, GroupKind::Item);
    }

    #[test]
    fn test_item_metadata_from_attributes_and_children() {
        let doc = DescriptorDocument::parse("App.csproj", PROJECT).unwrap();
        let items = &doc.groups()[2].elements;

        let serilog = items[0].metadata();
        assert_eq!(items[0].include(), Some("Serilog"));
        assert_eq!(serilog.get("Version"), Some("3.1.0"));
        assert_eq!(serilog.get("PrivateAssets"), Some("all"));
        assert_eq!(serilog.get("Include"), None);

        assert_eq!(items[1].metadata().get("Version"), Some("8.2.0"));
        assert!(items[2].metadata().is_empty());
    }

    #[test]
    fn test_spans_cover_exact_markup() {
        let doc = DescriptorDocument::parse("App.csproj", PROJECT).unwrap();
        let nullable = &doc.groups()[0].elements[1];
        assert_eq!(&doc.text()[nullable.block.span.clone()], "<Nullable>enable</Nullable>");

        let using = &doc.groups()[2].elements[2];
        assert_eq!(&doc.text()[using.block.span.clone()], r#"<Using Include="System.Text" />"#);
        assert!(using.block.content.is_none());
    }

    #[test]
    fn test_render_roundtrips_bom() {
        let source = format!("{BOM}<Project>\r\n  <PropertyGroup />\r\n</Project>");
        let doc = DescriptorDocument::parse("Bom.csproj", &source).unwrap();
        assert_eq!(doc.render(), source);
        assert_eq!(doc.groups().len(), 1);
        assert!(doc.groups()[0].elements.is_empty());
    }

    #[test]
    fn test_empty_condition_is_unconditional() {
        let doc = DescriptorDocument::parse(
            "App.csproj",
            r#"<Project><PropertyGroup Condition=""><A>1</A></PropertyGroup></Project>"#,
        )
        .unwrap();
        assert!(!doc.groups()[0].is_conditional());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let err = DescriptorDocument::parse("Bad.csproj", "<Project><PropertyGroup></Project>")
            .unwrap_err();
        assert!(matches!(err, DescriptorError::MalformedXml { .. }));

        let err = DescriptorDocument::parse("Open.csproj", "<Project><PropertyGroup>").unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::Unclosed { .. } | DescriptorError::MalformedXml { .. }
        ));

        let err = DescriptorDocument::parse("Empty.csproj", "   ").unwrap_err();
        assert!(matches!(err, DescriptorError::MissingRoot { .. }));
    }

    #[test]
    fn test_first_unconditional_skips_conditional_groups() {
        let doc = DescriptorDocument::parse(
            "App.csproj",
            r#"<Project>
  <PropertyGroup Condition="x"><A>1</A></PropertyGroup>
  <PropertyGroup><B>2</B></PropertyGroup>
</Project>"#,
        )
        .unwrap();
        assert_eq!(doc.first_unconditional(GroupKind::Property), Some(1));
        assert_eq!(doc.first_unconditional(GroupKind::Item), None);
    }
}
