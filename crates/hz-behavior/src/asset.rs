//! The XML tree asset.
//!
//! ```xml
//! <BehaviorTree>
//!   <Root Type="SEL_Sequencer" Name="Root" ID="0">
//!     <Chase Type="LEF_MoveTo" Name="Chase" ID="1" TargetBBKey="Player" MoveSpeed="0"/>
//!     <Idle Type="LEF_Idle" Name="Idle" ID="2" IdleTime="3" IdleTimeRandom="1"/>
//!   </Root>
//! </BehaviorTree>
//! ```
//!
//! The root is always a `<Root>` element; every other node is an element
//! named after the node (see [`element_name`]) nested under its parent.
//! `Type`, `Name`, and `ID` come first, then the type's own fields.
//! `<param>` elements are editor metadata and are skipped with their
//! contents.  Empty attributes keep the field default; attributes the type
//! does not declare are logged and ignored.

use std::path::Path;

use hz_core::NodeId;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, trace};

use crate::tree::ROOT;
use crate::{BehaviorError, BehaviorResult, BehaviorTree, Node, NodeIdx, NodeKind, TreeBuilder};

pub const DOCUMENT_ELEMENT: &str = "BehaviorTree";
pub const ROOT_ELEMENT: &str = "Root";
const PARAM_ELEMENT: &str = "param";

fn xml_err(e: impl std::fmt::Display) -> BehaviorError {
    BehaviorError::Xml(e.to_string())
}

/// Element name for a non-root node: its name with whitespace replaced by
/// `_`, or its type name when the name is unusable as a tag.
pub fn element_name(node: &Node) -> String {
    let sanitized: String = node
        .name
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect();
    let starts_with_letter = sanitized.chars().next().is_some_and(|c| c.is_alphabetic());
    if !starts_with_letter || sanitized == ROOT_ELEMENT || sanitized == PARAM_ELEMENT {
        node.type_name().to_owned()
    } else {
        sanitized
    }
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// What an open element turned out to be.
#[derive(Copy, Clone)]
enum Slot {
    /// Document wrapper, before `<Root>` or after it closed.
    Outside,
    Node(usize),
    /// A `<param>` element or anything inside one.
    Skipped,
}

#[derive(Default)]
struct Parser {
    parsed: Vec<(Option<usize>, Node)>,
    open:   Vec<Slot>,
}

impl Parser {
    fn open_element(&mut self, e: &BytesStart<'_>) -> BehaviorResult<Slot> {
        if matches!(self.open.last(), Some(Slot::Skipped)) || e.name().as_ref() == PARAM_ELEMENT.as_bytes() {
            return Ok(Slot::Skipped);
        }
        let parent = match self.open.last() {
            Some(&Slot::Node(p)) => Some(p),
            _ if e.name().as_ref() == ROOT_ELEMENT.as_bytes() && self.parsed.is_empty() => None,
            _ => return Ok(Slot::Outside),
        };
        let node = parse_node(e)?;
        self.parsed.push((parent, node));
        Ok(Slot::Node(self.parsed.len() - 1))
    }
}

fn parse_node(e: &BytesStart<'_>) -> BehaviorResult<Node> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut type_name = None;
    let mut name = None;
    let mut id = NodeId::INVALID;
    let mut fields = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        match key.as_str() {
            "Type" => type_name = Some(value),
            "Name" => name = Some(value),
            "ID" if value.trim().is_empty() => {}
            "ID" => {
                id = value
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(NodeId::from_signed)
                    .ok_or_else(|| BehaviorError::MalformedAttribute {
                        node:      name.clone().unwrap_or_else(|| tag.clone()),
                        attribute: key.clone(),
                        value:     value.clone(),
                        reason:    "not a node id".to_owned(),
                    })?;
            }
            _ => fields.push((key, value)),
        }
    }

    let name = name.unwrap_or(tag);
    let Some(type_name) = type_name else {
        return Err(BehaviorError::MalformedAttribute {
            node:      name,
            attribute: "Type".to_owned(),
            value:     String::new(),
            reason:    "missing".to_owned(),
        });
    };
    let mut kind = NodeKind::from_type_name(&type_name).ok_or(BehaviorError::UnknownNodeType(type_name))?;

    for (attribute, value) in fields {
        if value.is_empty() {
            continue;
        }
        match kind.read_field(&attribute, &value) {
            Ok(true) => {}
            Ok(false) => trace!(node = %name, %attribute, "ignoring undeclared attribute"),
            Err(reason) => {
                return Err(BehaviorError::MalformedAttribute { node: name, attribute, value, reason });
            }
        }
    }

    let mut node = Node::new(name, kind);
    node.id = id;
    Ok(node)
}

/// Parse a tree asset.
pub fn parse_tree(name: &str, xml: &str) -> BehaviorResult<BehaviorTree> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut parser = Parser::default();

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => {
                let slot = parser.open_element(&e)?;
                parser.open.push(slot);
            }
            Event::Empty(e) => {
                parser.open_element(&e)?;
            }
            Event::End(_) => {
                parser.open.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut parsed = parser.parsed.into_iter();
    let Some((_, root)) = parsed.next() else {
        return Err(BehaviorError::MissingRoot);
    };
    let mut builder = TreeBuilder::new(name, root);
    for (parent, node) in parsed {
        builder.child(NodeIdx(parent.unwrap_or_default() as u32), node);
    }
    let tree = builder.build()?;
    debug!(tree = name, nodes = tree.len(), "parsed behavior tree");
    Ok(tree)
}

// ── Writing ───────────────────────────────────────────────────────────────────

enum Visit {
    Open(NodeIdx),
    Close(String),
}

fn node_element(tree: &BehaviorTree, ix: NodeIdx) -> (String, BytesStart<'static>) {
    let node = tree.node(ix);
    let tag = if ix == ROOT { ROOT_ELEMENT.to_owned() } else { element_name(node) };
    let mut elem = BytesStart::new(tag.clone());
    elem.push_attribute(("Type", node.type_name()));
    elem.push_attribute(("Name", node.name.as_str()));
    elem.push_attribute(("ID", node.id.to_signed().to_string().as_str()));

    let mut fields = Vec::new();
    node.kind.write_fields(&mut fields);
    for (attribute, value) in &fields {
        elem.push_attribute((*attribute, value.as_str()));
    }
    (tag, elem)
}

/// Serialize a tree's structure and parameters.  Runtime state is not
/// written.
pub fn write_tree(tree: &BehaviorTree) -> BehaviorResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new(DOCUMENT_ELEMENT)))
        .map_err(xml_err)?;

    let mut stack = vec![Visit::Open(ROOT)];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Open(ix) => {
                let (tag, elem) = node_element(tree, ix);
                let children = tree.node(ix).children();
                if children.is_empty() {
                    writer.write_event(Event::Empty(elem)).map_err(xml_err)?;
                    continue;
                }
                writer.write_event(Event::Start(elem)).map_err(xml_err)?;
                stack.push(Visit::Close(tag));
                stack.extend(children.iter().rev().map(|&c| Visit::Open(c)));
            }
            Visit::Close(tag) => {
                writer.write_event(Event::End(BytesEnd::new(tag))).map_err(xml_err)?;
            }
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(DOCUMENT_ELEMENT)))
        .map_err(xml_err)?;
    String::from_utf8(writer.into_inner()).map_err(xml_err)
}

// ── Asset ─────────────────────────────────────────────────────────────────────

/// A loaded tree asset.  Agents never run the prototype; each gets its own
/// [`instantiate`](Self::instantiate)d copy.
#[derive(Clone, Debug)]
pub struct BehaviorAsset {
    prototype: BehaviorTree,
}

impl BehaviorAsset {
    pub fn new(prototype: BehaviorTree) -> Self {
        Self { prototype }
    }

    pub fn from_xml(name: &str, xml: &str) -> BehaviorResult<Self> {
        parse_tree(name, xml).map(Self::new)
    }

    /// Load from disk.  The tree is named after the file stem.
    pub fn load_file(path: impl AsRef<Path>) -> BehaviorResult<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path)?;
        let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        Self::from_xml(&name, &xml)
    }

    pub fn save_file(&self, path: impl AsRef<Path>) -> BehaviorResult<()> {
        std::fs::write(path, self.to_xml()?)?;
        Ok(())
    }

    pub fn to_xml(&self) -> BehaviorResult<String> {
        write_tree(&self.prototype)
    }

    pub fn name(&self) -> &str {
        self.prototype.name()
    }

    pub fn prototype(&self) -> &BehaviorTree {
        &self.prototype
    }

    pub fn instantiate(&self) -> BehaviorTree {
        self.prototype.deep_copy()
    }
}
