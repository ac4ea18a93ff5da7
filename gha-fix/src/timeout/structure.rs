//! Read-only YAML tree used to locate jobs by line.
//!
//! The tree is only ever queried for positions. It is never serialized back,
//! so quoting, comments and spacing of the source text are untouched.

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, ScanError};

/// Where a node starts in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,

    /// 1-based column.
    pub column: usize,
}

impl From<Marker> for Position {
    fn from(marker: Marker) -> Self {
        Self {
            line: marker.line(),
            column: marker.col() + 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeKind {
    Scalar(String),
    Mapping(Vec<(Node, Node)>),
    Sequence(Vec<Node>),
    Alias,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) start: Position,
}

impl Node {
    /// Entries of a mapping node.
    pub(crate) fn as_mapping(&self) -> Option<&[(Node, Node)]> {
        match &self.kind {
            NodeKind::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Scalar text, or an empty string for anything else.
    pub(crate) fn key_str(&self) -> &str {
        match &self.kind {
            NodeKind::Scalar(value) => value,
            _ => "",
        }
    }
}

enum Frame {
    Mapping {
        start: Position,
        entries: Vec<(Node, Node)>,
        key: Option<Node>,
    },
    Sequence {
        start: Position,
        items: Vec<Node>,
    },
}

impl Frame {
    fn into_node(self) -> Node {
        match self {
            Self::Mapping { start, entries, .. } => Node {
                kind: NodeKind::Mapping(entries),
                start,
            },
            Self::Sequence { start, items } => Node {
                kind: NodeKind::Sequence(items),
                start,
            },
        }
    }
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    documents: Vec<Node>,
}

impl TreeBuilder {
    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => self.documents.push(node),
            Some(Frame::Mapping { entries, key, .. }) => match key.take() {
                Some(key) => entries.push((key, node)),
                None => *key = Some(node),
            },
            Some(Frame::Sequence { items, .. }) => items.push(node),
        }
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, event: Event, marker: Marker) {
        let start = Position::from(marker);
        match event {
            Event::Scalar(value, ..) => self.attach(Node {
                kind: NodeKind::Scalar(value),
                start,
            }),
            Event::Alias(..) => self.attach(Node {
                kind: NodeKind::Alias,
                start,
            }),
            Event::MappingStart(..) => self.stack.push(Frame::Mapping {
                start,
                entries: Vec::new(),
                key: None,
            }),
            Event::SequenceStart(..) => self.stack.push(Frame::Sequence {
                start,
                items: Vec::new(),
            }),
            Event::MappingEnd | Event::SequenceEnd => {
                if let Some(frame) = self.stack.pop() {
                    let node = frame.into_node();
                    self.attach(node);
                }
            }
            _ => {}
        }
    }
}

/// Parses every document in `content` into a node tree.
pub(crate) fn parse_documents(content: &str) -> Result<Vec<Node>, ScanError> {
    let mut builder = TreeBuilder::default();
    let mut parser = Parser::new(content.chars());
    parser.load(&mut builder, true)?;
    Ok(builder.documents)
}
