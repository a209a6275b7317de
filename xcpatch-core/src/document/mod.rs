//! A project descriptor: its text plus a lightweight parsed tree.
//!
//! The tree is only used to *find* places in the text. Edits are splices into
//! the original text, so formatting, comments and section sentinels outside
//! the inserted lines are preserved byte for byte.

mod lexer;

use std::collections::HashMap;

pub use lexer::{is_bare_char, line_of};
use lexer::{Lexer, Token, TokenKind};

use crate::error::{AnchorError, DocumentError};
use crate::models::{section_begin, section_end, Anchor};

/// Byte range `[start, end)` in the descriptor text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    List(Vec<Node>),
    /// Entries in document order.
    Dict(Vec<(String, Node)>),
}

/// A value and the span it covers. For lists and dictionaries the span runs
/// from the opening delimiter through the closing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub value: Value,
    pub span: Span,
}

impl Node {
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match &self.value {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&[(String, Node)]> {
        match &self.value {
            Value::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Value of `key` if this is a dictionary containing it.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_dict()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Offset of the closing delimiter of a list or dictionary.
    fn close_offset(&self) -> usize {
        self.span.end - 1
    }
}

/// One entry of the root `objects` dictionary.
#[derive(Debug, Clone, Copy)]
pub struct Object<'a> {
    pub id: &'a str,
    pub node: &'a Node,
}

impl<'a> Object<'a> {
    pub fn isa(&self) -> Option<&'a str> {
        self.str("isa")
    }

    pub fn get(&self, key: &str) -> Option<&'a Node> {
        self.node.get(key)
    }

    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.node.get(key)?.as_str()
    }

    /// String items of a list-valued key. Missing key yields an empty list.
    pub fn list(&self, key: &str) -> Vec<&'a str> {
        self.node
            .get(key)
            .and_then(Node::as_list)
            .map(|items| items.iter().filter_map(Node::as_str).collect())
            .unwrap_or_default()
    }
}

/// Where to splice text for a resolved anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionPoint {
    pub offset: usize,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// The anchor starts its own line; insert whole lines at `offset`.
    LineStart,
    /// The anchor shares its line with other content. Inserted lines are
    /// preceded by a newline and followed by a newline plus `indent` so the
    /// anchor lands on its own line.
    Inline { indent: String },
}

impl InsertionPoint {
    /// Render `lines` (already indented, without newlines) for this point.
    pub fn render(&self, lines: &[String]) -> String {
        if lines.is_empty() {
            return String::new();
        }
        let body = lines.join("\n");
        match &self.layout {
            Layout::LineStart => format!("{}\n", body),
            Layout::Inline { indent } => format!("\n{}\n{}", body, indent),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    root: Node,
    objects: HashMap<String, Vec<usize>>,
}

impl Document {
    pub fn parse(text: impl Into<String>) -> Result<Self, DocumentError> {
        let text = text.into();
        let root = {
            let mut parser = Parser::new(&text);
            let root = parser.value("root dictionary")?;
            if let Some(token) = parser.next()? {
                return Err(DocumentError::TrailingContent {
                    line: line_of(&text, token.start),
                });
            }
            root
        };

        let entries = root
            .get("objects")
            .and_then(Node::as_dict)
            .ok_or(DocumentError::MissingObjects)?;

        let mut objects: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, (id, _)) in entries.iter().enumerate() {
            objects.entry(id.clone()).or_default().push(i);
        }

        Ok(Self {
            text,
            root,
            objects,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    pub fn line_of(&self, offset: usize) -> usize {
        line_of(&self.text, offset)
    }

    fn objects_node(&self) -> &Node {
        // Checked in `parse`.
        self.root
            .get("objects")
            .unwrap_or(&self.root)
    }

    fn object_entries(&self) -> &[(String, Node)] {
        self.objects_node().as_dict().unwrap_or(&[])
    }

    /// The object with this id, if it is defined exactly once.
    pub fn object(&self, id: &str) -> Option<Object<'_>> {
        match self.objects.get(id).map(Vec::as_slice) {
            Some([i]) => {
                let (id, node) = &self.object_entries()[*i];
                Some(Object { id, node })
            }
            _ => None,
        }
    }

    /// The `PBXProject` named by `rootObject`.
    pub fn root_object(&self) -> Option<Object<'_>> {
        let id = self.root.get("rootObject")?.as_str()?;
        self.object(id)
    }

    pub fn objects(&self) -> impl Iterator<Item = Object<'_>> {
        self.object_entries()
            .iter()
            .map(|(id, node)| Object { id, node })
    }

    pub fn objects_of_isa<'a>(&'a self, isa: &'a str) -> impl Iterator<Item = Object<'a>> + 'a {
        self.objects().filter(move |o| o.isa() == Some(isa))
    }

    /// Find where lines for `anchor` go. The anchor must match exactly once.
    pub fn resolve(&self, anchor: &Anchor) -> Result<InsertionPoint, AnchorError> {
        let offset = match anchor {
            Anchor::SectionEnd { isa } => self.unique_sentinel(anchor, &section_end(isa))?,
            Anchor::NewSection { isa } => self.new_section_offset(anchor, isa)?,
            Anchor::ObjectList { object, keys } => {
                let node = self.walk(anchor, object.as_str(), keys)?;
                if node.as_list().is_none() {
                    return Err(AnchorError::WrongKind {
                        anchor: anchor.clone(),
                        expected: "list",
                    });
                }
                node.close_offset()
            }
            Anchor::ObjectDict { object, keys } => {
                let node = self.walk(anchor, object.as_str(), keys)?;
                if node.as_dict().is_none() {
                    return Err(AnchorError::WrongKind {
                        anchor: anchor.clone(),
                        expected: "dictionary",
                    });
                }
                node.close_offset()
            }
        };

        Ok(self.insertion_point(offset))
    }

    fn walk(&self, anchor: &Anchor, id: &str, keys: &[String]) -> Result<&Node, AnchorError> {
        let count = self.objects.get(id).map_or(0, Vec::len);
        if count > 1 {
            return Err(AnchorError::Ambiguous {
                anchor: anchor.clone(),
                count,
            });
        }
        let mut node = self
            .object(id)
            .ok_or_else(|| AnchorError::NotFound {
                anchor: anchor.clone(),
            })?
            .node;

        for key in keys {
            node = node.get(key).ok_or_else(|| AnchorError::NotFound {
                anchor: anchor.clone(),
            })?;
        }
        Ok(node)
    }

    /// Offset of a sentinel comment that must appear once inside `objects`.
    fn unique_sentinel(&self, anchor: &Anchor, sentinel: &str) -> Result<usize, AnchorError> {
        let span = self.objects_node().span;
        let matches: Vec<usize> = self
            .text
            .match_indices(sentinel)
            .map(|(i, _)| i)
            .filter(|&i| i > span.start && i < span.end)
            .collect();

        match matches.as_slice() {
            [] => Err(AnchorError::NotFound {
                anchor: anchor.clone(),
            }),
            [offset] => Ok(*offset),
            _ => Err(AnchorError::Ambiguous {
                anchor: anchor.clone(),
                count: matches.len(),
            }),
        }
    }

    /// Sections are kept sorted by isa. A new section goes before the first
    /// existing section that sorts after it, or at the end of `objects`.
    fn new_section_offset(&self, anchor: &Anchor, isa: &str) -> Result<usize, AnchorError> {
        if self.text.contains(&section_begin(isa)) {
            return Err(AnchorError::Ambiguous {
                anchor: anchor.clone(),
                count: 1,
            });
        }

        let objects = self.objects_node();
        let (start, end) = (objects.span.start, objects.close_offset());
        let region = &self.text[start..end];

        let next = region.match_indices("/* Begin ").find_map(|(i, _)| {
            let rest = &region[i + "/* Begin ".len()..];
            let name = rest.split(" section */").next()?;
            (name > isa).then_some(start + i)
        });

        Ok(next.unwrap_or(end))
    }

    fn insertion_point(&self, offset: usize) -> InsertionPoint {
        let line_start = self.text[..offset].rfind('\n').map_or(0, |i| i + 1);
        let before = &self.text[line_start..offset];

        if before.chars().all(char::is_whitespace) {
            InsertionPoint {
                offset: line_start,
                layout: Layout::LineStart,
            }
        } else {
            let indent: String = before
                .chars()
                .take_while(|c| c.is_whitespace())
                .collect();
            InsertionPoint {
                offset,
                layout: Layout::Inline { indent },
            }
        }
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Token>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lexer: Lexer::new(text),
            peeked: None,
        }
    }

    fn next(&mut self) -> Result<Option<Token>, DocumentError> {
        match self.peeked.take() {
            Some(token) => Ok(Some(token)),
            None => self.lexer.next_token(),
        }
    }

    fn peek(&mut self) -> Result<Option<&Token>, DocumentError> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next_token()?;
        }
        Ok(self.peeked.as_ref())
    }

    fn expect_next(&mut self, expected: &'static str) -> Result<Token, DocumentError> {
        self.next()?
            .ok_or(DocumentError::UnexpectedEof { expected })
    }

    fn unexpected(&self, token: &Token, expected: &'static str) -> DocumentError {
        DocumentError::UnexpectedToken {
            line: line_of(self.lexer.text(), token.start),
            expected,
            found: token.kind.describe(),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, DocumentError> {
        let token = self.expect_next(expected)?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.unexpected(&token, expected))
        }
    }

    fn value(&mut self, expected: &'static str) -> Result<Node, DocumentError> {
        let token = self.expect_next(expected)?;
        match token.kind {
            TokenKind::String(s) => Ok(Node {
                value: Value::String(s),
                span: Span {
                    start: token.start,
                    end: token.end,
                },
            }),
            TokenKind::LBrace => self.dict(token.start),
            TokenKind::LParen => self.list(token.start),
            _ => Err(self.unexpected(&token, expected)),
        }
    }

    fn dict(&mut self, start: usize) -> Result<Node, DocumentError> {
        let mut entries = Vec::new();
        loop {
            let token = self.expect_next("key or `}`")?;
            match token.kind {
                TokenKind::RBrace => {
                    return Ok(Node {
                        value: Value::Dict(entries),
                        span: Span {
                            start,
                            end: token.end,
                        },
                    })
                }
                TokenKind::String(key) => {
                    self.expect(TokenKind::Equals, "`=`")?;
                    let value = self.value("value")?;
                    self.expect(TokenKind::Semicolon, "`;`")?;
                    entries.push((key, value));
                }
                _ => return Err(self.unexpected(&token, "key or `}`")),
            }
        }
    }

    fn list(&mut self, start: usize) -> Result<Node, DocumentError> {
        let mut items = Vec::new();
        loop {
            if let Some(token) = self.peek()? {
                if token.kind == TokenKind::RParen {
                    let end = token.end;
                    self.peeked = None;
                    return Ok(Node {
                        value: Value::List(items),
                        span: Span { start, end },
                    });
                }
            }

            items.push(self.value("list item or `)`")?);

            let token = self.expect_next("`,` or `)`")?;
            match token.kind {
                TokenKind::Comma => {}
                TokenKind::RParen => {
                    return Ok(Node {
                        value: Value::List(items),
                        span: Span {
                            start,
                            end: token.end,
                        },
                    })
                }
                _ => return Err(self.unexpected(&token, "`,` or `)`")),
            }
        }
    }
}
