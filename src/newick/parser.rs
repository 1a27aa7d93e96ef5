//! Newick format parsing.
//!
//! Recursive-descent parser over the grammar
//! - tree ::= subtree `;`
//! - subtree ::= `(` subtree (`,` subtree)* `)` label? length? | label? length?
//! - length ::= `:` number
//!
//! Whitespace may occur between elements; square-bracket comments are
//! skipped wherever whitespace is allowed. Labels may be quoted with
//! single quotes (doubled to embed a quote); quoting is required for
//! labels containing structure characters.

use crate::model::context::Context;
use crate::model::node::NodeIndex;
use crate::model::tree::Tree;
use std::error::Error as StdError;
use std::fmt;

/// Length of context snippet carried by parse errors
const ERROR_CONTEXT_LENGTH: usize = 50;

/// Bytes terminating an unquoted label
const LABEL_DELIMITERS: &[u8] = b"(),:;[ \t\n\r";

// =#========================================================================#=
// PARSE ERROR
// =#========================================================================#=
/// Error kinds that can occur while parsing a Newick string.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedEof,
    UnexpectedChar(char),
    InvalidBranchLength(String),
    InvalidLabel(String),
    UnclosedQuote,
    UnclosedComment,
    TrailingInput,
}

/// Newick parse error with position and surrounding context.
#[derive(Debug)]
pub struct ParseError {
    kind: ParseErrorKind,
    position: usize,
    context: String,
}

impl ParseError {
    /// The error kind.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Byte position in the input where the error occurred.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::UnexpectedEof => write!(f, "unexpected end of input")?,
            ParseErrorKind::UnexpectedChar(c) => write!(f, "unexpected character {c:?}")?,
            ParseErrorKind::InvalidBranchLength(msg) => {
                write!(f, "invalid branch length: {msg}")?
            }
            ParseErrorKind::InvalidLabel(msg) => write!(f, "invalid label: {msg}")?,
            ParseErrorKind::UnclosedQuote => write!(f, "unclosed quoted label")?,
            ParseErrorKind::UnclosedComment => write!(f, "unclosed comment")?,
            ParseErrorKind::TrailingInput => write!(f, "trailing input after tree")?,
        }
        write!(f, " at position {}", self.position)?;
        if !self.context.is_empty() {
            write!(f, "\n  Context: {}", self.context)?;
        }
        Ok(())
    }
}

impl StdError for ParseError {}

// =#========================================================================#=
// PARSER
// =#========================================================================#=
/// Parses a single Newick string into a [Tree].
///
/// # Example
/// ```
/// use phylodata::model::context::Context;
/// use phylodata::newick;
///
/// let mut ctx = Context::new();
/// let tree = newick::parse_str(&mut ctx, "(A:1,(B:1,C:1):1):0;").unwrap();
/// assert_eq!(tree.num_terminals(), 3);
/// assert!(tree.is_valid());
/// ```
pub fn parse_str(ctx: &mut Context, text: &str) -> Result<Tree, ParseError> {
    let mut cursor = Cursor {
        bytes: text.as_bytes(),
        position: 0,
    };
    let mut tree = Tree::new(ctx);

    let root = cursor.parse_subtree(ctx, &mut tree)?;
    tree.set_root(root)
        .expect("freshly parsed node is detached");

    cursor.skip_trivia()?;
    match cursor.peek() {
        Some(b';') => cursor.advance(),
        Some(c) => return Err(cursor.error(ParseErrorKind::UnexpectedChar(c as char))),
        None => return Err(cursor.error(ParseErrorKind::UnexpectedEof)),
    }
    cursor.skip_trivia()?;
    if cursor.peek().is_some() {
        return Err(cursor.error(ParseErrorKind::TrailingInput));
    }

    Ok(tree)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        let rest = &self.bytes[self.position.min(self.bytes.len())..];
        let snippet = &rest[..rest.len().min(ERROR_CONTEXT_LENGTH)];
        ParseError {
            kind,
            position: self.position,
            context: String::from_utf8_lossy(snippet).into_owned(),
        }
    }

    /// Skips whitespace and square-bracket comments.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => self.advance(),
                Some(b'[') => {
                    let start = self.position;
                    while let Some(c) = self.peek() {
                        self.advance();
                        if c == b']' {
                            break;
                        }
                    }
                    if self.bytes.get(self.position - 1) != Some(&b']') {
                        self.position = start;
                        return Err(self.error(ParseErrorKind::UnclosedComment));
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_subtree(&mut self, ctx: &mut Context, tree: &mut Tree) -> Result<NodeIndex, ParseError> {
        self.skip_trivia()?;
        let node = tree.add_node(ctx);

        if self.peek() == Some(b'(') {
            self.advance();
            loop {
                let child = self.parse_subtree(ctx, tree)?;
                tree.attach_child(node, child)
                    .expect("freshly parsed child is detached");
                self.skip_trivia()?;
                match self.peek() {
                    Some(b',') => self.advance(),
                    Some(b')') => {
                        self.advance();
                        break;
                    }
                    Some(c) => return Err(self.error(ParseErrorKind::UnexpectedChar(c as char))),
                    None => return Err(self.error(ParseErrorKind::UnexpectedEof)),
                }
            }
        }

        self.skip_trivia()?;
        if let Some(label) = self.parse_label()? {
            tree[node]
                .set_name(&label)
                .map_err(|e| self.error(ParseErrorKind::InvalidLabel(e.to_string())))?;
        }

        self.skip_trivia()?;
        if self.peek() == Some(b':') {
            self.advance();
            self.skip_trivia()?;
            let token = self.take_until_delimiter();
            let length: f64 = token
                .parse()
                .map_err(|_| self.error(ParseErrorKind::InvalidBranchLength(token.clone())))?;
            tree[node]
                .set_branch_length(Some(length))
                .map_err(|e| self.error(ParseErrorKind::InvalidBranchLength(e.to_string())))?;
        }

        Ok(node)
    }

    /// Parses an optional label, quoted or unquoted.
    fn parse_label(&mut self) -> Result<Option<String>, ParseError> {
        match self.peek() {
            Some(b'\'') => {
                self.advance();
                let mut label: Vec<u8> = Vec::new();
                loop {
                    match self.peek() {
                        Some(b'\'') => {
                            self.advance();
                            // doubled quote embeds a quote
                            if self.peek() == Some(b'\'') {
                                self.advance();
                                label.push(b'\'');
                            } else {
                                return Ok(Some(String::from_utf8_lossy(&label).into_owned()));
                            }
                        }
                        Some(c) => {
                            self.advance();
                            label.push(c);
                        }
                        None => return Err(self.error(ParseErrorKind::UnclosedQuote)),
                    }
                }
            }
            Some(c) if !LABEL_DELIMITERS.contains(&c) => {
                let label = self.take_until_delimiter();
                Ok(Some(label))
            }
            _ => Ok(None),
        }
    }

    fn take_until_delimiter(&mut self) -> String {
        let start = self.position;
        while let Some(c) = self.peek() {
            if LABEL_DELIMITERS.contains(&c) {
                break;
            }
            self.advance();
        }
        String::from_utf8_lossy(&self.bytes[start..self.position]).into_owned()
    }
}
