//! Parser and evaluator for the XPath subset used by generated locators.
//!
//! Supported grammar:
//!
//! ```text
//! path      := step+
//! step      := ("/" | "//") ( NAME | "*" ) predicate*
//! predicate := "[" NUMBER "]"
//!            | "[" "@" NAME "=" LITERAL "]"
//!            | "[" "text()" "=" LITERAL "]"
//!            | "[" "contains(" ( "text()" | "@" NAME ) "," LITERAL ")" "]"
//! ```
//!
//! Everything else is rejected with [`ScanError::InvalidXPath`].

use crate::dom::tree::{DomTree, NodeId};
use crate::error::{Result, ScanError};
use std::str::FromStr;

/// A parsed location path
#[derive(Debug, Clone, PartialEq)]
pub struct XPath {
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Child,
    DescendantOrSelf,
}

#[derive(Debug, Clone, PartialEq)]
enum NodeTest {
    Any,
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Position(usize),
    AttributeEquals(String, String),
    AttributeContains(String, String),
    TextEquals(String),
    TextContains(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

impl XPath {
    pub fn parse(expression: &str) -> Result<Self> {
        Parser::new(expression).parse()
    }

    /// Nodes selected by this path, in document order without duplicates
    pub fn evaluate(&self, tree: &DomTree) -> Vec<NodeId> {
        let mut context = vec![tree.document()];

        for step in &self.steps {
            let origins = match step.axis {
                Axis::Child => context,
                Axis::DescendantOrSelf => {
                    let mut expanded = Vec::new();
                    for node in context {
                        expanded.push(node);
                        expanded.extend(tree.descendants(node));
                    }
                    expanded.sort_unstable();
                    expanded.dedup();
                    expanded
                }
            };

            let mut next = Vec::new();
            for origin in origins {
                let mut matched: Vec<NodeId> = tree
                    .element_children(origin)
                    .filter(|&child| step.test.matches(tree.tag_name(child)))
                    .collect();

                for predicate in &step.predicates {
                    matched = predicate.apply(tree, matched);
                }
                next.extend(matched);
            }

            next.sort_unstable();
            next.dedup();
            context = next;
        }

        context
    }
}

impl FromStr for XPath {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        XPath::parse(s)
    }
}

impl NodeTest {
    fn matches(&self, tag: &str) -> bool {
        match self {
            NodeTest::Any => true,
            NodeTest::Name(name) => tag.eq_ignore_ascii_case(name),
        }
    }
}

impl Predicate {
    fn apply(&self, tree: &DomTree, nodes: Vec<NodeId>) -> Vec<NodeId> {
        match self {
            Predicate::Position(position) => nodes.get(position - 1).copied().into_iter().collect(),
            _ => nodes.into_iter().filter(|&node| self.holds(tree, node)).collect(),
        }
    }

    fn holds(&self, tree: &DomTree, node: NodeId) -> bool {
        match self {
            Predicate::Position(_) => true,
            Predicate::AttributeEquals(name, value) => {
                tree.attribute(node, name) == Some(value.as_str())
            }
            Predicate::AttributeContains(name, value) => {
                tree.attribute(node, name).unwrap_or_default().contains(value.as_str())
            }
            Predicate::TextEquals(value) => tree.text_children(node).any(|text| text == value),
            Predicate::TextContains(value) => tree
                .text_children(node)
                .next()
                .unwrap_or_default()
                .contains(value.as_str()),
        }
    }
}

struct Parser<'a> {
    expression: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> Self {
        Self {
            expression,
            chars: expression.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> ScanError {
        ScanError::invalid_xpath(self.expression, reason)
    }

    fn parse(mut self) -> Result<XPath> {
        self.skip_whitespace();
        if self.at_end() {
            return Err(self.error("empty expression"));
        }

        let mut steps = Vec::new();
        while !self.at_end() {
            steps.push(self.step()?);
            self.skip_whitespace();
        }

        Ok(XPath { steps })
    }

    fn step(&mut self) -> Result<Step> {
        let axis = if self.eat_str("//") {
            Axis::DescendantOrSelf
        } else if self.eat('/') {
            Axis::Child
        } else {
            return Err(self.error(format!("expected '/' at offset {}", self.pos)));
        };

        self.skip_whitespace();
        let test = if self.eat('*') {
            NodeTest::Any
        } else {
            NodeTest::Name(self.name()?)
        };

        let mut predicates = Vec::new();
        loop {
            self.skip_whitespace();
            if !self.eat('[') {
                break;
            }
            predicates.push(self.predicate()?);
        }

        Ok(Step { axis, test, predicates })
    }

    fn predicate(&mut self) -> Result<Predicate> {
        self.skip_whitespace();

        let predicate = if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let position = self.number()?;
            if position == 0 {
                return Err(self.error("positions start at 1"));
            }
            Predicate::Position(position)
        } else if self.eat('@') {
            let name = self.name()?;
            self.expect('=')?;
            Predicate::AttributeEquals(name, self.literal()?)
        } else if self.eat_str("text()") {
            self.expect('=')?;
            Predicate::TextEquals(self.literal()?)
        } else if self.eat_str("contains") {
            self.expect('(')?;
            self.skip_whitespace();
            let attribute = if self.eat_str("text()") {
                None
            } else if self.eat('@') {
                Some(self.name()?)
            } else {
                return Err(self.error("contains() supports text() or an attribute"));
            };
            self.expect(',')?;
            let value = self.literal()?;
            self.expect(')')?;
            match attribute {
                Some(name) => Predicate::AttributeContains(name, value),
                None => Predicate::TextContains(value),
            }
        } else {
            return Err(self.error(format!("unsupported predicate at offset {}", self.pos)));
        };

        self.expect(']')
            .map_err(|_| self.error("unterminated predicate"))?;
        Ok(predicate)
    }

    fn name(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let valid = if self.pos == start {
                c.is_ascii_alphabetic() || c == '_'
            } else {
                c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
            };
            if !valid {
                break;
            }
            self.pos += 1;
        }

        if self.pos == start {
            return Err(self.error(format!("expected a name at offset {}", start)));
        }
        Ok(self.chars[start..self.pos].iter().collect::<String>().to_ascii_lowercase())
    }

    fn number(&mut self) -> Result<usize> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .parse()
            .map_err(|_| self.error("position out of range"))
    }

    fn literal(&mut self) -> Result<String> {
        self.skip_whitespace();
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => {
                let reason = format!("expected a string literal at offset {}", self.pos);
                return Err(self.error(reason));
            }
        };
        self.pos += 1;

        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                let value = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                return Ok(value);
            }
            self.pos += 1;
        }
        Err(self.error("unterminated string literal"))
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}' at offset {}", expected, self.pos)))
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, expected: &str) -> bool {
        let len = expected.chars().count();
        let matches = self.pos + len <= self.chars.len()
            && self.chars[self.pos..self.pos + len].iter().copied().eq(expected.chars());
        if matches {
            self.pos += len;
        }
        matches
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }
}
