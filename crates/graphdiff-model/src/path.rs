//! Paths: addresses of locations in an object graph.
//!
//! A [`Path`] is an immutable sequence of [`Element`]s leading from the
//! comparison root to a node. It does not belong to any particular graph;
//! the same path can be resolved against the working graph or the base
//! graph with [`Path::resolve`].
//!
//! # Text form
//!
//! - `/` is the root path.
//! - `/name` selects the member `name` of a bean.
//! - `[item]` selects a collection element equal to `item` (the key, for
//!   maps). Repeated equal items in a sequence are told apart with
//!   `[item#n]`, where `n` counts from zero.
//! - Text items are double-quoted, with `\` escaping `"` and `\`. Floats
//!   always print with a fraction or an exponent, so `["1"]`, `[1]`, and
//!   `[1.0]` are three different items.
//!
//! For example `/orders[42]/lines[3#1]/tags["red"]`.

use std::cmp::Ordering;
use std::fmt::{self, Write as _};

use crate::error::{ModelError, ModelResult};
use crate::introspect::Introspector;
use crate::value::Value;

/// One step of a path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    /// A named member of a bean.
    Property(String),
    /// An element of a sequence, set, or map, identified by a reference
    /// value rather than by position. `occurrence` counts earlier equal
    /// items in the same sequence.
    Collection { item: Value, occurrence: usize },
}

impl Element {
    pub fn property(name: impl Into<String>) -> Self {
        Self::Property(name.into())
    }

    /// The first collection element equal to `item`.
    pub fn item(item: impl Into<Value>) -> Self {
        Self::Collection {
            item: item.into(),
            occurrence: 0,
        }
    }

    /// The `occurrence`-th collection element equal to `item`.
    pub fn nth_item(item: impl Into<Value>, occurrence: usize) -> Self {
        Self::Collection {
            item: item.into(),
            occurrence,
        }
    }

    pub fn as_property(&self) -> Option<&str> {
        match self {
            Self::Property(name) => Some(name),
            Self::Collection { .. } => None,
        }
    }

    /// Step from `value` along this element.
    pub fn resolve(&self, value: &Value, introspector: &dyn Introspector) -> Option<Value> {
        match self {
            Self::Property(name) => {
                let bean = value.as_bean()?;
                introspector.member(&bean.bean_type(), name)?.read(bean)
            }
            Self::Collection { item, occurrence } => match value {
                Value::Seq(items) | Value::Set(items) => {
                    items.iter().filter(|v| *v == item).nth(*occurrence).cloned()
                }
                Value::Map(entries) if *occurrence == 0 => entries
                    .iter()
                    .find(|(key, _)| key == item)
                    .map(|(_, v)| v.clone()),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(name) => write!(f, "/{name}"),
            Self::Collection { item, occurrence } => {
                f.write_char('[')?;
                write_item(f, item)?;
                if *occurrence > 0 {
                    write!(f, "#{occurrence}")?;
                }
                f.write_char(']')
            }
        }
    }
}

fn write_item(f: &mut fmt::Formatter<'_>, item: &Value) -> fmt::Result {
    match item {
        Value::Text(text) => {
            f.write_char('"')?;
            for ch in text.chars() {
                if matches!(ch, '"' | '\\') {
                    f.write_char('\\')?;
                }
                f.write_char(ch)?;
            }
            f.write_char('"')
        }
        // `Debug` keeps the fraction: 1.0 prints as `1.0`, not `1`.
        Value::Float(x) => write!(f, "{x:?}"),
        other => write!(f, "{other}"),
    }
}

/// An immutable sequence of elements from the root to a location.
///
/// Paths are ordered by the prefix relation: `a < b` iff `a` is a proper
/// prefix of `b`. Paths on different branches are incomparable.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    elements: Vec<Element>,
}

impl Path {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Start building a path from the root.
    pub fn builder() -> PathBuilder {
        PathBuilder::default()
    }

    /// Shorthand for a path of property elements.
    pub fn properties<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            elements: names.into_iter().map(Element::property).collect(),
        }
    }

    /// A builder that starts from this path.
    pub fn to_builder(&self) -> PathBuilder {
        PathBuilder {
            elements: self.elements.clone(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn last(&self) -> Option<&Element> {
        self.elements.last()
    }

    /// This path without its last element. `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        let (_, init) = self.elements.split_last()?;
        Some(Self {
            elements: init.to_vec(),
        })
    }

    /// This path extended by one element.
    pub fn child(&self, element: Element) -> Path {
        let mut elements = Vec::with_capacity(self.elements.len() + 1);
        elements.extend_from_slice(&self.elements);
        elements.push(element);
        Self { elements }
    }

    /// Returns `true` if `self` is a (not necessarily proper) prefix of `other`.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.elements.starts_with(&self.elements)
    }

    /// Returns `true` if `prefix` is a prefix of `self`.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        prefix.is_prefix_of(self)
    }

    /// Walk `root` along this path.
    ///
    /// Returns `None` if any step does not exist in this graph, which is
    /// expected for paths of added or removed nodes.
    pub fn resolve(&self, root: &Value, introspector: &dyn Introspector) -> Option<Value> {
        let mut current = root.clone();
        for element in &self.elements {
            current = element.resolve(&current, introspector)?;
        }
        Some(current)
    }

    /// Parse the text form.
    ///
    /// Quoted items are text. An unquoted item is a boolean, an integer, or
    /// a float when it reads as one, and text otherwise, so `/[name]` and
    /// `/["name"]` address the same map entry.
    pub fn parse(input: &str) -> ModelResult<Path> {
        let invalid = |reason: &str| ModelError::InvalidPath {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let rest = input
            .strip_prefix('/')
            .ok_or_else(|| invalid("path must start with '/'"))?;
        let mut builder = Path::builder();
        let mut chars = rest.char_indices().peekable();
        let mut at_start = true;

        while let Some(&(start, ch)) = chars.peek() {
            if ch == '[' {
                let close = item_end(rest, start).ok_or_else(|| invalid("unterminated '['"))?;
                builder = builder.element(parse_item(&rest[start + 1..close]).map_err(invalid)?);
                while chars.peek().is_some_and(|&(i, _)| i <= close) {
                    chars.next();
                }
            } else {
                if ch == '/' {
                    chars.next();
                } else if !at_start {
                    return Err(invalid("expected '/' or '['"));
                }
                let begin = chars.peek().map_or(rest.len(), |&(i, _)| i);
                let end = rest[begin..]
                    .find(|c: char| c == '/' || c == '[')
                    .map_or(rest.len(), |offset| begin + offset);
                if begin == end {
                    return Err(invalid("empty property name"));
                }
                builder = builder.property(&rest[begin..end]);
                while chars.peek().is_some_and(|&(i, _)| i < end) {
                    chars.next();
                }
            }
            at_start = false;
        }

        Ok(builder.build())
    }
}

/// Byte offset of the `]` closing the item opened at `open`. Brackets
/// inside a quoted item do not count.
fn item_end(text: &str, open: usize) -> Option<usize> {
    let mut quoted = false;
    let mut escaped = false;
    for (offset, ch) in text[open + 1..].char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ']' if !quoted => return Some(open + 1 + offset),
            _ => {}
        }
    }
    None
}

fn parse_item(text: &str) -> Result<Element, &'static str> {
    if let Some(quoted) = text.strip_prefix('"') {
        let mut item = String::new();
        let mut chars = quoted.char_indices();
        let mut close = None;
        while let Some((offset, ch)) = chars.next() {
            match ch {
                '\\' => item.push(chars.next().map(|(_, c)| c).ok_or("dangling escape")?),
                '"' => {
                    close = Some(offset);
                    break;
                }
                _ => item.push(ch),
            }
        }
        let close = close.ok_or("unterminated quote")?;
        let occurrence = parse_occurrence(&quoted[close + 1..])?;
        return Ok(Element::nth_item(Value::Text(item), occurrence));
    }

    let (item, occurrence) = match text.rsplit_once('#') {
        Some((item, n)) => (item, n.parse().map_err(|_| "invalid occurrence")?),
        None => (text, 0),
    };
    if item.is_empty() {
        return Err("empty collection item");
    }
    let value = if let Ok(b) = item.parse::<bool>() {
        Value::Bool(b)
    } else if let Ok(i) = item.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(x) = item.parse::<f64>() {
        Value::Float(x)
    } else {
        Value::text(item)
    };
    Ok(Element::nth_item(value, occurrence))
}

/// Reads an optional `#n` suffix.
fn parse_occurrence(suffix: &str) -> Result<usize, &'static str> {
    if suffix.is_empty() {
        return Ok(0);
    }
    suffix
        .strip_prefix('#')
        .and_then(|n| n.parse().ok())
        .ok_or("expected '#' followed by an occurrence")
}

impl PartialOrd for Path {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else if self.is_prefix_of(other) {
            Some(Ordering::Less)
        } else if other.is_prefix_of(self) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.elements.first() {
            None => return f.write_str("/"),
            Some(Element::Collection { .. }) => f.write_str("/")?,
            Some(Element::Property(_)) => {}
        }
        for element in &self.elements {
            write!(f, "{element}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({self})")
    }
}

/// Append-only path builder.
#[derive(Clone, Debug, Default)]
pub struct PathBuilder {
    elements: Vec<Element>,
}

impl PathBuilder {
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.elements.push(Element::property(name));
        self
    }

    pub fn item(mut self, item: impl Into<Value>) -> Self {
        self.elements.push(Element::item(item));
        self
    }

    pub fn nth_item(mut self, item: impl Into<Value>, occurrence: usize) -> Self {
        self.elements.push(Element::nth_item(item, occurrence));
        self
    }

    pub fn element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn build(self) -> Path {
        Path {
            elements: self.elements,
        }
    }
}
