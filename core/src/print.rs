//! Lazy printer output.
//!
//! Printers never build strings directly. They return an [`Output`], a
//! persistent rope of text chunks whose concatenation is O(1); the text is
//! only materialized by [`Output::into_string`] or [`Display`](fmt::Display).

use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
enum Node {
    Text(Arc<str>),
    Cat(Arc<Node>, Arc<Node>),
}

/// A lazily concatenated sequence of text chunks.
#[derive(Debug, Clone, Default)]
pub struct Output {
    root: Option<Arc<Node>>,
}

impl Output {
    /// Prints nothing.
    #[inline]
    pub const fn nil() -> Self {
        Self { root: None }
    }

    pub fn text(s: impl Into<Arc<str>>) -> Self {
        let s: Arc<str> = s.into();
        if s.is_empty() {
            return Self::nil();
        }
        Self {
            root: Some(Arc::new(Node::Text(s))),
        }
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        self.root.is_none()
    }

    /// `self` followed by `other`.
    pub fn cat(self, other: Output) -> Output {
        match (self.root, other.root) {
            (None, r) | (r, None) => Output { root: r },
            (Some(a), Some(b)) => Output {
                root: Some(Arc::new(Node::Cat(a, b))),
            },
        }
    }

    pub fn push(&mut self, other: Output) {
        *self = std::mem::take(self).cat(other);
    }

    /// Visits the chunks left to right.
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks {
            stack: self.root.as_deref().into_iter().collect(),
        }
    }

    pub fn into_string(self) -> String {
        self.chunks().collect()
    }
}

impl PartialEq for Output {
    fn eq(&self, other: &Self) -> bool {
        self.chunks()
            .flat_map(str::chars)
            .eq(other.chunks().flat_map(str::chars))
    }
}

impl Eq for Output {}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl From<&str> for Output {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for Output {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

impl FromIterator<Output> for Output {
    fn from_iter<I: IntoIterator<Item = Output>>(iter: I) -> Self {
        iter.into_iter().fold(Output::nil(), Output::cat)
    }
}

/// Iterator over the chunks of an [`Output`].
pub struct Chunks<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Text(s) => return Some(s),
                Node::Cat(a, b) => {
                    self.stack.push(b);
                    self.stack.push(a);
                }
            }
        }
        None
    }
}

/// Prints a list: elements joined by `sep`, followed by `term`.
///
/// An empty list prints `term` alone.
pub fn print_list<T, E>(
    items: &[T],
    mut elem: impl FnMut(&T) -> Result<Output, E>,
    sep: &Output,
    term: &Output,
) -> Result<Output, E> {
    let mut out = Output::nil();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(sep.clone());
        }
        out.push(elem(item)?);
    }
    Ok(out.cat(term.clone()))
}
