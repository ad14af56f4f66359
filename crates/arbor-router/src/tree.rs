//! Compressed radix tree mapping route patterns to values.
//!
//! Each node holds a literal fragment of one or more patterns. Static children
//! are indexed by their first byte; a parameter or catch-all child is always
//! the only child of its parent, so a lookup never backtracks.

use std::fmt;

use crate::error::InsertError;
use crate::params::Params;
use crate::pattern::{self, Pattern, CATCH_ALL, PARAM};

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    /// The first node of a non-empty tree.
    Root,
    Static,
    /// `:name`, matches one non-empty path segment.
    Param(Box<str>),
    /// `*name`, matches the rest of the path. Always a leaf.
    CatchAll(Box<str>),
}

#[derive(Debug, Clone)]
struct Node<T> {
    fragment: Vec<u8>,
    kind: NodeKind,
    /// The single child is a `Param` or `CatchAll` node.
    wild_child: bool,
    /// First byte of each static child, parallel to `children`.
    indices: Vec<u8>,
    /// Sorted by descending priority.
    children: Vec<Node<T>>,
    value: Option<T>,
    /// Number of patterns passing through this node.
    priority: u32,
    /// Upper bound of captures for any pattern through this subtree.
    max_params: usize,
}

/// Outcome of a single tree lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<V> {
    /// The path matched a pattern exactly.
    Found(V),
    /// No match, but the path with its trailing slash added or removed does.
    Redirect,
    NotFound,
}

impl<V> Outcome<V> {
    pub fn found(self) -> Option<V> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect)
    }
}

/// Result of [`Tree::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatch<'t, 'p, T> {
    Found {
        value: &'t T,
        params: Params<'t, 'p>,
    },
    Redirect,
    NotFound,
}

/// A radix tree of route patterns for one method and host.
#[derive(Debug, Clone)]
pub struct Tree<T> {
    root: Node<T>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self { root: Node::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.root.fragment.is_empty() && self.root.children.is_empty()
    }

    /// Most parameters any registered pattern can capture.
    pub fn max_params(&self) -> usize {
        self.root.max_params
    }

    /// Bind `value` to `route`.
    ///
    /// Fails without binding anything when the pattern is malformed, collides
    /// with the dynamic segments of an existing pattern, or is already bound.
    /// A rejected insertion may leave an edge split behind; splits never change
    /// what a lookup matches.
    pub fn insert(&mut self, route: &str, value: T) -> Result<(), InsertError> {
        let pattern = Pattern::parse(route)?;

        if self.is_empty() {
            let root = &mut self.root;
            root.kind = NodeKind::Root;
            root.priority = 1;
            root.max_params = pattern.param_count();
            return root.insert_child(route.as_bytes(), value, pattern.param_count());
        }

        self.root.insert(pattern, value)
    }

    /// Look up `path`, writing captures into the caller-owned `params`.
    ///
    /// `params` is cleared first. On anything but `Found` it is left empty.
    pub fn at<'t, 'p>(&'t self, path: &'p str, params: &mut Params<'t, 'p>) -> Outcome<&'t T> {
        params.clear();
        if !path.starts_with('/') {
            return Outcome::NotFound;
        }

        if let Some(value) = self.root.walk(Input::exact(path), Some(&mut *params)) {
            return Outcome::Found(value);
        }
        params.clear();

        if self.matches_toggled(path) {
            Outcome::Redirect
        } else {
            Outcome::NotFound
        }
    }

    /// Look up `path` with a freshly allocated parameter buffer.
    pub fn get<'t, 'p>(&'t self, path: &'p str) -> PathMatch<'t, 'p, T> {
        let mut params = Params::with_capacity(self.max_params());
        match self.at(path, &mut params) {
            Outcome::Found(value) => PathMatch::Found { value, params },
            Outcome::Redirect => PathMatch::Redirect,
            Outcome::NotFound => PathMatch::NotFound,
        }
    }

    /// Whether `path` matches a pattern exactly. Captures nothing.
    pub fn contains(&self, path: &str) -> bool {
        path.starts_with('/') && self.root.walk(Input::exact(path), None).is_some()
    }

    /// Whether `path` with its trailing slash toggled matches.
    fn matches_toggled(&self, path: &str) -> bool {
        let toggled = match path.strip_suffix('/') {
            Some("") => return false,
            Some(trimmed) => Input::exact(trimmed),
            None => Input::with_slash(path),
        };
        self.root.walk(toggled, None).is_some()
    }
}

impl<T> Node<T> {
    const fn new() -> Self {
        Self {
            fragment: Vec::new(),
            kind: NodeKind::Static,
            wild_child: false,
            indices: Vec::new(),
            children: Vec::new(),
            value: None,
            priority: 0,
            max_params: 0,
        }
    }

    fn is_catch_all(&self) -> bool {
        matches!(self.kind, NodeKind::CatchAll(_))
    }

    fn insert(&mut self, pattern: Pattern<'_>, value: T) -> Result<(), InsertError> {
        let route = pattern.as_str();
        let full = route.as_bytes();
        let mut remaining = full;
        let mut current = self;
        current.priority += 1;

        loop {
            current.max_params = current.max_params.max(pattern::count_dynamic(remaining));

            let common = common_prefix(remaining, &current.fragment);
            if common < current.fragment.len() {
                current.split(common);
            }

            if common == remaining.len() {
                if current.value.is_some() {
                    return Err(InsertError::Duplicate {
                        route: route.to_string(),
                    });
                }
                // `/files/` would shadow the empty remainder of `/files/*path`
                if current.wild_child {
                    if let Some(child) = current.children.first().filter(|c| c.is_catch_all()) {
                        return Err(conflict(route, full, &child.fragment));
                    }
                }
                current.value = Some(value);
                return Ok(());
            }

            remaining = &remaining[common..];
            let consumed = &full[..full.len() - remaining.len()];
            let next = remaining[0];

            if current.wild_child {
                let Some(child) = current.children.first() else {
                    return Err(conflict(route, consumed, b""));
                };
                if !child.accepts(remaining) {
                    return Err(conflict(route, consumed, &child.fragment));
                }
                current = &mut current.children[0];
                current.priority += 1;
                continue;
            }

            if let Some(i) = current.indices.iter().position(|&b| b == next) {
                let i = current.bump_child(i);
                current = &mut current.children[i];
                continue;
            }

            let params = pattern::count_dynamic(remaining);

            if next == PARAM || next == CATCH_ALL {
                if let Some(child) = current.children.first() {
                    return Err(conflict(route, consumed, &child.fragment));
                }
                if next == CATCH_ALL && current.value.is_some() {
                    return Err(conflict(route, consumed, b""));
                }
                return current.insert_child(remaining, value, params);
            }

            current.indices.push(next);
            current.children.push(Node::new());
            let i = current.bump_child(current.children.len() - 1);
            let child = &mut current.children[i];
            child.max_params = params;
            return child.insert_child(remaining, value, params);
        }
    }

    /// Materialize `path` below `self`.
    ///
    /// `self` is either a fresh node whose fragment is still unset, or an
    /// existing node whose fragment has been consumed and `path` starts with a
    /// dynamic marker.
    fn insert_child(
        &mut self,
        mut path: &[u8],
        value: T,
        mut params: usize,
    ) -> Result<(), InsertError> {
        let mut current = self;

        loop {
            let Some(dynamic) = pattern::next_dynamic(path) else {
                current.fragment = path.to_vec();
                current.value = Some(value);
                return Ok(());
            };

            if dynamic.start > 0 {
                current.fragment = path[..dynamic.start].to_vec();
                path = &path[dynamic.start..];
            }

            let len = dynamic.end - dynamic.start;
            let name: Box<str> = String::from_utf8_lossy(&path[1..len]).into();
            let kind = if dynamic.catch_all {
                NodeKind::CatchAll(name)
            } else {
                NodeKind::Param(name)
            };

            current.wild_child = true;
            current.children.push(Node {
                fragment: path[..len].to_vec(),
                kind,
                priority: 1,
                max_params: params,
                ..Node::new()
            });
            current = &mut current.children[0];
            params = params.saturating_sub(1);
            path = &path[len..];

            if dynamic.catch_all || path.is_empty() {
                current.value = Some(value);
                return Ok(());
            }

            // A parameter always ends at `/`.
            current.indices.push(path[0]);
            current.children.push(Node {
                priority: 1,
                max_params: params,
                ..Node::new()
            });
            current = &mut current.children[0];
        }
    }

    /// Move the fragment tail starting at `at` into a new single child.
    fn split(&mut self, at: usize) {
        let tail = Node {
            fragment: self.fragment.split_off(at),
            kind: NodeKind::Static,
            wild_child: std::mem::take(&mut self.wild_child),
            indices: std::mem::take(&mut self.indices),
            children: std::mem::take(&mut self.children),
            value: self.value.take(),
            priority: self.priority.saturating_sub(1),
            max_params: self.max_params,
        };

        self.indices = vec![tail.fragment[0]];
        self.children = vec![tail];
    }

    /// Increment the priority of child `index` and move it ahead of every
    /// sibling with a lower priority. Returns its new index.
    fn bump_child(&mut self, index: usize) -> usize {
        self.children[index].priority += 1;
        let priority = self.children[index].priority;

        let mut position = index;
        while position > 0 && self.children[position - 1].priority < priority {
            self.children.swap(position - 1, position);
            self.indices.swap(position - 1, position);
            position -= 1;
        }
        position
    }

    /// Whether the pattern tail `path` names exactly this dynamic segment.
    fn accepts(&self, path: &[u8]) -> bool {
        if !path.starts_with(&self.fragment) {
            return false;
        }
        match self.kind {
            NodeKind::Param(_) => path.get(self.fragment.len()).map_or(true, |&b| b == b'/'),
            NodeKind::CatchAll(_) => path.len() == self.fragment.len(),
            NodeKind::Root | NodeKind::Static => false,
        }
    }

    fn child_for(&self, byte: u8) -> Option<&Node<T>> {
        let i = self.indices.iter().position(|&b| b == byte)?;
        self.children.get(i)
    }

    fn walk<'t, 'p>(
        &'t self,
        input: Input<'p>,
        mut params: Option<&mut Params<'t, 'p>>,
    ) -> Option<&'t T> {
        let mut node = self;
        let mut pos = 0;

        loop {
            match &node.kind {
                NodeKind::Param(name) => {
                    let end = input.segment_end(pos);
                    if end == pos {
                        return None;
                    }
                    if let Some(params) = params.as_deref_mut() {
                        params.push(name, input.slice(pos, end)?);
                    }
                    pos = end;
                    if pos == input.len() {
                        return node.value.as_ref();
                    }
                    node = node.child_for(b'/')?;
                }
                NodeKind::CatchAll(name) => {
                    if let Some(params) = params.as_deref_mut() {
                        // keep the slash that precedes the remainder
                        params.push(name, input.slice(pos.checked_sub(1)?, input.len())?);
                    }
                    return node.value.as_ref();
                }
                NodeKind::Root | NodeKind::Static => {
                    if !input.has_at(pos, &node.fragment) {
                        return None;
                    }
                    pos += node.fragment.len();

                    if pos == input.len() {
                        if node.value.is_some() {
                            return node.value.as_ref();
                        }
                        node = node
                            .children
                            .first()
                            .filter(|child| node.wild_child && child.is_catch_all())?;
                        continue;
                    }

                    node = if node.wild_child {
                        node.children.first()?
                    } else {
                        node.child_for(input.byte(pos)?)?
                    };
                }
            }
        }
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let marker = if self.value.is_some() { " *" } else { "" };
        writeln!(
            f,
            "{:indent$}{} [{}]{}",
            "",
            String::from_utf8_lossy(&self.fragment),
            self.priority,
            marker,
            indent = depth * 2
        )?;
        for child in &self.children {
            child.fmt_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl<T> fmt::Display for Tree<T> {
    /// One node per line with its priority; bound nodes are marked with `*`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        self.root.fmt_tree(f, 0)
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn conflict(route: &str, prefix: &[u8], segment: &[u8]) -> InsertError {
    let mut existing = String::from_utf8_lossy(prefix).into_owned();
    existing.push_str(&String::from_utf8_lossy(segment));
    InsertError::Conflict {
        route: route.to_string(),
        existing,
    }
}

/// A request path, optionally followed by one virtual `/`.
///
/// Lets the trailing-slash check test `path + "/"` without allocating.
#[derive(Debug, Clone, Copy)]
struct Input<'p> {
    path: &'p str,
    trailing_slash: bool,
}

impl<'p> Input<'p> {
    fn exact(path: &'p str) -> Self {
        Self {
            path,
            trailing_slash: false,
        }
    }

    fn with_slash(path: &'p str) -> Self {
        Self {
            path,
            trailing_slash: true,
        }
    }

    fn len(self) -> usize {
        self.path.len() + usize::from(self.trailing_slash)
    }

    fn byte(self, pos: usize) -> Option<u8> {
        match self.path.as_bytes().get(pos) {
            Some(&b) => Some(b),
            None if self.trailing_slash && pos == self.path.len() => Some(b'/'),
            None => None,
        }
    }

    fn has_at(self, pos: usize, fragment: &[u8]) -> bool {
        let bytes = self.path.as_bytes();
        let end = pos + fragment.len();
        match bytes.get(pos..end) {
            Some(window) => window == fragment,
            None => {
                self.trailing_slash
                    && end == bytes.len() + 1
                    && fragment.last() == Some(&b'/')
                    && bytes.get(pos..end - 1) == Some(&fragment[..fragment.len() - 1])
            }
        }
    }

    /// Offset of the next `/` at or after `pos`, or the end of input.
    fn segment_end(self, pos: usize) -> usize {
        let bytes = self.path.as_bytes();
        match bytes.get(pos..).and_then(|rest| rest.iter().position(|&b| b == b'/')) {
            Some(offset) => pos + offset,
            None => bytes.len().max(pos),
        }
    }

    fn slice(self, start: usize, end: usize) -> Option<&'p str> {
        self.path.get(start..end)
    }
}
