//! Radix tree nodes.
//!
//! Each node owns one path segment. Static children are kept sorted for
//! binary search; a node has at most one parameter child and one wildcard
//! child.

use crate::method_router::MethodRouter;
use crate::params::Params;

/// Kind of a path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// A literal segment (`users`).
    Static,
    /// A named parameter (`{id}` or `:id`).
    Param(String),
    /// A trailing catch-all (`*path`).
    Wildcard(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// Segment text as written in the pattern.
    pub segment: String,
    /// Segment kind.
    pub kind: SegmentKind,
    /// Targets for a pattern ending at this node.
    pub methods: Option<MethodRouter<T>>,
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
    wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn with_kind(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates the root node.
    #[must_use]
    pub fn root() -> Self {
        Self::with_kind("", SegmentKind::Static)
    }

    /// Splits a pattern into typed segments.
    ///
    /// Empty segments are dropped, so `/users/` and `/users` are the same
    /// pattern. A `*name` segment is a wildcard only in last position.
    #[must_use]
    pub fn parse_path(path: &str) -> Vec<(String, SegmentKind)> {
        let raw: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let last = raw.len().saturating_sub(1);
        raw.iter()
            .enumerate()
            .map(|(idx, s)| {
                let kind = if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    SegmentKind::Param(name.to_string())
                } else if let Some(name) = s.strip_prefix(':') {
                    SegmentKind::Param(name.to_string())
                } else if let Some(name) = s.strip_prefix('*').filter(|_| idx == last) {
                    SegmentKind::Wildcard(name.to_string())
                } else {
                    SegmentKind::Static
                };
                ((*s).to_string(), kind)
            })
            .collect()
    }

    /// Inserts a pattern, merging with any targets already at that node.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) {
        let segments = Self::parse_path(path);
        self.insert_segments(&segments, methods);
    }

    fn insert_segments(&mut self, segments: &[(String, SegmentKind)], methods: MethodRouter<T>) {
        let Some(((segment, kind), rest)) = segments.split_first() else {
            match &mut self.methods {
                Some(existing) => existing.merge(methods),
                None => self.methods = Some(methods),
            }
            return;
        };

        let child = match kind {
            SegmentKind::Static => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(idx) => &mut self.static_children[idx],
                    Err(idx) => {
                        self.static_children
                            .insert(idx, Node::with_kind(segment.clone(), SegmentKind::Static));
                        &mut self.static_children[idx]
                    }
                }
            }
            SegmentKind::Param(_) => self
                .param_child
                .get_or_insert_with(|| Box::new(Node::with_kind(segment.clone(), kind.clone())))
                .as_mut(),
            SegmentKind::Wildcard(_) => self
                .wildcard_child
                .get_or_insert_with(|| Box::new(Node::with_kind(segment.clone(), kind.clone())))
                .as_mut(),
        };
        child.insert_segments(rest, methods);
    }

    /// Matches a concrete request path.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    /// Priority is static, then parameter, then wildcard. Parameters pushed
    /// by a failed branch are rolled back before the next branch is tried.
    fn match_segments(&self, segments: &[&str], params: &mut Params) -> Option<&MethodRouter<T>> {
        let Some((segment, rest)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Ok(idx) = self
            .static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
        {
            if let Some(found) = self.static_children[idx].match_segments(rest, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), *segment);
                if let Some(found) = child.match_segments(rest, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                if let Some(methods) = &child.methods {
                    params.push(name.clone(), segments.join("/"));
                    return Some(methods);
                }
            }
        }

        None
    }
}
