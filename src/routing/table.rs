//! Route table
//!
//! An explicit, ordered list of `(prefix, handler)` pairs. The table is
//! assembled once through [`RouteTableBuilder`] and has no mutation API
//! afterwards.
//!
//! # Matching
//! - A prefix matches when its segments are the leading segments of the
//!   request path (`/api/units` matches `/api/units` and `/api/units/7`,
//!   never `/api/unitsx`).
//! - Segment comparison is ASCII case-insensitive.
//! - When prefixes overlap (`/api` and `/api/units`), the first registered
//!   entry wins, so registration order is part of the table's meaning.

use std::fmt;

/// Route table error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
    #[error("Invalid route prefix '{prefix}': {reason}")]
    InvalidPrefix { prefix: String, reason: &'static str },

    #[error("Route prefix registered twice: {0}")]
    DuplicatePrefix(String),
}

// =========================================================================
// Prefix
// =========================================================================

/// A validated literal path prefix such as `/api/units`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    raw: String,
    segments: usize,
}

impl Prefix {
    /// Validate and wrap a prefix.
    pub fn parse(raw: impl Into<String>) -> Result<Self, RouteTableError> {
        let raw = raw.into();
        let invalid = |reason| RouteTableError::InvalidPrefix {
            prefix: raw.clone(),
            reason,
        };

        if !raw.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }
        if raw == "/" {
            return Err(invalid("root prefix is not routable"));
        }
        if raw.ends_with('/') {
            return Err(invalid("must not end with '/'"));
        }
        if raw.contains("//") {
            return Err(invalid("must not contain empty segments"));
        }
        if raw.chars().any(|c| c == '?' || c == '#' || c.is_whitespace()) {
            return Err(invalid("must be a literal path"));
        }

        let segments = raw[1..].split('/').count();
        Ok(Self { raw, segments })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of path segments in the prefix.
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Remainder of `path` after this prefix, or `None` when the prefix
    /// does not cover `path` on a segment boundary.
    pub fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        let len = self.raw.len();
        let bytes = path.as_bytes();

        if bytes.len() < len || !bytes[..len].eq_ignore_ascii_case(self.raw.as_bytes()) {
            return None;
        }

        match bytes.get(len) {
            None => Some("/"),
            Some(b'/') => Some(&path[len..]),
            Some(_) => None,
        }
    }

    fn same_route(&self, other: &Prefix) -> bool {
        self.raw.eq_ignore_ascii_case(&other.raw)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// =========================================================================
// Table
// =========================================================================

/// A single registered entry.
#[derive(Debug, Clone)]
pub struct RouteEntry<H> {
    pub prefix: Prefix,
    pub handler: H,
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub prefix: &'a Prefix,
    pub handler: &'a H,
    /// Path left for the handler; always starts with `/`.
    pub remainder: &'a str,
}

/// Immutable prefix routing table.
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    entries: Vec<RouteEntry<H>>,
}

impl<H> RouteTable<H> {
    pub fn builder() -> RouteTableBuilder<H> {
        RouteTableBuilder::new()
    }

    /// Find the entry serving `path`: the first registered entry whose
    /// prefix covers it.
    pub fn lookup<'a>(&'a self, path: &'a str) -> Option<RouteMatch<'a, H>> {
        self.entries.iter().find_map(|entry| {
            entry.prefix.strip(path).map(|remainder| RouteMatch {
                prefix: &entry.prefix,
                handler: &entry.handler,
                remainder,
            })
        })
    }

    /// Registered prefixes in registration order.
    pub fn prefixes(&self) -> impl Iterator<Item = &Prefix> {
        self.entries.iter().map(|e| &e.prefix)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects entries and validates them into a [`RouteTable`].
///
/// Errors are reported by [`RouteTableBuilder::build`], so a table is either
/// complete or not produced at all.
#[derive(Debug)]
pub struct RouteTableBuilder<H> {
    entries: Vec<(String, H)>,
}

impl<H> RouteTableBuilder<H> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `handler` under `prefix`.
    pub fn mount(mut self, prefix: impl Into<String>, handler: H) -> Self {
        self.entries.push((prefix.into(), handler));
        self
    }

    pub fn build(self) -> Result<RouteTable<H>, RouteTableError> {
        let mut entries: Vec<RouteEntry<H>> = Vec::with_capacity(self.entries.len());

        for (raw, handler) in self.entries {
            let prefix = Prefix::parse(raw)?;
            if entries.iter().any(|e| e.prefix.same_route(&prefix)) {
                return Err(RouteTableError::DuplicatePrefix(prefix.raw));
            }
            entries.push(RouteEntry { prefix, handler });
        }

        Ok(RouteTable { entries })
    }
}

impl<H> Default for RouteTableBuilder<H> {
    fn default() -> Self {
        Self::new()
    }
}
