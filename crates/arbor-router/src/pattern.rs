//! Route pattern syntax.
//!
//! A pattern is a path starting with `/`. `:name` captures one path segment
//! (it runs until the next `/`), a trailing `*name` captures the remainder of
//! the path. Every `:` or `*` starts a dynamic segment, so `/user_:name` is a
//! static `/user_` followed by a parameter.

use crate::error::InsertError;

/// Marker byte that starts a named parameter.
pub const PARAM: u8 = b':';
/// Marker byte that starts a catch-all.
pub const CATCH_ALL: u8 = b'*';

/// A validated route pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern<'a> {
    raw: &'a str,
    params: usize,
}

/// Location of a dynamic segment inside a pattern fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Dynamic {
    /// Offset of the `:` or `*` marker.
    pub start: usize,
    /// Offset one past the last byte of the name.
    pub end: usize,
    pub catch_all: bool,
}

impl<'a> Pattern<'a> {
    /// Validate `raw` against the pattern syntax.
    pub fn parse(raw: &'a str) -> Result<Self, InsertError> {
        let bytes = raw.as_bytes();
        if bytes.first() != Some(&b'/') {
            return Err(InsertError::MissingLeadingSlash {
                route: raw.to_string(),
            });
        }

        let mut params = 0;
        let mut offset = 0;
        while let Some(dynamic) = next_dynamic(&bytes[offset..]) {
            let start = offset + dynamic.start;
            let end = offset + dynamic.end;
            let route = || raw.to_string();

            if bytes[start + 1..end]
                .iter()
                .any(|&b| b == PARAM || b == CATCH_ALL)
            {
                return Err(InsertError::MultipleDynamicInSegment { route: route() });
            }
            if end == start + 1 {
                return Err(InsertError::UnnamedSegment { route: route() });
            }
            if dynamic.catch_all {
                if bytes[start - 1] != b'/' {
                    return Err(InsertError::CatchAllWithoutSlash { route: route() });
                }
                if end != bytes.len() {
                    return Err(InsertError::CatchAllNotLast { route: route() });
                }
            }

            params += 1;
            offset = end;
        }

        Ok(Self { raw, params })
    }

    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    /// Number of `:name` and `*name` segments.
    pub fn param_count(&self) -> usize {
        self.params
    }

    /// Names of the dynamic segments, in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &'a str> + 'a {
        let raw = self.raw;
        let mut offset = 0;
        std::iter::from_fn(move || {
            let dynamic = next_dynamic(&raw.as_bytes()[offset..])?;
            let name = raw.get(offset + dynamic.start + 1..offset + dynamic.end)?;
            offset += dynamic.end;
            Some(name)
        })
    }
}

/// Find the first dynamic segment in `path`.
///
/// The segment extends from its marker to the next `/` or the end of `path`.
pub(crate) fn next_dynamic(path: &[u8]) -> Option<Dynamic> {
    let start = path.iter().position(|&b| b == PARAM || b == CATCH_ALL)?;
    let end = path[start + 1..]
        .iter()
        .position(|&b| b == b'/')
        .map_or(path.len(), |offset| start + 1 + offset);

    Some(Dynamic {
        start,
        end,
        catch_all: path[start] == CATCH_ALL,
    })
}

/// Number of dynamic segments left in an already validated pattern tail.
pub(crate) fn count_dynamic(path: &[u8]) -> usize {
    path.iter().filter(|&&b| b == PARAM || b == CATCH_ALL).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_pattern_has_no_params() {
        let pattern = Pattern::parse("/users/list").unwrap();
        assert_eq!(pattern.param_count(), 0);
        assert_eq!(pattern.param_names().count(), 0);
    }

    #[test]
    fn counts_params_and_catch_all() {
        let pattern = Pattern::parse("/users/:id/files/*path").unwrap();
        assert_eq!(pattern.param_count(), 2);
        assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["id", "path"]);
    }

    #[test]
    fn param_may_start_mid_segment() {
        let pattern = Pattern::parse("/user_:name/profile").unwrap();
        assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn rejects_missing_leading_slash() {
        assert!(matches!(
            Pattern::parse("users"),
            Err(InsertError::MissingLeadingSlash { .. })
        ));
        assert!(matches!(
            Pattern::parse(""),
            Err(InsertError::MissingLeadingSlash { .. })
        ));
    }

    #[test]
    fn rejects_unnamed_segments() {
        assert!(matches!(
            Pattern::parse("/users/:"),
            Err(InsertError::UnnamedSegment { .. })
        ));
        assert!(matches!(
            Pattern::parse("/users/:/posts"),
            Err(InsertError::UnnamedSegment { .. })
        ));
        assert!(matches!(
            Pattern::parse("/files/*"),
            Err(InsertError::UnnamedSegment { .. })
        ));
    }

    #[test]
    fn rejects_two_markers_in_one_segment() {
        assert!(matches!(
            Pattern::parse("/:a:b"),
            Err(InsertError::MultipleDynamicInSegment { .. })
        ));
        assert!(matches!(
            Pattern::parse("/files/*a*b"),
            Err(InsertError::MultipleDynamicInSegment { .. })
        ));
        assert!(matches!(
            Pattern::parse("/:id*rest"),
            Err(InsertError::MultipleDynamicInSegment { .. })
        ));
    }

    #[test]
    fn rejects_catch_all_not_last() {
        assert!(matches!(
            Pattern::parse("/files/*path/raw"),
            Err(InsertError::CatchAllNotLast { .. })
        ));
    }

    #[test]
    fn rejects_catch_all_without_slash() {
        assert!(matches!(
            Pattern::parse("/files*path"),
            Err(InsertError::CatchAllWithoutSlash { .. })
        ));
    }

    #[test]
    fn next_dynamic_finds_segment_bounds() {
        let found = next_dynamic(b"/users/:id/posts").unwrap();
        assert_eq!(
            found,
            Dynamic {
                start: 7,
                end: 10,
                catch_all: false
            }
        );
        assert_eq!(next_dynamic(b"/static/only"), None);
    }
}
