//! Project-relative path arithmetic.
//!
//! Paths are `/`-separated strings relative to the project root, with `"."`
//! standing for the root itself. All comparisons are segment-wise so that
//! `ab/x` and `abc/y` share nothing but the root.

use std::path::Path;

pub const ROOT: &str = ".";

/// Canonical relative form: `/` separators, no `.` or empty segments,
/// `"."` for the root.
pub fn normalize(path: &str) -> String {
    let joined = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        ROOT.to_string()
    } else {
        joined
    }
}

pub fn segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Directory containing `path`; the root for top-level entries.
pub fn parent(path: &str) -> String {
    let mut segs = segments(path);
    segs.pop();
    from_segments(&segs)
}

pub fn join(dir: &str, name: &str) -> String {
    let mut segs = segments(dir);
    segs.extend(segments(name));
    from_segments(&segs)
}

/// Longest shared leading run of segments.
pub fn common_ancestor(a: &str, b: &str) -> String {
    let shared: Vec<&str> = segments(a)
        .into_iter()
        .zip(segments(b))
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect();
    from_segments(&shared)
}

/// True when `path` equals `ancestor` or lies beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    let outer = segments(ancestor);
    let inner = segments(path);
    inner.len() >= outer.len() && inner.iter().zip(&outer).all(|(x, y)| x == y)
}

/// `abs` relative to `root`, or `None` when it lies outside.
pub fn to_rel(root: &Path, abs: &Path) -> Option<String> {
    let rel = abs.strip_prefix(root).ok()?;
    Some(normalize(&rel.to_string_lossy()))
}

pub fn depth(path: &str) -> usize {
    segments(path).len()
}

fn from_segments(segs: &[&str]) -> String {
    if segs.is_empty() {
        ROOT.to_string()
    } else {
        segs.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(""), ".");
        assert_eq!(normalize("./"), ".");
        assert_eq!(normalize("./a//b/"), "a/b");
        assert_eq!(normalize("a\\b\\c.go"), "a/b/c.go");
    }

    #[test]
    fn test_common_ancestor_is_segment_wise() {
        assert_eq!(common_ancestor("ab/x", "abc/y"), ".");
        assert_eq!(common_ancestor("a/b/c", "a/b/d"), "a/b");
        assert_eq!(common_ancestor("a/x.go", "a"), "a");
        assert_eq!(common_ancestor("a", "."), ".");
        assert_eq!(common_ancestor("a/b", "a/b"), "a/b");
    }

    #[test]
    fn test_is_within() {
        assert!(is_within("a/b/c.go", "a"));
        assert!(is_within("a", "a"));
        assert!(is_within("a", "."));
        assert!(is_within(".", "."));
        assert!(!is_within("abc/x.go", "ab"));
        assert!(!is_within(".", "a"));
        assert!(!is_within("a", "a/b"));
    }

    #[test]
    fn test_parent_and_join() {
        assert_eq!(parent("a/b/c.go"), "a/b");
        assert_eq!(parent("main.go"), ".");
        assert_eq!(parent("."), ".");
        assert_eq!(join(".", "a"), "a");
        assert_eq!(join("a/b", "c.go"), "a/b/c.go");
    }

    #[test]
    fn test_to_rel() {
        let root = Path::new("/work/proj");
        assert_eq!(
            to_rel(root, Path::new("/work/proj/pkg/a.go")).as_deref(),
            Some("pkg/a.go")
        );
        assert_eq!(to_rel(root, root).as_deref(), Some("."));
        assert_eq!(to_rel(root, Path::new("/elsewhere/a.go")), None);
    }
}
