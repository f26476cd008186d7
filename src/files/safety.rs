//! Lexical path handling for local resolution.
//!
//! Request paths are joined onto the base directory without touching the
//! filesystem, then checked by computing the path relative to the base. A
//! relative path that climbs out (`..`) or is itself absolute (different root
//! or drive) means the request escaped the base directory.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// A request path that resolves outside the base directory.
#[derive(Debug, Clone, Error)]
#[error("Unsafe path: {} is outside {}", resolved.display(), base.display())]
pub struct UnsafePathError {
    pub base: PathBuf,
    pub resolved: PathBuf,
    pub relative: PathBuf,
}

/// The two candidate paths for a local request, already checked to stay inside the base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTarget {
    /// `base` joined with the request path.
    pub original: PathBuf,
    /// `original` joined with `index.html`.
    pub with_index: PathBuf,
    /// `original` relative to `base`.
    pub relative: PathBuf,
}

/// Join `request_path` onto `base` and reject it if the result escapes `base`.
pub fn local_target(base: &Path, request_path: &str) -> Result<LocalTarget, UnsafePathError> {
    let base = normalize(base);
    let original = join_lexical(&base, request_path);
    let with_index = original.join("index.html");
    let relative = relative_path(&base, &original);

    let escapes = matches!(relative.components().next(), Some(Component::ParentDir));
    if escapes || relative.is_absolute() {
        return Err(UnsafePathError {
            base,
            resolved: original,
            relative,
        });
    }

    Ok(LocalTarget {
        original,
        with_index,
        relative,
    })
}

/// Append `request_path` to `base`, treating a leading `/` as part of the join
/// rather than as a new root, and fold `.`/`..` segments.
pub fn join_lexical(base: &Path, request_path: &str) -> PathBuf {
    let mut joined = base.to_path_buf();
    for segment in request_path.split(&['/', '\\'][..]) {
        match segment {
            "" | "." => {}
            ".." => pop_or_climb(&mut joined),
            other => joined.push(other),
        }
    }
    normalize(&joined)
}

/// Fold `.` and `..` segments without consulting the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => pop_or_climb(&mut normalized),
            Component::Normal(name) => normalized.push(name),
        }
    }
    normalized
}

// `..` above an absolute root stays at the root; on a relative path it is kept.
fn pop_or_climb(path: &mut PathBuf) {
    match path.components().next_back() {
        Some(Component::Normal(_)) => {
            path.pop();
        }
        Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
        _ => path.push(".."),
    }
}

/// Lexical path from `from` to `to`. Returns `to` unchanged when the two do not share a root.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = normalize(from);
    let to = normalize(to);

    let from_parts: Vec<Component> = from.components().collect();
    let to_parts: Vec<Component> = to.components().collect();

    let same_root = from.has_root() == to.has_root()
        && from_parts.first().filter(|c| matches!(c, Component::Prefix(_)))
            == to_parts.first().filter(|c| matches!(c, Component::Prefix(_)));
    if !same_root {
        return to;
    }

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from_parts.len() {
        relative.push("..");
    }
    for part in &to_parts[common..] {
        relative.push(part.as_os_str());
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_treats_leading_slash_as_relative() {
        assert_eq!(
            join_lexical(Path::new("/app/public"), "/docs/page"),
            PathBuf::from("/app/public/docs/page")
        );
        assert_eq!(
            join_lexical(Path::new("/app/public"), "/"),
            PathBuf::from("/app/public")
        );
    }

    #[test]
    fn test_join_folds_parent_segments() {
        assert_eq!(
            join_lexical(Path::new("/app/public"), "/../../etc/passwd"),
            PathBuf::from("/etc/passwd")
        );
        assert_eq!(
            join_lexical(Path::new("/app/public"), "/a/./b/../c"),
            PathBuf::from("/app/public/a/c")
        );
        assert_eq!(
            join_lexical(Path::new("/app"), "/../../../../x"),
            PathBuf::from("/x")
        );
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/app/public"), Path::new("/etc/passwd")),
            PathBuf::from("../../etc/passwd")
        );
        assert_eq!(
            relative_path(Path::new("/app/public"), Path::new("/app/public/docs")),
            PathBuf::from("docs")
        );
        assert_eq!(
            relative_path(Path::new("/app/public"), Path::new("/app/public")),
            PathBuf::new()
        );
        assert_eq!(
            relative_path(Path::new("/app/public"), Path::new("/app/publicity")),
            PathBuf::from("../publicity")
        );
    }

    #[test]
    fn test_traversal_is_unsafe() {
        let err = local_target(Path::new("/app/public"), "/../../etc/passwd").unwrap_err();
        assert_eq!(err.resolved, PathBuf::from("/etc/passwd"));
        assert_eq!(err.relative, PathBuf::from("../../etc/passwd"));
    }

    #[test]
    fn test_sibling_prefix_is_unsafe() {
        assert!(local_target(Path::new("/app/public"), "/../publicity/secret").is_err());
    }

    #[test]
    fn test_contained_paths_are_safe() {
        let target = local_target(Path::new("/app/public"), "/docs/../docs/intro").unwrap();
        assert_eq!(target.original, PathBuf::from("/app/public/docs/intro"));
        assert_eq!(target.with_index, PathBuf::from("/app/public/docs/intro/index.html"));

        let root = local_target(Path::new("/app/public"), "/").unwrap();
        assert_eq!(root.original, PathBuf::from("/app/public"));
        assert_eq!(root.relative, PathBuf::new());
    }

    #[test]
    fn test_dotdot_prefixed_name_is_safe() {
        let target = local_target(Path::new("/app/public"), "/..hidden").unwrap();
        assert_eq!(target.original, PathBuf::from("/app/public/..hidden"));
    }
}
