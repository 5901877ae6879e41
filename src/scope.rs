//! Entry scoping against an optional source-path prefix

/// Decide whether an entry is in scope and compute its output-relative path
///
/// Without a `source_path` every entry is in scope and the output path is
/// the entry name unchanged. With one, the entry name must start with the
/// prefix (a literal-string anchor, not a path-segment match) and the
/// matching prefix is stripped from the returned path. Out-of-scope entries
/// return `None`.
///
/// Entry names are used as-is: `..` segments and absolute paths are not
/// normalized here.
pub(crate) fn scoped_path<'a>(entry_name: &'a str, source_path: Option<&str>) -> Option<&'a str> {
    match source_path {
        None => Some(entry_name),
        Some(prefix) => entry_name.strip_prefix(prefix),
    }
}
