//! Source path expansion.
//!
//! [`expand_source_pattern`] turns a user-supplied source argument such as
//! `$DATA/sales/*.dbf` into the sorted list of files it names. Environment
//! references are expanded anywhere in the pattern; `*` and `?` wildcards
//! are matched case-insensitively, and only in the file-name part.

use std::path::{Path, PathBuf};

use crate::DbfError;

/// Expand `$VAR` and `${VAR}` references from the process environment.
///
/// Unknown variables are left as written.
pub fn expand_env_vars(input: &str) -> String {
    expand_vars_with(input, |name| std::env::var(name).ok())
}

fn expand_vars_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        match (name.is_empty(), lookup(name)) {
            (false, Some(value)) => out.push_str(&value),
            _ => out.push_str(&rest[pos..pos + 1 + consumed]),
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}

/// Returns true if `s` contains a `*` or `?` wildcard.
pub fn has_wildcards(s: &str) -> bool {
    s.contains(['*', '?'])
}

/// Case-insensitive wildcard match of a whole file name.
///
/// `*` matches any run of characters (including none), `?` exactly one.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.to_lowercase().chars().collect();
    let n: Vec<char> = name.to_lowercase().chars().collect();

    let (mut pi, mut ni) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((sp, sn)) = star {
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

/// Resolve a source argument to the files it names, sorted by path.
///
/// A pattern without wildcards must name an existing file. A pattern with
/// wildcards may match nothing, which yields an empty list.
pub fn expand_source_pattern(pattern: &str) -> Result<Vec<PathBuf>, DbfError> {
    let expanded = expand_env_vars(pattern);
    let path = Path::new(&expanded);

    let file_part = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if has_wildcards(&dir.to_string_lossy()) {
        return Err(DbfError::Argument(format!(
            "Wildcards are only supported in the file name: {}",
            expanded
        )));
    }

    if !has_wildcards(&file_part) {
        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }
        return Err(DbfError::Io(format!("No such file: {}", expanded)));
    }

    let entries = std::fs::read_dir(&dir)
        .map_err(|e| DbfError::Io(format!("Cannot read directory {}: {}", dir.display(), e)))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| DbfError::Io(format!("Cannot read directory entry: {}", e)))?;
        let entry_path = entry.path();
        if !entry_path.is_file() {
            continue;
        }
        let name = entry.file_name();
        if wildcard_match(&file_part, &name.to_string_lossy()) {
            files.push(entry_path);
        }
    }

    files.sort();
    log::debug!("Pattern '{}' matched {} files", expanded, files.len());
    Ok(files)
}
