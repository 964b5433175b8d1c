//! Shell text helpers
//!
//! Remote stages talk to a POSIX shell on the far side of an ssh session.
//! Everything interpolated into a command goes through these helpers.

/// Quote a string for a POSIX shell using single quotes.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Quote a remote path, keeping a leading `~/` outside the quotes so the
/// remote shell still expands it.
pub fn quote_path(path: &str) -> String {
    if path == "~" {
        return "~".to_string();
    }
    match path.strip_prefix("~/") {
        Some(rest) => format!("~/{}", shell_quote(rest)),
        None => shell_quote(path),
    }
}

/// Join a remote path onto a base unless it is already absolute.
pub fn remote_join(base: &str, path: &str) -> String {
    if path.starts_with('/') || path == "~" || path.starts_with("~/") {
        return path.to_string();
    }
    let path = path.trim_start_matches("./");
    if path.is_empty() || path == "." {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// Replace a leading `~` with the remote home directory.
pub fn expand_home(path: &str, home: &str) -> String {
    let home = home.trim_end_matches('/');
    if path == "~" {
        return home.to_string();
    }
    match path.strip_prefix("~/") {
        Some(rest) => format!("{}/{}", home, rest),
        None => path.to_string(),
    }
}

/// Parent directory of a remote path (`/` for top-level entries).
pub fn remote_parent(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => trimmed[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// Final component of a remote path.
pub fn remote_file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Abbreviate a command for log lines.
pub fn abbreviate(command: &str, max: usize) -> String {
    let first_line = command.lines().next().unwrap_or_default();
    let multi = command.lines().nth(1).is_some();
    if first_line.chars().count() <= max && !multi {
        return first_line.to_string();
    }
    let cut: String = first_line.chars().take(max).collect();
    format!("{}…", cut)
}
