//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Rewrite an http(s) url to the matching websocket scheme.
///
/// Other schemes (including `ws://` and `wss://`) are returned unchanged.
///
/// # Examples
/// ```ignore
/// normalize_socket_url("http://localhost:8080/~watch.js")  -> "ws://localhost:8080/~watch.js"
/// normalize_socket_url("https://example.com/~watch.js")    -> "wss://example.com/~watch.js"
/// normalize_socket_url("ws://localhost/~watch.js")         -> "ws://localhost/~watch.js"
/// ```
pub fn normalize_socket_url(url: &str) -> String {
    let url = url.trim();
    if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else {
        url.to_string()
    }
}

/// Find config file by searching upward from `start`.
///
/// An absolute `config_name` is checked as is.
///
/// ```text
/// /home/user/site/assets/css/  ← start
/// /home/user/site/relive.toml  ← found!
/// ```
pub fn find_config_file(config_name: &Path, start: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}
