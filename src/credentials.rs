//! Catalog API credential acquisition
//!
//! The Beatport client never owns credential policy; it asks an injected
//! [`CredentialProvider`] for a token, passing `force_refresh = true` after a
//! 401. The file-cache variant keeps the token in a local file and falls back
//! to an interactive prompt when the cache is missing or stale.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Source of the catalog API bearer token
pub trait CredentialProvider: Send + Sync {
    /// Current token; `force_refresh` bypasses any cache
    fn token(&self, force_refresh: bool) -> Result<String>;
}

/// Fixed token, typically injected from the environment
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl CredentialProvider for StaticToken {
    fn token(&self, _force_refresh: bool) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// File-cached token with interactive prompt fallback
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CredentialProvider for FileCache {
    fn token(&self, force_refresh: bool) -> Result<String> {
        if !force_refresh && self.path.exists() {
            debug!("Reading API token from {}", self.path.display());
            let token = std::fs::read_to_string(&self.path)?;
            return Ok(token.trim().to_string());
        }

        let token = prompt_token()?;
        std::fs::write(&self.path, &token)?;
        info!("API token cached at {}", self.path.display());
        Ok(token)
    }
}

/// Always prompts on stdin; useful when caching the token is undesirable
pub struct InteractivePrompt;

impl CredentialProvider for InteractivePrompt {
    fn token(&self, _force_refresh: bool) -> Result<String> {
        prompt_token()
    }
}

fn prompt_token() -> Result<String> {
    eprint!("Enter your Beatport API token: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let token = line.trim().to_string();
    if token.is_empty() {
        return Err(Error::Config("empty API token entered".into()));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_token_ignores_refresh() {
        let provider = StaticToken::new("abc");
        assert_eq!(provider.token(false).unwrap(), "abc");
        assert_eq!(provider.token(true).unwrap(), "abc");
    }

    #[test]
    fn file_cache_reads_existing_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".bp_cache");
        std::fs::write(&path, "cached-token\n").unwrap();

        let provider = FileCache::new(path);
        assert_eq!(provider.token(false).unwrap(), "cached-token");
    }
}
