//! SSH client config editing.
//!
//! The config file is modelled as a preamble followed by an ordered list of
//! stanzas. A stanza starts at any line whose first keyword is `Host` or
//! `Match` and owns every line up to the next such line. User-authored
//! stanzas are carried through untouched; gitmt only rewrites stanzas whose
//! header is exactly `Host github.com-<alias>`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::AppError;

/// Host every alias points at
pub const GITHUB_HOST: &str = "github.com";

/// SSH host alias for an identity alias
pub fn host_alias(alias: &str) -> String {
    format!("{GITHUB_HOST}-{alias}")
}

/// Splits a config line into its keyword and the rest, accepting `Key value` and `Key=value`
fn split_keyword(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let end = trimmed
        .find(|c: char| c.is_whitespace() || c == '=')
        .unwrap_or(trimmed.len());
    let (keyword, rest) = trimmed.split_at(end);
    let rest = rest.trim_start().trim_start_matches('=').trim();
    Some((keyword, rest))
}

fn starts_stanza(line: &str) -> bool {
    split_keyword(line).is_some_and(|(keyword, _)| {
        keyword.eq_ignore_ascii_case("host") || keyword.eq_ignore_ascii_case("match")
    })
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// One `Host`/`Match` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stanza {
    pub header: String,
    pub body: Vec<String>,
}

impl Stanza {
    /// The stanza gitmt manages for `alias`
    pub fn for_alias(alias: &str, key_path: &Path) -> Self {
        Self {
            header: format!("Host {}", host_alias(alias)),
            body: vec![
                format!("    HostName {GITHUB_HOST}"),
                "    User git".to_string(),
                format!("    IdentityFile {}", key_path.display()),
                "    IdentitiesOnly yes".to_string(),
            ],
        }
    }

    /// True if the header is `Host <host>` with exactly that single pattern
    pub fn is_host(&self, host: &str) -> bool {
        match split_keyword(&self.header) {
            Some((keyword, patterns)) if keyword.eq_ignore_ascii_case("host") => {
                let mut patterns = patterns.split_whitespace();
                patterns.next() == Some(host) && patterns.next().is_none()
            }
            _ => false,
        }
    }

    fn trailing_blank_lines(&self) -> usize {
        self.body.iter().rev().take_while(|line| is_blank(line)).count()
    }
}

/// Parsed SSH client config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshConfig {
    pub preamble: Vec<String>,
    pub stanzas: Vec<Stanza>,
}

impl SshConfig {
    pub fn parse(text: &str) -> Self {
        let mut config = SshConfig::default();
        for line in text.lines() {
            if starts_stanza(line) {
                config.stanzas.push(Stanza {
                    header: line.to_string(),
                    body: Vec::new(),
                });
            } else {
                match config.stanzas.last_mut() {
                    Some(stanza) => stanza.body.push(line.to_string()),
                    None => config.preamble.push(line.to_string()),
                }
            }
        }
        config
    }

    /// Renders the config trimmed, with exactly one trailing newline
    pub fn render(&self) -> String {
        let lines: Vec<&str> = self
            .preamble
            .iter()
            .map(String::as_str)
            .chain(self.stanzas.iter().flat_map(|stanza| {
                std::iter::once(stanza.header.as_str()).chain(stanza.body.iter().map(String::as_str))
            }))
            .collect();
        let mut text = lines.join("\n").trim().to_string();
        text.push('\n');
        text
    }

    pub fn count(&self, alias: &str) -> usize {
        let host = host_alias(alias);
        self.stanzas.iter().filter(|stanza| stanza.is_host(&host)).count()
    }

    /// Replaces the stanza for `alias` if one exists, otherwise appends it.
    ///
    /// Duplicate stanzas for the same alias are collapsed into the replacement.
    pub fn upsert(&mut self, alias: &str, key_path: &Path) {
        let host = host_alias(alias);
        let mut stanza = Stanza::for_alias(alias, key_path);

        let existing: Vec<usize> = self
            .stanzas
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.is_host(&host))
            .map(|(index, _)| index)
            .collect();

        if let Some((&first, duplicates)) = existing.split_first() {
            for &index in duplicates.iter().rev() {
                self.stanzas.remove(index);
            }
            // Keep the spacing that separated the old stanza from the next one.
            let spacing = self.stanzas[first].trailing_blank_lines();
            stanza.body.extend(std::iter::repeat_n(String::new(), spacing));
            self.stanzas[first] = stanza;
            return;
        }

        let has_stanzas = !self.stanzas.is_empty();
        let previous = match self.stanzas.last_mut() {
            Some(last) => &mut last.body,
            None => &mut self.preamble,
        };
        let has_content = has_stanzas || previous.iter().any(|line| !is_blank(line));
        if has_content && previous.last().is_none_or(|line| !is_blank(line)) {
            previous.push(String::new());
        }
        self.stanzas.push(stanza);
    }

    /// Removes every stanza for `alias`, returning how many were dropped
    pub fn remove(&mut self, alias: &str) -> usize {
        let host = host_alias(alias);
        let before = self.stanzas.len();
        self.stanzas.retain(|stanza| !stanza.is_host(&host));
        before - self.stanzas.len()
    }
}

/// File-backed alias store over the SSH client config
#[derive(Debug, Clone)]
pub struct SshAliasStore {
    path: PathBuf,
}

impl SshAliasStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the config; a missing file is an empty config
    pub fn read(&self) -> Result<SshConfig, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(SshConfig::parse(&text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(SshConfig::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes in place so a symlinked config stays a symlink
    fn write(&self, config: &SshConfig) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, config.render())?;
        Ok(())
    }

    pub fn upsert(&self, alias: &str, key_path: &Path) -> Result<(), AppError> {
        let mut config = self.read()?;
        config.upsert(alias, key_path);
        self.write(&config)?;
        debug!(alias, path = %self.path.display(), "ssh alias upserted");
        Ok(())
    }

    pub fn remove(&self, alias: &str) -> Result<usize, AppError> {
        let mut config = self.read()?;
        let removed = config.remove(alias);
        self.write(&config)?;
        debug!(alias, removed, path = %self.path.display(), "ssh alias removed");
        Ok(removed)
    }

    /// Number of stanzas currently present for `alias`
    pub fn count(&self, alias: &str) -> Result<usize, AppError> {
        Ok(self.read()?.count(alias))
    }
}
