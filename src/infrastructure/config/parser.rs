//! INI parser - Parses configuration text into a settings table

use std::collections::{BTreeMap, HashSet};

use super::ConfigTable;
use crate::application::errors::ConfigError;

/// Parse INI text into a `section -> key -> value` table.
///
/// - `[section]` headers, names kept verbatim
/// - `key = value` or `key: value`, keys lowercased
/// - full-line comments starting with `#` or `;`
/// - lines indented deeper than their option continue its value, blank
///   lines in between are kept and trailing ones dropped
///
/// A section or key repeated within the same text is an error.
pub fn parse(contents: &str) -> Result<ConfigTable, ConfigError> {
    let mut table = ConfigTable::new();
    let mut seen_sections = HashSet::new();
    let mut section: Option<String> = None;
    // key of the option being continued and the indent of its line
    let mut current: Option<(String, usize)> = None;
    let mut pending_blanks = 0;

    for (index, raw) in contents.lines().enumerate() {
        let lineno = index + 1;
        let line = raw.trim();

        if line.is_empty() {
            if current.is_some() {
                pending_blanks += 1;
            }
            continue;
        }
        if line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let indent = raw.len() - raw.trim_start().len();
        if let (Some(name), Some((key, option_indent))) = (&section, &current) {
            if indent > *option_indent {
                if let Some(value) = table.get_mut(name).and_then(|s| s.get_mut(key)) {
                    for _ in 0..=pending_blanks {
                        value.push('\n');
                    }
                    value.push_str(line);
                    pending_blanks = 0;
                    continue;
                }
            }
        }
        current = None;
        pending_blanks = 0;

        if let Some(header) = parse_header(line) {
            if header.is_empty() {
                return Err(ConfigError::parse(lineno, "empty section name"));
            }
            if !seen_sections.insert(header.to_string()) {
                return Err(ConfigError::parse(lineno, format!("section '{}' already exists", header)));
            }
            table.entry(header.to_string()).or_insert_with(BTreeMap::new);
            section = Some(header.to_string());
            continue;
        }

        let Some(name) = &section else {
            return Err(ConfigError::parse(lineno, "file contains no section headers"));
        };

        let (key, value) = split_option(line)
            .ok_or_else(|| ConfigError::parse(lineno, format!("expected `key = value`, got '{}'", line)))?;
        if key.is_empty() {
            return Err(ConfigError::parse(lineno, "empty option name"));
        }

        let entries = table.entry(name.clone()).or_default();
        if entries.contains_key(&key) {
            return Err(ConfigError::parse(
                lineno,
                format!("option '{}' in section '{}' already exists", key, name),
            ));
        }
        entries.insert(key.clone(), value.to_string());
        current = Some((key, indent));
    }

    Ok(table)
}

fn parse_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']').map(str::trim)
}

/// Split on the first `=` or `:`
fn split_option(line: &str) -> Option<(String, &str)> {
    let pos = line.find(&['=', ':'][..])?;
    let key = line[..pos].trim().to_lowercase();
    let value = line[pos + 1..].trim();
    Some((key, value))
}
