//! Parsers for `git` plumbing output
//!
//! Every command whose output is parsed runs with `-z`, so paths arrive
//! NUL-separated and unquoted.

use super::gateway::DiffEntry;
use crate::error::{Error, Result};

/// Split NUL-terminated output into paths
pub fn parse_nul_list(raw: &[u8]) -> Vec<String> {
    raw.split(|b| *b == 0)
        .filter(|field| !field.is_empty())
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

/// Parse `git diff --name-status -z`
///
/// Fields come as `STATUS\0PATH\0`, or `STATUS\0OLD\0NEW\0` for renames and
/// copies. Type changes and unmerged entries are reported as modifications.
pub fn parse_name_status(raw: &[u8]) -> Result<Vec<DiffEntry>> {
    let fields = parse_nul_list(raw);
    let mut entries = Vec::new();
    let mut iter = fields.into_iter();

    while let Some(status) = iter.next() {
        let code = status.chars().next().unwrap_or(' ');
        let mut next_path = || {
            iter.next().ok_or_else(|| {
                Error::git_operation(format!("truncated name-status output after '{}'", status))
            })
        };

        let entry = match code {
            'A' => DiffEntry::added(next_path()?),
            'D' => DiffEntry::deleted(next_path()?),
            'M' | 'T' | 'U' => DiffEntry::modified(next_path()?),
            'R' => {
                let old = next_path()?;
                let new = next_path()?;
                DiffEntry::renamed(old, new)
            }
            'C' => {
                let _source = next_path()?;
                DiffEntry::added(next_path()?)
            }
            other => {
                return Err(Error::git_operation(format!(
                    "unexpected name-status code '{}'",
                    other
                )))
            }
        };
        entries.push(entry);
    }

    Ok(entries)
}

/// First non-empty trimmed line of command output
pub fn first_line(raw: &[u8]) -> Option<String> {
    String::from_utf8_lossy(raw)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
