//! Nested entity → date → count report and its JSON output

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::config::OutputStyle;
use crate::record::RecordLayout;
use crate::table::CountTable;

const PRETTY_INDENT: &[u8] = b"    ";

/// Per-entity date counts.
///
/// Entities appear in the order the table first saw them; dates within an
/// entity are ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Report {
    entities: IndexMap<String, BTreeMap<String, u64>>,
}

impl Report {
    /// Regroup composite keys by entity.
    pub fn from_table(table: &CountTable, layout: &RecordLayout) -> Self {
        let mut entities: IndexMap<String, BTreeMap<String, u64>> = IndexMap::new();
        for (key, count) in table {
            let (entity, date) = layout.split_key(key);
            *entities
                .entry(String::from_utf8_lossy(entity).into_owned())
                .or_default()
                .entry(String::from_utf8_lossy(date).into_owned())
                .or_insert(0) += count;
        }
        Self { entities }
    }

    pub fn entity(&self, entity: &str) -> Option<&BTreeMap<String, u64>> {
        self.entities.get(entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, u64>)> {
        self.entities.iter()
    }

    /// Number of distinct entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entities.values().flat_map(|dates| dates.values()).sum()
    }

    pub fn to_json(&self, style: OutputStyle) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        match style {
            OutputStyle::Pretty => {
                let formatter = serde_json::ser::PrettyFormatter::with_indent(PRETTY_INDENT);
                let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
                self.serialize(&mut serializer)
                    .context("Failed to serialize report")?;
            }
            OutputStyle::Compact => {
                serde_json::to_writer(&mut buf, self).context("Failed to serialize report")?;
            }
        }
        Ok(buf)
    }

    /// Replace the file at `path` with this report.
    ///
    /// The report is written next to `path` under a temporary name and
    /// renamed into place, so `path` is either the old file or the complete
    /// new one.
    pub fn write_to(&self, path: &Path, style: OutputStyle) -> Result<()> {
        let bytes = self.to_json(style)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| {
            format!("Failed to create temporary output file in {}", dir.display())
        })?;
        tmp.write_all(&bytes)
            .and_then(|_| tmp.flush())
            .with_context(|| format!("Failed to write report for {}", path.display()))?;

        // Keep the permissions of a file being replaced
        if let Ok(existing) = fs::metadata(path) {
            fs::set_permissions(tmp.path(), existing.permissions()).with_context(|| {
                format!("Failed to copy permissions of {}", path.display())
            })?;
        } else {
            set_default_permissions(tmp.path())?;
        }

        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(unix)]
fn set_default_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_default_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
