// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Critique store: one JSON object keyed by activity id.
//!
//! The store is append/update-only. Every save rewrites the whole file, and
//! the upload stage saves after each successful write so a crash loses at
//! most the in-flight item. Entries are kept in a `BTreeMap` so iteration
//! and serialization order are deterministic.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{AppError, Result};

/// One critique and its upload state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CritiqueEntry {
    pub critique: String,
    #[serde(default)]
    pub uploaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

impl CritiqueEntry {
    /// Fresh, not-yet-uploaded entry.
    pub fn new(critique: impl Into<String>) -> Self {
        Self {
            critique: critique.into(),
            uploaded: false,
            updated_description: None,
            uploaded_at: None,
        }
    }
}

/// The critique store, keyed by activity id string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CritiqueStore {
    entries: BTreeMap<String, CritiqueEntry>,
}

impl CritiqueStore {
    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store. Legacy entries that are a bare
    /// string normalize to `{critique, uploaded: false}`. A parse error or a
    /// non-object top level is fatal: the structural contract cannot be
    /// trusted otherwise.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };

        let value: Value = serde_json::from_str(&raw).map_err(|e| {
            AppError::MalformedStore(format!("{} 不是合法的 JSON：{}", path.display(), e))
        })?;
        let Value::Object(map) = value else {
            return Err(AppError::MalformedStore(format!(
                "{} 顶层必须是以活动 id 为键的对象。",
                path.display()
            )));
        };

        let mut entries = BTreeMap::new();
        for (activity_id, entry) in map {
            match entry {
                Value::String(critique) => {
                    entries.insert(activity_id, CritiqueEntry::new(critique));
                }
                Value::Object(_) => match serde_json::from_value::<CritiqueEntry>(entry) {
                    Ok(parsed) => {
                        entries.insert(activity_id, parsed);
                    }
                    Err(err) => {
                        tracing::warn!(activity_id = %activity_id, error = %err, "Dropping unreadable critique entry");
                    }
                },
                _ => {
                    tracing::warn!(activity_id = %activity_id, "Dropping critique entry with unexpected shape");
                }
            }
        }
        Ok(Self { entries })
    }

    /// Rewrite the whole store at `path` with stable pretty formatting.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Store serialization failed: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Entries not yet uploaded, in store iteration order.
    pub fn pending(&self) -> impl Iterator<Item = (&String, &CritiqueEntry)> {
        self.entries.iter().filter(|(_, entry)| !entry.uploaded)
    }

    pub fn get(&self, activity_id: &str) -> Option<&CritiqueEntry> {
        self.entries.get(activity_id)
    }

    /// Create or replace the entry for `activity_id` with a fresh critique.
    pub fn upsert(&mut self, activity_id: impl Into<String>, critique: impl Into<String>) {
        self.entries
            .insert(activity_id.into(), CritiqueEntry::new(critique));
    }

    /// Flip an entry to uploaded and stamp the upload metadata.
    ///
    /// Only ever called after a confirmed successful API write.
    pub fn mark_uploaded(
        &mut self,
        activity_id: &str,
        updated_description: String,
        uploaded_at: String,
    ) {
        if let Some(entry) = self.entries.get_mut(activity_id) {
            entry.uploaded = true;
            entry.updated_description = Some(updated_description);
            entry.uploaded_at = Some(uploaded_at);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CritiqueEntry)> {
        self.entries.iter()
    }
}
