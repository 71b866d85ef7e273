// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activities file: the JSON array written by the fetch stage and read back
//! when fetch is skipped.

use serde_json::Value;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Activity;

/// Load activities from `path`, skipping records that are not objects with an id.
pub fn load_activities(path: &Path) -> Result<Vec<Activity>> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            AppError::Config(format!("未找到活动文件：{}", path.display()))
        } else {
            err.into()
        }
    })?;

    let value: Value = serde_json::from_str(&raw).map_err(|e| {
        AppError::MalformedStore(format!("{} 不是合法的 JSON：{}", path.display(), e))
    })?;
    let Value::Array(items) = value else {
        return Err(AppError::MalformedStore(format!(
            "{} 顶层必须是活动数组。",
            path.display()
        )));
    };

    let mut activities = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<Activity>(item) {
            Ok(activity) => activities.push(activity),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping unreadable activity record");
            }
        }
    }
    Ok(activities)
}

/// Write the fetched activities as a pretty JSON array.
pub fn save_activities(path: &Path, activities: &[Activity]) -> Result<()> {
    let json = serde_json::to_string_pretty(activities)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Activity serialization failed: {}", e)))?;
    std::fs::write(path, json)?;
    Ok(())
}
