// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Flat-file JSON persistence for the pipeline.

mod activities;
mod critiques;

pub use activities::{load_activities, save_activities};
pub use critiques::{CritiqueEntry, CritiqueStore};
