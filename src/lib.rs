// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava-Roast: fetch recent Strava activities, have an LLM write a witty
//! critique for each, and push the critique back as the activity's
//! description.
//!
//! The pipeline keeps its state in flat JSON files (activities, critiques,
//! tokens) so every stage is idempotent and safe to re-run.

pub mod cli;
pub mod config;
pub mod error;
pub mod formatters;
pub mod llm;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod time_utils;
