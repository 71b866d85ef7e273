// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod critic;
pub mod pipeline;
pub mod strava;
pub mod tokens;

pub use critic::{Critic, CritiqueGenerator};
pub use pipeline::{Pipeline, PipelineOptions};
pub use strava::StravaClient;
pub use tokens::{TokenStore, TOKEN_REFRESH_MARGIN_SECS};
