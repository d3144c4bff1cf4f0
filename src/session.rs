//! Per-session analysis state
//!
//! History is append-only: every successful description adds exactly one
//! [`AnalysisRecord`] and records are never edited afterwards.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Result of one successful description call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRecord {
    sequence: usize,
    image: Arc<[u8]>,
    width: u32,
    height: u32,
    description: String,
    created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// 1-based position in the session history
    #[must_use]
    pub const fn sequence(&self) -> usize {
        self.sequence
    }

    /// PNG of the drawing that was described
    #[must_use]
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Mutable state for one interactive session
#[derive(Debug, Default)]
pub struct SessionState {
    history: Vec<AnalysisRecord>,
    last_description: Option<String>,
    last_story: Option<String>,
    analysis_done: bool,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful analysis and make it the current result
    ///
    /// Any story built on the previous description is dropped.
    pub fn append(
        &mut self,
        image: Vec<u8>,
        width: u32,
        height: u32,
        description: String,
    ) -> AnalysisRecord {
        let record = AnalysisRecord {
            sequence: self.history.len() + 1,
            image: image.into(),
            width,
            height,
            description: description.clone(),
            created_at: Utc::now(),
        };
        self.history.push(record.clone());
        self.last_description = Some(description);
        self.last_story = None;
        self.analysis_done = true;
        record
    }

    /// Store a story generated from the current description
    pub fn set_story(&mut self, story: String) {
        self.last_story = Some(story);
    }

    /// Hide the current result without touching history
    pub fn reset_display(&mut self) {
        self.analysis_done = false;
    }

    /// Forget every past analysis
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.last_description = None;
        self.last_story = None;
        self.analysis_done = false;
    }

    /// Up to `n` most recent records, newest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &AnalysisRecord> {
        self.history.iter().rev().take(n)
    }

    /// Full history, oldest first
    #[must_use]
    pub fn history(&self) -> &[AnalysisRecord] {
        &self.history
    }

    #[must_use]
    pub fn last_description(&self) -> Option<&str> {
        self.last_description.as_deref()
    }

    #[must_use]
    pub fn last_story(&self) -> Option<&str> {
        self.last_story.as_deref()
    }

    /// Whether the current result should be displayed
    #[must_use]
    pub const fn analysis_done(&self) -> bool {
        self.analysis_done
    }

    /// Most recent record, if any
    #[must_use]
    pub fn latest(&self) -> Option<&AnalysisRecord> {
        self.history.last()
    }
}
