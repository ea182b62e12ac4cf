//! Review-feedback correlation engine.
//!
//! Takes a revision's raw comment stream and its unified diff, and produces
//! a report of comments annotated with the surrounding source lines they
//! refer to, a coarse priority per comment, and generated action items:
//!
//! 1. [`diff`] parses the unified diff into file → hunk → line structures.
//! 2. [`correlate`] maps each comment to a file/line, explicit metadata
//!    first, keyword matching as the fallback.
//! 3. [`classify`] buckets each comment into Issue/Suggestion/Nit/Other.
//! 4. [`report`] aggregates everything into a [`FeedbackReport`].
//!
//! The whole pipeline is synchronous and bounded by input size; the only
//! I/O happens upstream, in the Conduit client.

pub mod classify;
pub mod correlate;
pub mod diff;
pub mod keywords;
pub mod report;

pub use classify::{Category, ClassifierRules, ClassifiedComment};
pub use correlate::{CodeContext, Confidence, ContextLine, Correlator, LocatedComment};
pub use diff::{DiffFile, DiffLine, Hunk, LineKind};
pub use report::{CategoryCounts, FeedbackEntry, FeedbackReport, UNATTRIBUTED};

use phab_core::{RawComment, Result, Revision};

/// Configuration for one run of the review pipeline.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    /// Lines of surrounding source to attach before and after each target
    pub context_lines: usize,
    /// When false, the diff is not consulted at all and no context windows
    /// are attached; classification still runs
    pub enrich_context: bool,
    /// Classifier keyword lists
    pub rules: ClassifierRules,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            context_lines: 7,
            enrich_context: true,
            rules: ClassifierRules::default(),
        }
    }
}

/// Run the full pipeline: parse, correlate, classify, aggregate.
///
/// A malformed diff aborts the whole call; anything that affects only a
/// single comment degrades that comment to unresolved/Other instead.
pub fn build_report(
    revision: Revision,
    comments: &[RawComment],
    raw_diff: Option<&str>,
    config: &ReviewConfig,
) -> Result<FeedbackReport> {
    let files = match raw_diff {
        Some(raw) if config.enrich_context => diff::parse(raw)?,
        _ => Vec::new(),
    };

    tracing::debug!(
        files = files.len(),
        comments = comments.len(),
        "running review pipeline"
    );

    let located = correlate::correlate(comments, &files, config.context_lines);
    let classified = classify::classify_all(&config.rules, located);
    Ok(report::aggregate(revision, classified))
}
