//! Activity classification.
//!
//! Two tiers: the explicit table stored in the engine state is consulted
//! first, then a keyword rule table evaluated in order. Labels matching
//! neither are neutral.

use std::collections::BTreeMap;

use crate::types::{ActivityKind, ActivityMeta, DEFAULT_RATE};

/// A keyword rule: any keyword found in the lowercased label selects `meta`.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub meta: ActivityMeta,
}

/// Fallback rules, in priority order. Relax wins over productive so
/// "Phone (Work)" still costs currency.
pub const DEFAULT_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &[
            "phone", "scroll", "tv", "gaming", "sleep", "nap", "idle", "bed", "media", "tiktok",
            "youtube", "reddit", "movie",
        ],
        meta: ActivityMeta::relax(DEFAULT_RATE),
    },
    KeywordRule {
        keywords: &[
            "work", "learn", "study", "clean", "cook", "exercise", "workout", "plan", "draw",
            "read", "admin", "laundry", "dish", "groc", "errand", "budget", "code", "practice",
            "cardio", "weights",
        ],
        meta: ActivityMeta::productive(DEFAULT_RATE),
    },
];

/// The curated classifications every new state starts with.
pub fn default_activity_meta() -> BTreeMap<String, ActivityMeta> {
    [
        ("Work", ActivityMeta::productive(1.0)),
        ("Cleaning", ActivityMeta::productive(1.2)),
        ("Workout", ActivityMeta::productive(1.5)),
        ("Deep Focus", ActivityMeta::productive(2.0)),
        ("Errands", ActivityMeta::productive(0.8)),
        ("Planning", ActivityMeta::productive(1.1)),
        ("Conversation (Focused)", ActivityMeta::productive(1.0)),
        ("Gaming", ActivityMeta::relax(1.6)),
        ("TV", ActivityMeta::relax(1.2)),
        ("Scrolling", ActivityMeta::relax(1.9)),
        ("Bed (Awake)", ActivityMeta::relax(1.4)),
        ("Shower", ActivityMeta::neutral()),
        ("Eating", ActivityMeta::neutral()),
        ("Sleep", ActivityMeta::neutral()),
        ("Conversation (Casual)", ActivityMeta::neutral()),
    ]
    .into_iter()
    .map(|(label, meta)| (label.to_string(), meta))
    .collect()
}

/// Classifies `label` using `table`, then [`DEFAULT_RULES`].
pub fn classify(label: &str, table: &BTreeMap<String, ActivityMeta>) -> ActivityMeta {
    classify_with(label, table, DEFAULT_RULES)
}

/// Classifies `label` against an explicit table and rule list.
pub fn classify_with(
    label: &str,
    table: &BTreeMap<String, ActivityMeta>,
    rules: &[KeywordRule],
) -> ActivityMeta {
    if let Some(meta) = table.get(label) {
        return *meta;
    }
    let lowered = label.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k)))
        .map_or_else(ActivityMeta::neutral, |rule| rule.meta)
}

/// Short rate label, e.g. `+2.0/m`, `-1.2/m` or `0/m`.
pub fn rate_label(meta: &ActivityMeta) -> String {
    match meta.kind {
        ActivityKind::Productive => format!("+{:.1}/m", meta.rate()),
        ActivityKind::Relax => format!("-{:.1}/m", meta.rate()),
        ActivityKind::Neutral => "0/m".to_string(),
    }
}
