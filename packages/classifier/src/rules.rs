//! The keyword rule table behind [`crate::classify`].
//!
//! Rules are evaluated in order and the first rule with a matching text
//! field decides the verdict, so pedestrian/cyclist rules sit above the
//! vehicle-only rule. Bump [`RULE_TABLE_VERSION`] whenever a term list
//! changes so archived verdicts can be traced back to the table that
//! produced them.

use traffic_watch_incident_models::Verdict;

/// Version of [`RULES`].
pub const RULE_TABLE_VERSION: u32 = 1;

/// Robbery and weapon language. A top-level field containing any of these
/// vetoes the whole incident; an update containing one is ignored.
pub const BANNED_TERMS: &[&str] = &[
    "robbed",
    "burglar",
    "stolen",
    "gunmen",
    "armed",
    "gunman",
    "breaking into",
];

/// Only these terms count in a field that mentions a fire hydrant.
pub const HYDRANT_QUALIFIERS: &[&str] = &["pedestrian", "bicyclist", "bicycle", "scooter"];

const HYDRANT: &str = "hydrant";

/// Which text fields of an incident a rule looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextScope {
    /// `raw` and `title`.
    TopLevel,
    /// Every update's `text`, `ROOT` included.
    Updates,
}

/// Narrows a rule's include terms when `trigger` appears in the field.
#[derive(Debug, Clone, Copy)]
pub struct TermGuard {
    /// Lowercase term that activates the guard.
    pub trigger: &'static str,
    /// Include terms that still count once the guard is active. An empty
    /// list means the field can never match.
    pub allowed: &'static [&'static str],
}

/// One row of the rule table.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    /// Verdict assigned when the rule matches.
    pub verdict: Verdict,
    /// Fields the rule inspects.
    pub scope: TextScope,
    /// A field matches if it contains any of these...
    pub include: &'static [&'static str],
    /// ...and none of these.
    pub exclude: &'static [&'static str],
    /// Optional narrowing of `include`.
    pub guard: Option<TermGuard>,
}

impl ClassificationRule {
    /// Whether a single lowercased text field satisfies this rule.
    #[must_use]
    pub fn matches_text(&self, lower: &str) -> bool {
        if contains_any(lower, self.exclude) {
            return false;
        }
        let include = match self.guard {
            Some(guard) if lower.contains(guard.trigger) => guard.allowed,
            _ => self.include,
        };
        contains_any(lower, include)
    }
}

/// An ordered, versioned list of rules plus the incident-level veto.
#[derive(Debug, Clone, Copy)]
pub struct RuleTable {
    /// Table version.
    pub version: u32,
    /// Terms that make an incident irrelevant when found in `raw`/`title`.
    pub veto_terms: &'static [&'static str],
    /// Rules in priority order.
    pub rules: &'static [ClassificationRule],
}

const HYDRANT_GUARD: TermGuard = TermGuard {
    trigger: HYDRANT,
    allowed: HYDRANT_QUALIFIERS,
};

/// The rule table used in production.
pub const RULES: RuleTable = RuleTable {
    version: RULE_TABLE_VERSION,
    veto_terms: BANNED_TERMS,
    rules: &[
        ClassificationRule {
            verdict: Verdict::PedestrianOrCyclist,
            scope: TextScope::TopLevel,
            include: &[
                "pedestrian",
                "cyclist",
                "bicyclist",
                "struck by vehicle",
                "hit by vehicle",
                "bicycle",
                "scooter",
            ],
            exclude: BANNED_TERMS,
            guard: Some(HYDRANT_GUARD),
        },
        ClassificationRule {
            verdict: Verdict::PedestrianOrCyclist,
            scope: TextScope::Updates,
            include: &[
                "pedestrian",
                "bicyclist",
                "struck by vehicle",
                "bicycle",
                "scooter",
            ],
            exclude: BANNED_TERMS,
            guard: Some(HYDRANT_GUARD),
        },
        ClassificationRule {
            verdict: Verdict::VehicleOnly,
            scope: TextScope::TopLevel,
            include: &[
                "vehicle collision",
                "vehicle flipped",
                "overturned vehicle",
                "dragging vehicle",
                "hit-and-run",
            ],
            exclude: BANNED_TERMS,
            guard: Some(TermGuard {
                trigger: HYDRANT,
                allowed: &[],
            }),
        },
    ],
};

/// Checks if `haystack` contains any of the given `needles`.
pub(crate) fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
