//! The decision pipeline.
//!
//! An ordered, first-match-wins table of `(predicate, outcome)` rules over an
//! immutable update snapshot. Order is part of the contract: a title such as
//! "x86-64 Driver" hits the x86 rule before the x64 rule is ever consulted.

use log::trace;

use super::locale::LocaleMatcher;
use crate::config::PolicyConfig;
use crate::server::UpdateRecord;

/// Architecture named by an architecture decline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// Itanium
    Ia64,
    /// 64-bit ARM
    Arm64,
    /// 32-bit x86
    X86,
    /// x64
    X64,
}

impl Architecture {
    /// Lower-case name as it appears in titles.
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Ia64 => "ia64",
            Architecture::Arm64 => "arm64",
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with one update in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Not selected by the subscription any more
    Delete,
    /// Declined for the given architecture
    DeclineArch(Architecture),
    /// Title mentions "preview"
    DeclinePreview,
    /// Flagged as beta
    DeclineBeta,
    /// Localized for a locale outside the allow-list
    DeclineLanguage,
    /// Superseded or expired; declined in the second pass, after approvals
    DeferSupersededOrExpired,
    /// Approved for the target group
    Approve,
    /// Approved after accepting its license agreement
    ApproveWithLicense,
    /// No rule applies
    Skip,
}

impl Decision {
    /// Short label used in the action log.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Delete => "delete",
            Decision::DeclineArch(_) => "decline-arch",
            Decision::DeclinePreview => "decline-preview",
            Decision::DeclineBeta => "decline-beta",
            Decision::DeclineLanguage => "decline-language",
            Decision::DeferSupersededOrExpired => "defer",
            Decision::Approve => "approve",
            Decision::ApproveWithLicense => "approve-with-license",
            Decision::Skip => "skip",
        }
    }

    /// True for the decline outcomes of the first pass.
    pub fn is_decline(&self) -> bool {
        matches!(
            self,
            Decision::DeclineArch(_)
                | Decision::DeclinePreview
                | Decision::DeclineBeta
                | Decision::DeclineLanguage
        )
    }

    /// True for both approval outcomes.
    pub fn is_approval(&self) -> bool {
        matches!(self, Decision::Approve | Decision::ApproveWithLicense)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::DeclineArch(arch) => write!(f, "decline-arch({arch})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// The update under evaluation, with its names lower-cased once.
struct Subject<'a> {
    update: &'a UpdateRecord,
    title: String,
    legacy_name: String,
}

impl Subject<'_> {
    fn title_has(&self, needle: &str) -> bool {
        self.title.contains(needle)
    }
}

struct Rule {
    name: &'static str,
    applies: fn(&Subject<'_>, &Pipeline) -> bool,
    outcome: fn(&Subject<'_>) -> Decision,
}

/// Rules 1 to 9; falling off the end means Skip.
const RULES: &[Rule] = &[
    Rule {
        name: "ia64",
        applies: |s, p| {
            p.policy.decline_ia64
                && ["ia64", "itanium"]
                    .iter()
                    .any(|n| s.title.contains(n) || s.legacy_name.contains(n))
        },
        outcome: |_| Decision::DeclineArch(Architecture::Ia64),
    },
    Rule {
        name: "arm64",
        applies: |s, p| p.policy.decline_arm64 && s.title_has("arm64"),
        outcome: |_| Decision::DeclineArch(Architecture::Arm64),
    },
    Rule {
        name: "x86",
        applies: |s, p| p.policy.decline_x86 && s.title_has("x86"),
        outcome: |_| Decision::DeclineArch(Architecture::X86),
    },
    Rule {
        name: "x64",
        applies: |s, p| p.policy.decline_x64 && s.title_has("x64"),
        outcome: |_| Decision::DeclineArch(Architecture::X64),
    },
    Rule {
        name: "preview",
        applies: |s, p| p.policy.decline_preview && s.title_has("preview"),
        outcome: |_| Decision::DeclinePreview,
    },
    Rule {
        name: "beta",
        applies: |s, p| p.policy.decline_beta && (s.update.is_beta || s.title_has("beta")),
        outcome: |_| Decision::DeclineBeta,
    },
    Rule {
        name: "language",
        applies: |s, p| {
            !p.policy.allowed_locales.is_empty()
                && p.locales.matches_disallowed_locale(&s.update.title)
        },
        outcome: |_| Decision::DeclineLanguage,
    },
    Rule {
        name: "superseded-or-expired",
        applies: |s, _| s.update.is_superseded_or_expired(),
        outcome: |_| Decision::DeferSupersededOrExpired,
    },
    Rule {
        name: "approve",
        applies: |s, p| {
            !s.update.is_approved
                && !p.policy.decline_only
                && (s.update.is_wsus_infrastructure_update
                    || p
                        .policy
                        .approve_classifications
                        .contains(&s.update.classification_title))
        },
        outcome: |s| {
            if s.update.requires_license_agreement_acceptance {
                Decision::ApproveWithLicense
            } else {
                Decision::Approve
            }
        },
    },
];

/// The policy plus the compiled locale matcher.
#[derive(Debug, Clone)]
pub struct Pipeline {
    policy: PolicyConfig,
    locales: LocaleMatcher,
}

impl Pipeline {
    /// # Errors
    ///
    /// Returns a `regex::Error` if the locale tables cannot be compiled.
    pub fn new(policy: PolicyConfig) -> Result<Self, regex::Error> {
        let locales = LocaleMatcher::new(&policy.known_locales, &policy.allowed_locales)?;
        Ok(Self { policy, locales })
    }

    /// Policy the pipeline evaluates.
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Evaluates rules 1-10 for a retained update.
    pub fn decide(&self, update: &UpdateRecord) -> Decision {
        let subject = Subject {
            update,
            title: update.title.to_lowercase(),
            legacy_name: update.legacy_name.to_lowercase(),
        };
        for rule in RULES {
            if (rule.applies)(&subject, self) {
                let decision = (rule.outcome)(&subject);
                trace!("{} -> {} (rule {})", update.id, decision, rule.name);
                return decision;
            }
        }
        Decision::Skip
    }
}
