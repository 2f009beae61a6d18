// ABOUTME: Destructive teardown: selective cleanup and full revert.
// ABOUTME: Rule lists decide what is ours; reports record what each phase did.

mod orchestrator;
mod report;
mod rules;

pub use orchestrator::{CleanupError, CleanupOrchestrator, CleanupPlan};
pub use report::{CertificateOutcome, CleanupReport, Failure, Phase, PhaseReport};
pub use rules::{MatchRule, RESERVED_NETWORKS, RuleSet};
