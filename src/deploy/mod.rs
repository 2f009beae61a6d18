// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Planned -> Provisioned -> Started -> Completed, then a final report.

mod deployment;
mod error;
mod health;
mod orchestrator;
mod probe;
mod report;
mod startup;
mod state;
mod transitions;

pub use deployment::Deployment;
pub use error::DeployError;
pub use health::{HealthOutcome, HealthPolicy, wait_until_ready};
pub use orchestrator::{DeployOptions, DeploySettings, DeploymentOrchestrator};
pub use probe::{Reachability, probe};
pub use report::DeployReport;
pub use startup::{StartupMode, StartupPlan, StartupReport};
pub use state::{Completed, Planned, Provisioned, Started};
