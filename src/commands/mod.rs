// ABOUTME: Command module aggregator for the hubstack CLI.
// ABOUTME: Re-exports the handlers main dispatches to.

mod cert;
mod clean;
mod context;
mod deploy;
mod slot;

pub use cert::{cert_renew, cert_status};
pub use clean::{clean, revert};
pub use context::Host;
pub use deploy::deploy;
pub use slot::slot_status;

use hubstack::diagnostics::Diagnostics;
use hubstack::output::Output;

/// Surface collected warnings to the operator.
fn emit_warnings(output: &Output, diag: &Diagnostics) {
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
}
