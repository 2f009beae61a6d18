// ABOUTME: Compile-fail test verifying finalize is not available before services start.
// ABOUTME: This test should fail to compile, validating state machine enforcement.

use hubstack::deploy::{Deployment, Planned};
use hubstack::diagnostics::Diagnostics;
use hubstack::slot::SlotManager;

async fn skip_ahead(deployment: Deployment<Planned>, slots: &mut SlotManager) {
    let mut diag = Diagnostics::default();
    // ERROR: no method named `finalize` found for `Deployment<Planned>`
    let _ = deployment.finalize(slots, &(), &mut diag).await;
}

fn main() {}
