// ABOUTME: Compile-fail test verifying finalize_swap consumes the PendingSwap.
// ABOUTME: This test should fail to compile, validating type safety.

use hubstack::slot::{SlotError, SlotManager};

fn swap_twice(slots: &mut SlotManager) -> Result<(), SlotError> {
    let pending = slots.swap_slots(chrono::Utc::now())?;
    slots.finalize_swap(pending)?;
    slots.finalize_swap(pending)?; // ERROR: use of moved value
    Ok(())
}

fn main() {}
