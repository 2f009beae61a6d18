// ABOUTME: Compile-fail test verifying a PendingSwap can only come from swap_slots.
// ABOUTME: This test should fail to compile, validating type safety.

use hubstack::slot::PendingSwap;
use hubstack::types::Slot;
use std::path::PathBuf;

fn main() {
    // ERROR: fields of PendingSwap are private
    let _swap = PendingSwap {
        from: Slot::A,
        to: Slot::B,
        backup: PathBuf::new(),
    };
}
