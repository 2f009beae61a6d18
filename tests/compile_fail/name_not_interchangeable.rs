// ABOUTME: Compile-fail test verifying ContainerName and VolumeName are not interchangeable.
// ABOUTME: This test should fail to compile, validating type safety.

use hubstack::types::{ContainerName, VolumeName};

fn takes_container(_name: ContainerName) {}

fn main() {
    let volume = VolumeName::new("hub_memos_data");
    takes_container(volume); // ERROR: expected ContainerName, found VolumeName
}
