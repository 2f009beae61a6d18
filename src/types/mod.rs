// ABOUTME: Type-safe names and validated domain types.
// ABOUTME: Uses phantom types to prevent resource-name confusion at compile time.

mod id;
mod service_name;
mod slot;

pub use id::{ContainerName, ImageName, Name, NetworkName, VolumeName};
pub use service_name::{ServiceName, ServiceNameError, parse_service_list};
pub use slot::{ParseSlotError, Slot};
