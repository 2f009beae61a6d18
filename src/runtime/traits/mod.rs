// ABOUTME: Composable capability traits for the container engine.
// ABOUTME: Defines ContainerOps, VolumeOps, NetworkOps, ImageOps, PruneOps, RuntimeInfo.

mod container;
mod image;
mod network;
mod prune;
mod runtime_info;
pub(crate) mod sealed;
mod shared_types;
mod volume;

pub use container::{ContainerError, ContainerFilters, ContainerOps};
pub use image::{ImageError, ImageFilters, ImageOps};
pub use network::{NetworkError, NetworkOps};
pub use prune::{PruneError, PruneOps};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError, RuntimeMetadata};
pub use shared_types::*;
pub use volume::{VolumeError, VolumeOps};

/// Every capability the orchestrators need from one engine client.
pub trait FullRuntime:
    ContainerOps + VolumeOps + NetworkOps + ImageOps + PruneOps + RuntimeInfo
{
}

impl<T> FullRuntime for T where
    T: ContainerOps + VolumeOps + NetworkOps + ImageOps + PruneOps + RuntimeInfo
{
}
