mod loader;
mod types;

pub use types::{AmbientConfig, KubeConfig};
