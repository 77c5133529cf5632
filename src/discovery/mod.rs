mod kubectl;
mod store;

pub use kubectl::KubectlStore;
pub use store::ObjectStore;

#[cfg(test)]
pub(crate) use store::memory;
