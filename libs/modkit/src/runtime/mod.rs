mod registry;
mod runner;
pub mod shutdown;

pub use registry::{ModuleEntry, ModuleRegistry, Phase, RegistryError};
pub use runner::{run, RunOptions, ShutdownOptions};

#[cfg(test)]
mod tests;
