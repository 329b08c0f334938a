mod io_utils;
pub mod provider;

// Re-exports for convenience
pub use provider::{LocalTreeProvider, ProviderError};
