pub mod defaults;
pub mod loader;
pub mod validator;

pub use loader::{build_catalog, LoadError};
pub use validator::ValidationError;
