pub mod audio;
pub mod config;
pub mod error;
pub mod logging;
pub mod system;

pub use audio::{AudioContext, ContextManager, ManagerOptions, OpenAlManager};
pub use config::{Config, ContextConfig};
pub use error::{AlcErrorCode, ContextError, ErrorKind};
