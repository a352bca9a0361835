pub mod types;

pub use types::{AuxiliarySends, Config, ContextConfig, DRIVER_DEFAULT_SOURCES, LoggingSection};
