pub mod attributes;
pub mod context;
pub mod device;
pub mod manager;

pub use attributes::AttributeList;
pub use context::AudioContext;
pub use device::{DeviceSource, OpenedDevice};
pub use manager::{ContextManager, ManagerOptions, OpenAlManager};
