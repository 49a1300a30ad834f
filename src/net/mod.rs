pub mod registry;

pub use registry::{ProtocolRegistry, ProtocolTable, SystemProtocolRegistry};
