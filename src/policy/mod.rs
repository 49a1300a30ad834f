pub mod context;
pub mod memory;
pub mod mls;
pub mod model;
pub mod netcontext;
pub mod source;
pub mod symbol;

// Re-export main types for convenience
pub use context::{Context, context_factory};
pub use memory::MemoryPolicy;
pub use mls::{Sensitivity, sensitivity_factory};
pub use model::SelinuxPolicy;
pub use netcontext::{
    NetContext, NetContextStatement, Netifcon, Nodecon, NodeconIPVersion, Portcon,
    PortconProtocol, PortconRange, netifcon_factory, nodecon_factory, portcon_factory,
};
pub use source::{Handle, PolicySource, RawSymbol};
pub use symbol::PolicySymbol;
