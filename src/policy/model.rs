use std::fmt;

use super::{
    memory::MemoryPolicy,
    mls::Sensitivity,
    netcontext::{NetContextStatement, Netifcon, Nodecon, Portcon},
    source::PolicySource,
};
use crate::{error::PolicyError, net::ProtocolTable};

/// A loaded policy and the typed views over its elements
pub struct SelinuxPolicy {
    source: Box<dyn PolicySource>,
    protocols: ProtocolTable,
}

impl SelinuxPolicy {
    /// Wrap a policy source, decoding protocols with the host table
    pub fn new(source: impl PolicySource + 'static) -> Self {
        Self::with_protocols(source, ProtocolTable::host())
    }

    pub fn with_protocols(source: impl PolicySource + 'static, protocols: ProtocolTable) -> Self {
        Self {
            source: Box::new(source),
            protocols,
        }
    }

    pub fn source(&self) -> &dyn PolicySource {
        self.source.as_ref()
    }

    pub fn protocols(&self) -> &ProtocolTable {
        &self.protocols
    }

    pub fn netifcons(&self) -> impl Iterator<Item = Netifcon<'_>> + '_ {
        self.source.netifcons().map(move |raw| Netifcon::new(self, raw))
    }

    pub fn nodecons(&self) -> impl Iterator<Item = Nodecon<'_>> + '_ {
        self.source.nodecons().map(move |raw| Nodecon::new(self, raw))
    }

    /// Portcons; an element with an unrecognized protocol yields an error
    pub fn portcons(&self) -> impl Iterator<Item = Result<Portcon<'_>, PolicyError>> + '_ {
        self.source.portcons().map(move |raw| Portcon::new(self, raw))
    }

    /// All network labeling statements: netifcons, then nodecons, then portcons
    pub fn net_contexts(
        &self,
    ) -> impl Iterator<Item = Result<NetContextStatement<'_>, PolicyError>> + '_ {
        let netifcons = self
            .netifcons()
            .map(|netifcon| Ok::<_, PolicyError>(NetContextStatement::Netifcon(netifcon)));
        let nodecons = self
            .nodecons()
            .map(|nodecon| Ok(NetContextStatement::Nodecon(nodecon)));
        let portcons = self
            .portcons()
            .map(|portcon| portcon.map(NetContextStatement::Portcon));

        netifcons.chain(nodecons).chain(portcons)
    }

    /// Sensitivities in dominance order, lowest first
    pub fn sensitivities(&self) -> impl Iterator<Item = Sensitivity<'_>> + '_ {
        self.source.levels().map(move |raw| Sensitivity::new(self, raw))
    }

    /// Resolve a sensitivity by name or alias
    pub fn lookup_sensitivity(&self, name: &str) -> Result<Sensitivity<'_>, PolicyError> {
        self.source
            .lookup_level(name)
            .map(|raw| Sensitivity::new(self, raw))
            .ok_or_else(|| PolicyError::NotFound {
                kind: "sensitivity",
                name: name.to_string(),
            })
    }
}

impl From<MemoryPolicy> for SelinuxPolicy {
    fn from(source: MemoryPolicy) -> Self {
        Self::new(source)
    }
}

impl fmt::Debug for SelinuxPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelinuxPolicy")
            .field("protocols", &self.protocols)
            .finish_non_exhaustive()
    }
}
