use std::{
    fmt,
    hash::{Hash, Hasher},
    net::IpAddr,
    sync::Arc,
};

use super::{
    context::Context,
    model::SelinuxPolicy,
    source::{Handle, RawNetifcon, RawNodecon, RawPortcon, RawSymbol},
    symbol::PolicySymbol,
};
use crate::{error::PolicyError, net::ProtocolTable};

/// Create a netifcon from a raw netifcon handle
pub fn netifcon_factory<'p>(
    policy: &'p SelinuxPolicy,
    symbol: RawSymbol,
) -> Result<Netifcon<'p>, PolicyError> {
    match symbol {
        RawSymbol::Netifcon(raw) => Ok(Netifcon::new(policy, raw)),
        other => Err(PolicyError::WrongSymbolKind {
            expected: "netifcon",
            found: other.kind(),
        }),
    }
}

/// Create a nodecon from a raw nodecon handle
pub fn nodecon_factory<'p>(
    policy: &'p SelinuxPolicy,
    symbol: RawSymbol,
) -> Result<Nodecon<'p>, PolicyError> {
    match symbol {
        RawSymbol::Nodecon(raw) => Ok(Nodecon::new(policy, raw)),
        other => Err(PolicyError::WrongSymbolKind {
            expected: "nodecon",
            found: other.kind(),
        }),
    }
}

/// Create a portcon from a raw portcon handle, decoding its protocol
pub fn portcon_factory<'p>(
    policy: &'p SelinuxPolicy,
    symbol: RawSymbol,
) -> Result<Portcon<'p>, PolicyError> {
    match symbol {
        RawSymbol::Portcon(raw) => Portcon::new(policy, raw),
        other => Err(PolicyError::WrongSymbolKind {
            expected: "portcon",
            found: other.kind(),
        }),
    }
}

/// In-policy network labeling statement
pub trait NetContext<'p>: PolicySymbol<'p> + fmt::Display {
    /// The context for this statement
    fn context(&self) -> Context<'p>;
}

/// A `netifcon` statement.
///
/// Interface names are unique within a policy, so identity is the name alone.
#[derive(Clone)]
pub struct Netifcon<'p> {
    policy: &'p SelinuxPolicy,
    symbol: Arc<RawNetifcon>,
}

impl<'p> Netifcon<'p> {
    pub(crate) fn new(policy: &'p SelinuxPolicy, symbol: Arc<RawNetifcon>) -> Self {
        Self { policy, symbol }
    }

    /// The network interface name
    pub fn netif(&self) -> &str {
        &self.symbol.name
    }

    /// The context for packets crossing the interface
    pub fn packet(&self) -> Context<'p> {
        Context::new(self.policy, Arc::clone(&self.symbol.msg_con))
    }
}

impl<'p> PolicySymbol<'p> for Netifcon<'p> {
    fn policy(&self) -> &'p SelinuxPolicy {
        self.policy
    }

    fn handle(&self) -> Handle {
        Handle::of(&self.symbol)
    }

    fn statement(&self) -> Result<String, PolicyError> {
        Ok(self.to_string())
    }
}

impl<'p> NetContext<'p> for Netifcon<'p> {
    /// The context for the interface itself
    fn context(&self) -> Context<'p> {
        Context::new(self.policy, Arc::clone(&self.symbol.if_con))
    }
}

impl fmt::Display for Netifcon<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "netifcon {} {} {}",
            self.netif(),
            self.context(),
            self.packet()
        )
    }
}

impl PartialEq for Netifcon<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.netif() == other.netif()
    }
}

impl Eq for Netifcon<'_> {}

impl Hash for Netifcon<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.netif().hash(state);
    }
}

/// Nodecon IP version, valued as the address family constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum NodeconIPVersion {
    Ipv4 = libc::AF_INET,
    Ipv6 = libc::AF_INET6,
}

impl TryFrom<i32> for NodeconIPVersion {
    type Error = PolicyError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            libc::AF_INET => Ok(NodeconIPVersion::Ipv4),
            libc::AF_INET6 => Ok(NodeconIPVersion::Ipv6),
            _ => Err(PolicyError::UnrecognizedValue {
                kind: "nodecon IP version",
                value: raw.into(),
            }),
        }
    }
}

impl fmt::Display for NodeconIPVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeconIPVersion::Ipv4 => f.write_str("ipv4"),
            NodeconIPVersion::Ipv6 => f.write_str("ipv6"),
        }
    }
}

/// A `nodecon` statement.
///
/// The backing library allocates a new nodecon for every iteration pass, so
/// equality is structural over address, netmask and context.
#[derive(Clone)]
pub struct Nodecon<'p> {
    policy: &'p SelinuxPolicy,
    symbol: Arc<RawNodecon>,
}

impl<'p> Nodecon<'p> {
    pub(crate) fn new(policy: &'p SelinuxPolicy, symbol: Arc<RawNodecon>) -> Self {
        Self { policy, symbol }
    }

    /// The IP version, decoded from the raw address family
    pub fn ip_version(&self) -> Result<NodeconIPVersion, PolicyError> {
        NodeconIPVersion::try_from(self.symbol.protocol)
    }

    pub fn address(&self) -> IpAddr {
        self.symbol.addr
    }

    pub fn netmask(&self) -> IpAddr {
        self.symbol.mask
    }
}

impl<'p> PolicySymbol<'p> for Nodecon<'p> {
    fn policy(&self) -> &'p SelinuxPolicy {
        self.policy
    }

    fn handle(&self) -> Handle {
        Handle::of(&self.symbol)
    }

    fn statement(&self) -> Result<String, PolicyError> {
        Ok(self.to_string())
    }
}

impl<'p> NetContext<'p> for Nodecon<'p> {
    fn context(&self) -> Context<'p> {
        Context::new(self.policy, Arc::clone(&self.symbol.context))
    }
}

impl fmt::Display for Nodecon<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nodecon {} {} {}",
            self.address(),
            self.netmask(),
            self.context()
        )
    }
}

impl PartialEq for Nodecon<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
            && self.netmask() == other.netmask()
            && self.context() == other.context()
    }
}

impl Eq for Nodecon<'_> {}

/// Falls back to the rendered statement when `other` is not a nodecon.
impl<'p> PartialEq<NetContextStatement<'p>> for Nodecon<'p> {
    fn eq(&self, other: &NetContextStatement<'p>) -> bool {
        match other {
            NetContextStatement::Nodecon(nodecon) => self == nodecon,
            other => self.to_string() == other.to_string(),
        }
    }
}

impl PartialEq<str> for Nodecon<'_> {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl Hash for Nodecon<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
        self.netmask().hash(state);
    }
}

/// Transport protocol of a portcon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PortconProtocol {
    Tcp,
    Udp,
    Dccp,
}

impl PortconProtocol {
    /// Decode a raw protocol number
    pub fn from_raw(raw: u8, protocols: &ProtocolTable) -> Result<Self, PolicyError> {
        if raw == protocols.tcp {
            Ok(PortconProtocol::Tcp)
        } else if raw == protocols.udp {
            Ok(PortconProtocol::Udp)
        } else if raw == protocols.dccp {
            Ok(PortconProtocol::Dccp)
        } else {
            Err(PolicyError::UnrecognizedValue {
                kind: "portcon protocol",
                value: raw.into(),
            })
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tcp" => Some(PortconProtocol::Tcp),
            "udp" => Some(PortconProtocol::Udp),
            "dccp" => Some(PortconProtocol::Dccp),
            _ => None,
        }
    }

    /// The raw protocol number
    pub fn code(self, protocols: &ProtocolTable) -> u8 {
        match self {
            PortconProtocol::Tcp => protocols.tcp,
            PortconProtocol::Udp => protocols.udp,
            PortconProtocol::Dccp => protocols.dccp,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PortconProtocol::Tcp => "tcp",
            PortconProtocol::Udp => "udp",
            PortconProtocol::Dccp => "dccp",
        }
    }
}

impl fmt::Display for PortconProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive port range of a portcon; `low <= high`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortconRange {
    pub low: u16,
    pub high: u16,
}

impl fmt::Display for PortconRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{}-{}", self.low, self.high)
        }
    }
}

/// A `portcon` statement
#[derive(Clone)]
pub struct Portcon<'p> {
    policy: &'p SelinuxPolicy,
    symbol: Arc<RawPortcon>,
    protocol: PortconProtocol,
}

impl<'p> Portcon<'p> {
    pub(crate) fn new(
        policy: &'p SelinuxPolicy,
        symbol: Arc<RawPortcon>,
    ) -> Result<Self, PolicyError> {
        let protocol = PortconProtocol::from_raw(symbol.protocol, policy.protocols())?;
        Ok(Self {
            policy,
            symbol,
            protocol,
        })
    }

    pub fn protocol(&self) -> PortconProtocol {
        self.protocol
    }

    pub fn ports(&self) -> PortconRange {
        PortconRange {
            low: self.symbol.low_port,
            high: self.symbol.high_port,
        }
    }
}

impl<'p> PolicySymbol<'p> for Portcon<'p> {
    fn policy(&self) -> &'p SelinuxPolicy {
        self.policy
    }

    fn handle(&self) -> Handle {
        Handle::of(&self.symbol)
    }

    fn statement(&self) -> Result<String, PolicyError> {
        Ok(self.to_string())
    }
}

impl<'p> NetContext<'p> for Portcon<'p> {
    fn context(&self) -> Context<'p> {
        Context::new(self.policy, Arc::clone(&self.symbol.context))
    }
}

impl fmt::Display for Portcon<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "portcon {} {} {}",
            self.protocol,
            self.ports(),
            self.context()
        )
    }
}

impl PartialEq for Portcon<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.protocol == other.protocol && self.ports() == other.ports()
    }
}

impl Eq for Portcon<'_> {}

impl Hash for Portcon<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.protocol.hash(state);
        self.ports().hash(state);
    }
}

/// Any network labeling statement
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum NetContextStatement<'p> {
    Netifcon(Netifcon<'p>),
    Nodecon(Nodecon<'p>),
    Portcon(Portcon<'p>),
}

impl<'p> PolicySymbol<'p> for NetContextStatement<'p> {
    fn policy(&self) -> &'p SelinuxPolicy {
        match self {
            NetContextStatement::Netifcon(inner) => inner.policy(),
            NetContextStatement::Nodecon(inner) => inner.policy(),
            NetContextStatement::Portcon(inner) => inner.policy(),
        }
    }

    fn handle(&self) -> Handle {
        match self {
            NetContextStatement::Netifcon(inner) => inner.handle(),
            NetContextStatement::Nodecon(inner) => inner.handle(),
            NetContextStatement::Portcon(inner) => inner.handle(),
        }
    }

    fn statement(&self) -> Result<String, PolicyError> {
        Ok(self.to_string())
    }
}

impl<'p> NetContext<'p> for NetContextStatement<'p> {
    fn context(&self) -> Context<'p> {
        match self {
            NetContextStatement::Netifcon(inner) => inner.context(),
            NetContextStatement::Nodecon(inner) => inner.context(),
            NetContextStatement::Portcon(inner) => inner.context(),
        }
    }
}

impl fmt::Display for NetContextStatement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetContextStatement::Netifcon(inner) => fmt::Display::fmt(inner, f),
            NetContextStatement::Nodecon(inner) => fmt::Display::fmt(inner, f),
            NetContextStatement::Portcon(inner) => fmt::Display::fmt(inner, f),
        }
    }
}

macro_rules! debug_as_statement {
    ($($ty:ident),*) => {
        $(
            impl fmt::Debug for $ty<'_> {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_tuple(stringify!($ty)).field(&self.to_string()).finish()
                }
            }
        )*
    };
}

debug_as_statement!(Netifcon, Nodecon, Portcon, NetContextStatement);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{
        MemoryPolicy,
        source::{PolicySource, RawContext},
    };
    use rstest::rstest;
    use std::collections::HashSet;

    const TABLE: ProtocolTable = ProtocolTable {
        tcp: 6,
        udp: 17,
        dccp: 33,
    };

    fn policy() -> SelinuxPolicy {
        let mut source = MemoryPolicy::new();
        source
            .add_netifcon(
                "eth0",
                "system_u:object_r:netif_t:s0",
                "system_u:object_r:packet_t:s0",
            )
            .unwrap();
        source
            .add_nodecon(
                "127.0.0.1".parse().unwrap(),
                "255.255.255.255".parse().unwrap(),
                "system_u:object_r:node_lo_t:s0",
            )
            .unwrap();
        source
            .add_nodecon(
                "::1".parse().unwrap(),
                "ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff".parse().unwrap(),
                "system_u:object_r:node_lo_t:s0",
            )
            .unwrap();
        source
            .add_portcon(6, 80, 80, "system_u:object_r:http_port_t:s0")
            .unwrap();
        source
            .add_portcon(17, 1024, 2048, "system_u:object_r:unreserved_port_t:s0")
            .unwrap();
        source
            .add_portcon(33, 5000, 5001, "system_u:object_r:dccp_port_t:s0")
            .unwrap();
        SelinuxPolicy::with_protocols(source, TABLE)
    }

    #[test]
    fn netifcon_renders_both_contexts() {
        let policy = policy();
        let netifcon = policy.netifcons().next().unwrap();

        assert_eq!(netifcon.netif(), "eth0");
        assert_eq!(netifcon.context().type_(), "netif_t");
        assert_eq!(netifcon.packet().type_(), "packet_t");
        assert_eq!(
            netifcon.statement().unwrap(),
            "netifcon eth0 system_u:object_r:netif_t:s0 system_u:object_r:packet_t:s0"
        );
    }

    #[test]
    fn netifcon_identity_is_the_interface_name() {
        let policy = policy();
        let mut other = MemoryPolicy::new();
        other
            .add_netifcon("eth0", "u:r:other_t", "u:r:other_t")
            .unwrap();
        let other = SelinuxPolicy::with_protocols(other, TABLE);

        let ours = policy.netifcons().next().unwrap();
        let theirs = other.netifcons().next().unwrap();
        assert_eq!(ours, theirs);
    }

    #[test]
    fn nodecon_equal_across_iterations() {
        let policy = policy();
        let first: Vec<Nodecon<'_>> = policy.nodecons().collect();
        let second: Vec<Nodecon<'_>> = policy.nodecons().collect();

        assert_ne!(first[0].handle(), second[0].handle());
        assert_eq!(first, second);

        let unique: HashSet<Nodecon<'_>> = first.into_iter().chain(second).collect();
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn nodecon_differs_by_context() {
        let mut source = MemoryPolicy::new();
        let address = "10.0.0.0".parse().unwrap();
        let netmask = "255.0.0.0".parse().unwrap();
        source
            .add_nodecon(address, netmask, "system_u:object_r:node_t")
            .unwrap();
        source
            .add_nodecon(address, netmask, "system_u:object_r:internal_node_t")
            .unwrap();
        let policy = SelinuxPolicy::with_protocols(source, TABLE);

        let nodecons: Vec<Nodecon<'_>> = policy.nodecons().collect();
        assert_ne!(nodecons[0], nodecons[1]);
    }

    #[test]
    fn nodecon_compares_rendered_text_against_other_statements() {
        let policy = policy();
        let nodecon = policy.nodecons().next().unwrap();
        let netifcon = NetContextStatement::Netifcon(policy.netifcons().next().unwrap());
        let same = NetContextStatement::Nodecon(policy.nodecons().next().unwrap());

        assert!(nodecon == same);
        assert!(nodecon != netifcon);
        assert!(
            nodecon == *"nodecon 127.0.0.1 255.255.255.255 system_u:object_r:node_lo_t:s0"
        );
    }

    #[test]
    fn nodecon_ip_version() {
        let policy = policy();
        let versions: Vec<NodeconIPVersion> = policy
            .nodecons()
            .map(|nodecon| nodecon.ip_version().unwrap())
            .collect();
        assert_eq!(versions, vec![NodeconIPVersion::Ipv4, NodeconIPVersion::Ipv6]);
        assert_eq!(NodeconIPVersion::Ipv4 as i32, libc::AF_INET);
        assert_eq!(NodeconIPVersion::Ipv6 as i32, libc::AF_INET6);
    }

    #[test]
    fn nodecon_unknown_family_fails_on_decode() {
        let mut source = MemoryPolicy::new();
        source.add_raw_nodecon(RawNodecon {
            protocol: 99,
            addr: "10.0.0.0".parse().unwrap(),
            mask: "255.0.0.0".parse().unwrap(),
            context: Arc::new(RawContext::parse("system_u:object_r:node_t").unwrap()),
        });
        let policy = SelinuxPolicy::with_protocols(source, TABLE);

        let nodecon = policy.nodecons().next().unwrap();
        assert!(matches!(
            nodecon.ip_version(),
            Err(PolicyError::UnrecognizedValue { value: 99, .. })
        ));
        assert_eq!(
            nodecon.to_string(),
            "nodecon 10.0.0.0 255.0.0.0 system_u:object_r:node_t"
        );
    }

    #[rstest]
    #[case(0, "portcon tcp 80 system_u:object_r:http_port_t:s0")]
    #[case(1, "portcon udp 1024-2048 system_u:object_r:unreserved_port_t:s0")]
    #[case(2, "portcon dccp 5000-5001 system_u:object_r:dccp_port_t:s0")]
    fn portcon_rendering(#[case] index: usize, #[case] expected: &str) {
        let policy = policy();
        let portcon = policy.portcons().nth(index).unwrap().unwrap();
        assert_eq!(portcon.statement().unwrap(), expected);
    }

    #[test]
    fn portcon_ports_and_protocol() {
        let policy = policy();
        let portcon = policy.portcons().nth(1).unwrap().unwrap();
        assert_eq!(portcon.protocol(), PortconProtocol::Udp);
        assert_eq!(
            portcon.ports(),
            PortconRange {
                low: 1024,
                high: 2048
            }
        );
    }

    #[test]
    fn portcon_identity_ignores_context() {
        let mut source = MemoryPolicy::new();
        source.add_portcon(6, 22, 22, "u:r:ssh_port_t").unwrap();
        source.add_portcon(6, 22, 22, "u:r:other_port_t").unwrap();
        source.add_portcon(17, 22, 22, "u:r:ssh_port_t").unwrap();
        let policy = SelinuxPolicy::with_protocols(source, TABLE);

        let portcons: Vec<Portcon<'_>> = policy.portcons().map(Result::unwrap).collect();
        assert_eq!(portcons[0], portcons[1]);
        assert_ne!(portcons[0], portcons[2]);
    }

    #[rstest]
    #[case(6, PortconProtocol::Tcp)]
    #[case(17, PortconProtocol::Udp)]
    #[case(33, PortconProtocol::Dccp)]
    fn protocol_decodes(#[case] raw: u8, #[case] expected: PortconProtocol) {
        assert_eq!(PortconProtocol::from_raw(raw, &TABLE).unwrap(), expected);
        assert_eq!(expected.code(&TABLE), raw);
    }

    #[test]
    fn protocol_follows_registry_dccp_number() {
        let table = ProtocolTable { dccp: 99, ..TABLE };
        assert_eq!(
            PortconProtocol::from_raw(99, &table).unwrap(),
            PortconProtocol::Dccp
        );
        assert!(PortconProtocol::from_raw(33, &table).is_err());
    }

    #[test]
    fn portcon_unknown_protocol_fails_at_construction() {
        let mut source = MemoryPolicy::new();
        source.add_portcon(132, 9, 9, "u:r:sctp_port_t").unwrap();
        let policy = SelinuxPolicy::with_protocols(source, TABLE);

        assert!(matches!(
            policy.portcons().next().unwrap(),
            Err(PolicyError::UnrecognizedValue { value: 132, .. })
        ));
    }

    #[test]
    fn factories_reject_wrong_kind() {
        let policy = policy();
        let raw = policy.source().netifcons().next().unwrap();

        assert!(netifcon_factory(&policy, RawSymbol::Netifcon(Arc::clone(&raw))).is_ok());
        assert!(matches!(
            nodecon_factory(&policy, RawSymbol::Netifcon(Arc::clone(&raw))),
            Err(PolicyError::WrongSymbolKind {
                expected: "nodecon",
                found: "netifcon"
            })
        ));
        assert!(matches!(
            portcon_factory(&policy, RawSymbol::Netifcon(raw)),
            Err(PolicyError::WrongSymbolKind { .. })
        ));
    }

    #[test]
    fn statements_in_declaration_order() {
        let policy = policy();
        let kinds: Vec<&str> = policy
            .net_contexts()
            .map(|statement| match statement.unwrap() {
                NetContextStatement::Netifcon(_) => "netifcon",
                NetContextStatement::Nodecon(_) => "nodecon",
                NetContextStatement::Portcon(_) => "portcon",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["netifcon", "nodecon", "nodecon", "portcon", "portcon", "portcon"]
        );
    }
}
