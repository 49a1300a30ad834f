use std::{
    fs,
    net::IpAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;

use super::{
    netcontext::PortconProtocol,
    source::{PolicySource, RawContext, RawLevel, RawNetifcon, RawNodecon, RawPortcon},
};
use crate::{error::PolicyError, net::ProtocolTable};

/// In-memory policy representation.
///
/// Nodecons are stored by value and re-allocated on every iteration pass, the
/// same way libqpol hands out a fresh nodecon object from its iterator.
#[derive(Debug, Default)]
pub struct MemoryPolicy {
    levels: Vec<Arc<RawLevel>>,
    netifcons: Vec<Arc<RawNetifcon>>,
    nodecons: Vec<RawNodecon>,
    portcons: Vec<Arc<RawPortcon>>,
}

impl MemoryPolicy {
    /// Create an empty policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the next sensitivity; it dominates every sensitivity declared before it
    pub fn add_sensitivity(&mut self, name: &str, aliases: &[&str]) -> Result<(), PolicyError> {
        let taken = std::iter::once(name)
            .chain(aliases.iter().copied())
            .find(|candidate| self.lookup_level(candidate).is_some());
        if let Some(duplicate) = taken {
            return Err(PolicyError::InvalidPolicy {
                reason: format!("sensitivity or alias {} declared twice", duplicate),
            });
        }

        self.levels.push(Arc::new(RawLevel {
            name: name.to_string(),
            aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
            value: self.levels.len() as u32,
        }));
        Ok(())
    }

    /// Label a network interface and the packets crossing it
    pub fn add_netifcon(
        &mut self,
        name: &str,
        context: &str,
        packet: &str,
    ) -> Result<(), PolicyError> {
        self.netifcons.push(Arc::new(RawNetifcon {
            name: name.to_string(),
            if_con: Arc::new(RawContext::parse(context)?),
            msg_con: Arc::new(RawContext::parse(packet)?),
        }));
        Ok(())
    }

    /// Label an address block; the family code is taken from the address
    pub fn add_nodecon(
        &mut self,
        address: IpAddr,
        netmask: IpAddr,
        context: &str,
    ) -> Result<(), PolicyError> {
        let protocol = match address {
            IpAddr::V4(_) => libc::AF_INET,
            IpAddr::V6(_) => libc::AF_INET6,
        };
        self.add_raw_nodecon(RawNodecon {
            protocol,
            addr: address,
            mask: netmask,
            context: Arc::new(RawContext::parse(context)?),
        });
        Ok(())
    }

    /// Add a nodecon exactly as given, without checking its family code
    pub fn add_raw_nodecon(&mut self, nodecon: RawNodecon) {
        self.nodecons.push(nodecon);
    }

    /// Label a port range for a raw protocol number
    pub fn add_portcon(
        &mut self,
        protocol: u8,
        low: u16,
        high: u16,
        context: &str,
    ) -> Result<(), PolicyError> {
        if low > high {
            return Err(PolicyError::InvalidPolicy {
                reason: format!("portcon range {}-{} has low above high", low, high),
            });
        }

        self.portcons.push(Arc::new(RawPortcon {
            protocol,
            low_port: low,
            high_port: high,
            context: Arc::new(RawContext::parse(context)?),
        }));
        Ok(())
    }

    /// Load a policy description file
    pub fn load(path: &Path, protocols: &ProtocolTable) -> Result<Self, PolicyError> {
        let content = fs::read_to_string(path)?;
        let file: PolicyFile =
            toml::from_str(&content).map_err(|source| PolicyError::PolicyParse {
                path: PathBuf::from(path),
                source,
            })?;

        let policy = file.into_policy(protocols)?;
        log::debug!(
            "loaded {}: {} sensitivities, {} netifcons, {} nodecons, {} portcons",
            path.display(),
            policy.levels.len(),
            policy.netifcons.len(),
            policy.nodecons.len(),
            policy.portcons.len()
        );
        Ok(policy)
    }
}

impl PolicySource for MemoryPolicy {
    fn netifcons(&self) -> Box<dyn Iterator<Item = Arc<RawNetifcon>> + '_> {
        Box::new(self.netifcons.iter().cloned())
    }

    fn nodecons(&self) -> Box<dyn Iterator<Item = Arc<RawNodecon>> + '_> {
        Box::new(self.nodecons.iter().map(|raw| Arc::new(raw.clone())))
    }

    fn portcons(&self) -> Box<dyn Iterator<Item = Arc<RawPortcon>> + '_> {
        Box::new(self.portcons.iter().cloned())
    }

    fn levels(&self) -> Box<dyn Iterator<Item = Arc<RawLevel>> + '_> {
        Box::new(self.levels.iter().cloned())
    }

    fn lookup_level(&self, name: &str) -> Option<Arc<RawLevel>> {
        self.levels
            .iter()
            .find(|level| level.name == name || level.aliases.iter().any(|alias| alias == name))
            .cloned()
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    #[serde(default)]
    sensitivity: Vec<SensitivityEntry>,
    #[serde(default)]
    netifcon: Vec<NetifconEntry>,
    #[serde(default)]
    nodecon: Vec<NodeconEntry>,
    #[serde(default)]
    portcon: Vec<PortconEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SensitivityEntry {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NetifconEntry {
    name: String,
    context: String,
    packet: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeconEntry {
    address: IpAddr,
    netmask: IpAddr,
    context: String,
    /// Raw address family code, overriding the one implied by `address`
    family: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PortconEntry {
    protocol: ProtocolSpec,
    ports: PortSpec,
    context: String,
}

/// Protocol given by name (`tcp`) or raw number (`6`)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProtocolSpec {
    Number(u8),
    Name(String),
}

/// Port given as a number (`80`) or a string (`"80"`, `"1024-2048"`)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortSpec {
    Single(u16),
    Text(String),
}

impl ProtocolSpec {
    fn resolve(&self, protocols: &ProtocolTable) -> Result<u8, PolicyError> {
        match self {
            ProtocolSpec::Number(number) => Ok(*number),
            ProtocolSpec::Name(name) => PortconProtocol::from_name(name)
                .map(|protocol| protocol.code(protocols))
                .ok_or_else(|| PolicyError::InvalidPolicy {
                    reason: format!("unknown portcon protocol '{}'", name),
                }),
        }
    }
}

impl PortSpec {
    fn resolve(&self) -> Result<(u16, u16), PolicyError> {
        let text = match self {
            PortSpec::Single(port) => return Ok((*port, *port)),
            PortSpec::Text(text) => text.trim(),
        };

        let parse = |value: &str| {
            value
                .trim()
                .parse::<u16>()
                .map_err(|_| PolicyError::InvalidPolicy {
                    reason: format!("invalid portcon port '{}'", text),
                })
        };

        match text.split_once('-') {
            Some((low, high)) => Ok((parse(low)?, parse(high)?)),
            None => {
                let port = parse(text)?;
                Ok((port, port))
            }
        }
    }
}

impl PolicyFile {
    fn into_policy(self, protocols: &ProtocolTable) -> Result<MemoryPolicy, PolicyError> {
        let mut policy = MemoryPolicy::new();

        for entry in &self.sensitivity {
            let aliases: Vec<&str> = entry.aliases.iter().map(String::as_str).collect();
            policy.add_sensitivity(&entry.name, &aliases)?;
        }

        for entry in &self.netifcon {
            policy.add_netifcon(&entry.name, &entry.context, &entry.packet)?;
        }

        for entry in &self.nodecon {
            match entry.family {
                Some(family) => policy.add_raw_nodecon(RawNodecon {
                    protocol: family,
                    addr: entry.address,
                    mask: entry.netmask,
                    context: Arc::new(RawContext::parse(&entry.context)?),
                }),
                None => policy.add_nodecon(entry.address, entry.netmask, &entry.context)?,
            }
        }

        for entry in &self.portcon {
            let protocol = entry.protocol.resolve(protocols)?;
            let (low, high) = entry.ports.resolve()?;
            policy.add_portcon(protocol, low, high, &entry.context)?;
        }

        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::source::Handle;
    use std::io::Write;

    fn table() -> ProtocolTable {
        ProtocolTable {
            tcp: 6,
            udp: 17,
            dccp: 33,
        }
    }

    #[test]
    fn load_policy_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            r#"
[[sensitivity]]
name = "s0"

[[sensitivity]]
name = "s1"
aliases = ["secret"]

[[netifcon]]
name = "eth0"
context = "system_u:object_r:netif_t:s0"
packet = "system_u:object_r:packet_t:s0"

[[nodecon]]
address = "127.0.0.1"
netmask = "255.255.255.255"
context = "system_u:object_r:node_lo_t:s0"

[[portcon]]
protocol = "tcp"
ports = 80
context = "system_u:object_r:http_port_t:s0"

[[portcon]]
protocol = 17
ports = "1024-2048"
context = "system_u:object_r:unreserved_port_t:s0"
"#
        )
        .unwrap();

        let policy = MemoryPolicy::load(tmp.path(), &table()).unwrap();
        assert_eq!(policy.levels().count(), 2);
        assert_eq!(policy.netifcons().count(), 1);
        assert_eq!(policy.nodecons().count(), 1);

        let ports: Vec<(u8, u16, u16)> = policy
            .portcons()
            .map(|raw| (raw.protocol, raw.low_port, raw.high_port))
            .collect();
        assert_eq!(ports, vec![(6, 80, 80), (17, 1024, 2048)]);

        let secret = policy.lookup_level("secret").unwrap();
        assert_eq!(secret.name, "s1");
        assert_eq!(secret.value, 1);
    }

    #[test]
    fn load_rejects_unknown_protocol_name() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            "[[portcon]]\nprotocol = \"sctp\"\nports = 80\ncontext = \"u:r:t\"\n"
        )
        .unwrap();

        let result = MemoryPolicy::load(tmp.path(), &table());
        assert!(matches!(result, Err(PolicyError::InvalidPolicy { .. })));
    }

    #[test]
    fn load_reports_syntax_errors_with_path() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[[sensitivity]\nname = ").unwrap();

        match MemoryPolicy::load(tmp.path(), &table()) {
            Err(PolicyError::PolicyParse { path, .. }) => assert_eq!(path, tmp.path()),
            other => panic!("expected PolicyParse, got {:?}", other),
        }
    }

    #[test]
    fn nodecons_are_reallocated_per_pass() {
        let mut policy = MemoryPolicy::new();
        policy
            .add_nodecon(
                "10.0.0.0".parse().unwrap(),
                "255.0.0.0".parse().unwrap(),
                "system_u:object_r:node_t",
            )
            .unwrap();

        let first = policy.nodecons().next().unwrap();
        let second = policy.nodecons().next().unwrap();
        assert_ne!(Handle::of(&first), Handle::of(&second));
        assert_eq!(first.addr, second.addr);
    }

    #[test]
    fn levels_keep_their_allocation() {
        let mut policy = MemoryPolicy::new();
        policy.add_sensitivity("s0", &[]).unwrap();

        let iterated = policy.levels().next().unwrap();
        let looked_up = policy.lookup_level("s0").unwrap();
        assert_eq!(Handle::of(&iterated), Handle::of(&looked_up));
    }

    #[test]
    fn duplicate_sensitivity_rejected() {
        let mut policy = MemoryPolicy::new();
        policy.add_sensitivity("s0", &["unclassified"]).unwrap();
        assert!(policy.add_sensitivity("s1", &["unclassified"]).is_err());
        assert!(policy.add_sensitivity("s0", &[]).is_err());
    }

    #[test]
    fn inverted_port_range_rejected() {
        let mut policy = MemoryPolicy::new();
        let result = policy.add_portcon(6, 2048, 1024, "system_u:object_r:port_t");
        assert!(matches!(result, Err(PolicyError::InvalidPolicy { .. })));
    }
}
