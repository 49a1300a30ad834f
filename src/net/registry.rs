use std::{
    ffi::CString,
    sync::{Mutex, OnceLock},
};

#[cfg(test)]
use mockall::automock;

/// IANA protocol number for TCP
pub const IPPROTO_TCP: u8 = libc::IPPROTO_TCP as u8;
/// IANA protocol number for UDP
pub const IPPROTO_UDP: u8 = libc::IPPROTO_UDP as u8;
/// DCCP protocol number used when the host protocol database has no entry.
///
/// libc does not export a DCCP constant on every platform, so the number is
/// looked up by name at runtime. Hosts without an `/etc/protocols` entry
/// still decode DCCP portcons through this value.
pub const DCCP_FALLBACK: u8 = 33;

/// Host protocol database abstraction for testing
#[cfg_attr(test, automock)]
pub trait ProtocolRegistry: Send + Sync {
    /// Look up the protocol number registered for `name`
    fn protocol_number(&self, name: &str) -> Option<u8>;
}

/// Serializes `getprotobyname(3)`, whose result lives in a buffer shared by
/// every caller. libc does not bind the reentrant `getprotobyname_r`.
static PROTODB_LOCK: Mutex<()> = Mutex::new(());

/// Protocol registry backed by the system protocol database (`getprotobyname(3)`)
pub struct SystemProtocolRegistry;

impl ProtocolRegistry for SystemProtocolRegistry {
    fn protocol_number(&self, name: &str) -> Option<u8> {
        let name = CString::new(name).ok()?;

        let proto = {
            let _guard = PROTODB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // The entry is only valid until the next call, so copy the number
            // out while the lock is held.
            let entry = unsafe { libc::getprotobyname(name.as_ptr()) };
            if entry.is_null() {
                return None;
            }
            unsafe { (*entry).p_proto }
        };

        u8::try_from(proto).ok()
    }
}

/// Raw protocol numbers for the transport protocols a portcon can name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolTable {
    pub tcp: u8,
    pub udp: u8,
    pub dccp: u8,
}

impl ProtocolTable {
    /// Build a table, resolving DCCP through `registry`
    pub fn from_registry(registry: &dyn ProtocolRegistry) -> Self {
        let dccp = match registry.protocol_number("dccp") {
            Some(number) => number,
            None => {
                log::warn!(
                    "dccp not found in protocol database, using protocol number {}",
                    DCCP_FALLBACK
                );
                DCCP_FALLBACK
            }
        };

        Self {
            tcp: IPPROTO_TCP,
            udp: IPPROTO_UDP,
            dccp,
        }
    }

    /// Table for the running host, resolved once per process
    pub fn host() -> Self {
        static HOST: OnceLock<ProtocolTable> = OnceLock::new();
        *HOST.get_or_init(|| Self::from_registry(&SystemProtocolRegistry))
    }
}
