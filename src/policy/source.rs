use std::{fmt, net::IpAddr, sync::Arc};

use crate::error::PolicyError;

/// Identity of a raw policy element: the address of its backing allocation.
///
/// Two handles are equal only while they refer to the same allocation, so a
/// backend that re-allocates an element produces a different handle for the
/// same logical element. A handle is only meaningful while a wrapper keeps
/// its allocation alive; once dropped, the address may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    pub fn of<T>(symbol: &Arc<T>) -> Self {
        Self(Arc::as_ptr(symbol) as *const () as usize)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Raw security context (`user:role:type[:range]`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawContext {
    pub user: String,
    pub role: String,
    pub type_: String,
    pub range: Option<String>,
}

impl RawContext {
    /// Parse a colon-separated context. Everything after the type is the MLS range.
    pub fn parse(input: &str) -> Result<Self, PolicyError> {
        let mut parts = input.trim().splitn(4, ':');
        let mut next = |field: &str| match parts.next() {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(PolicyError::InvalidPolicy {
                reason: format!("context '{}' is missing its {}", input, field),
            }),
        };

        let user = next("user")?;
        let role = next("role")?;
        let type_ = next("type")?;
        let range = next("range").ok();

        Ok(Self {
            user,
            role,
            type_,
            range,
        })
    }
}

/// Raw netifcon: interface name plus interface and packet contexts
#[derive(Debug, Clone)]
pub struct RawNetifcon {
    pub name: String,
    pub if_con: Arc<RawContext>,
    pub msg_con: Arc<RawContext>,
}

/// Raw nodecon. `protocol` is the address family code (`AF_INET`/`AF_INET6`).
#[derive(Debug, Clone)]
pub struct RawNodecon {
    pub protocol: i32,
    pub addr: IpAddr,
    pub mask: IpAddr,
    pub context: Arc<RawContext>,
}

/// Raw portcon. `protocol` is the IP protocol number.
#[derive(Debug, Clone)]
pub struct RawPortcon {
    pub protocol: u8,
    pub low_port: u16,
    pub high_port: u16,
    pub context: Arc<RawContext>,
}

/// Raw MLS sensitivity. `value` is its position in the dominance order.
#[derive(Debug, Clone)]
pub struct RawLevel {
    pub name: String,
    pub aliases: Vec<String>,
    pub value: u32,
}

/// A raw element handle of any kind, as handed to the factory functions
#[derive(Debug, Clone)]
pub enum RawSymbol {
    Context(Arc<RawContext>),
    Netifcon(Arc<RawNetifcon>),
    Nodecon(Arc<RawNodecon>),
    Portcon(Arc<RawPortcon>),
    Level(Arc<RawLevel>),
}

impl RawSymbol {
    pub fn kind(&self) -> &'static str {
        match self {
            RawSymbol::Context(_) => "context",
            RawSymbol::Netifcon(_) => "netifcon",
            RawSymbol::Nodecon(_) => "nodecon",
            RawSymbol::Portcon(_) => "portcon",
            RawSymbol::Level(_) => "sensitivity",
        }
    }

    pub fn handle(&self) -> Handle {
        match self {
            RawSymbol::Context(raw) => Handle::of(raw),
            RawSymbol::Netifcon(raw) => Handle::of(raw),
            RawSymbol::Nodecon(raw) => Handle::of(raw),
            RawSymbol::Portcon(raw) => Handle::of(raw),
            RawSymbol::Level(raw) => Handle::of(raw),
        }
    }
}

/// Loaded policy representation the typed model is built on.
///
/// Implementations own every raw element; iterators may hand out a new
/// allocation for the same element on each pass.
pub trait PolicySource {
    fn netifcons(&self) -> Box<dyn Iterator<Item = Arc<RawNetifcon>> + '_>;

    fn nodecons(&self) -> Box<dyn Iterator<Item = Arc<RawNodecon>> + '_>;

    fn portcons(&self) -> Box<dyn Iterator<Item = Arc<RawPortcon>> + '_>;

    /// Sensitivities in dominance order, lowest first
    fn levels(&self) -> Box<dyn Iterator<Item = Arc<RawLevel>> + '_>;

    /// Find a sensitivity by its name or one of its aliases
    fn lookup_level(&self, name: &str) -> Option<Arc<RawLevel>>;
}
