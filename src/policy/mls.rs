use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ptr,
    sync::Arc,
};

use super::{
    model::SelinuxPolicy,
    source::{Handle, RawLevel, RawSymbol},
    symbol::PolicySymbol,
};
use crate::error::PolicyError;

/// Create a sensitivity from a raw level handle
pub fn sensitivity_factory<'p>(
    policy: &'p SelinuxPolicy,
    symbol: RawSymbol,
) -> Result<Sensitivity<'p>, PolicyError> {
    match symbol {
        RawSymbol::Level(raw) => Ok(Sensitivity::new(policy, raw)),
        other => Err(PolicyError::WrongSymbolKind {
            expected: "sensitivity",
            found: other.kind(),
        }),
    }
}

/// An MLS sensitivity.
///
/// Sensitivities of one policy are totally ordered by dominance; comparing
/// sensitivities of different policies yields `None`. Equality follows the
/// same key (owning policy and dominance value), so two wrappers over
/// different allocations of one level are equal.
#[derive(Clone)]
pub struct Sensitivity<'p> {
    policy: &'p SelinuxPolicy,
    symbol: Arc<RawLevel>,
}

impl<'p> Sensitivity<'p> {
    pub(crate) fn new(policy: &'p SelinuxPolicy, symbol: Arc<RawLevel>) -> Self {
        Self { policy, symbol }
    }

    pub fn name(&self) -> &str {
        &self.symbol.name
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> + '_ {
        self.symbol.aliases.iter().map(String::as_str)
    }

    /// Position in the dominance order, lowest first
    pub fn value(&self) -> u32 {
        self.symbol.value
    }
}

impl<'p> PolicySymbol<'p> for Sensitivity<'p> {
    fn policy(&self) -> &'p SelinuxPolicy {
        self.policy
    }

    fn handle(&self) -> Handle {
        Handle::of(&self.symbol)
    }

    fn statement(&self) -> Result<String, PolicyError> {
        let aliases: Vec<&str> = self.aliases().collect();
        Ok(match aliases.as_slice() {
            [] => format!("sensitivity {};", self.name()),
            [alias] => format!("sensitivity {} alias {};", self.name(), alias),
            many => format!("sensitivity {} alias {{ {} }};", self.name(), many.join(" ")),
        })
    }
}

impl fmt::Display for Sensitivity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Sensitivity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sensitivity").field(&self.name()).finish()
    }
}

impl PartialEq for Sensitivity<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.policy, other.policy) && self.value() == other.value()
    }
}

impl Eq for Sensitivity<'_> {}

impl Hash for Sensitivity<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().hash(state);
    }
}

/// `a >= b` reads "a dominates b"
impl PartialOrd for Sensitivity<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if !ptr::eq(self.policy, other.policy) {
            return None;
        }
        Some(self.value().cmp(&other.value()))
    }
}
