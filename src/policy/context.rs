use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use super::{
    model::SelinuxPolicy,
    source::{Handle, RawContext, RawSymbol},
    symbol::PolicySymbol,
};
use crate::error::PolicyError;

/// Create a context from a raw context handle
pub fn context_factory<'p>(
    policy: &'p SelinuxPolicy,
    symbol: RawSymbol,
) -> Result<Context<'p>, PolicyError> {
    match symbol {
        RawSymbol::Context(raw) => Ok(Context::new(policy, raw)),
        other => Err(PolicyError::WrongSymbolKind {
            expected: "context",
            found: other.kind(),
        }),
    }
}

/// A security context. Compares by value.
#[derive(Clone)]
pub struct Context<'p> {
    policy: &'p SelinuxPolicy,
    symbol: Arc<RawContext>,
}

impl<'p> Context<'p> {
    pub(crate) fn new(policy: &'p SelinuxPolicy, symbol: Arc<RawContext>) -> Self {
        Self { policy, symbol }
    }

    pub fn user(&self) -> &str {
        &self.symbol.user
    }

    pub fn role(&self) -> &str {
        &self.symbol.role
    }

    pub fn type_(&self) -> &str {
        &self.symbol.type_
    }

    /// MLS range, absent in non-MLS policies
    pub fn range(&self) -> Option<&str> {
        self.symbol.range.as_deref()
    }
}

impl<'p> PolicySymbol<'p> for Context<'p> {
    fn policy(&self) -> &'p SelinuxPolicy {
        self.policy
    }

    fn handle(&self) -> Handle {
        Handle::of(&self.symbol)
    }
}

impl fmt::Display for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.user(), self.role(), self.type_())?;
        if let Some(range) = self.range() {
            write!(f, ":{}", range)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Context").field(&self.to_string()).finish()
    }
}

impl PartialEq for Context<'_> {
    fn eq(&self, other: &Self) -> bool {
        *self.symbol == *other.symbol
    }
}

impl Eq for Context<'_> {}

impl Hash for Context<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}
