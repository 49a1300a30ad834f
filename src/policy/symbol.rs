use super::{model::SelinuxPolicy, source::Handle};
use crate::error::PolicyError;

/// An object backed by a raw policy element.
///
/// Identity defaults to the backing [`Handle`]; types whose backend hands out
/// a new allocation per iteration compare structurally instead.
pub trait PolicySymbol<'p> {
    /// The policy that owns the backing element
    fn policy(&self) -> &'p SelinuxPolicy;

    fn handle(&self) -> Handle;

    /// Render the symbol as a policy statement
    fn statement(&self) -> Result<String, PolicyError> {
        Err(PolicyError::Unimplemented {
            capability: "statement",
        })
    }
}
