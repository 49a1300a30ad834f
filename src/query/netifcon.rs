use serde::{Deserialize, Serialize};

use super::compquery::{ComponentQuery, NameOptions, StringCriterion, match_regex};
use crate::{
    error::PolicyError,
    policy::{Netifcon, SelinuxPolicy},
};

/// Netifcon query criteria, as read from a criteria file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetifconCriteria {
    /// Interface name to match
    pub name: String,
    pub name_regex: bool,
}

/// Query netifcon statements by interface name
#[derive(Debug, Clone)]
pub struct NetifconQuery<'p> {
    policy: &'p SelinuxPolicy,
    name: StringCriterion,
}

impl<'p> NetifconQuery<'p> {
    pub fn new(policy: &'p SelinuxPolicy) -> Self {
        Self {
            policy,
            name: StringCriterion::default(),
        }
    }

    pub fn with_criteria(
        policy: &'p SelinuxPolicy,
        criteria: &NetifconCriteria,
    ) -> Result<Self, PolicyError> {
        let mut query = Self::new(policy);
        query.apply(criteria)?;
        Ok(query)
    }

    /// Replace every criterion. On error the query is left unchanged.
    pub fn apply(&mut self, criteria: &NetifconCriteria) -> Result<(), PolicyError> {
        self.set_name(
            &criteria.name,
            NameOptions {
                regex: criteria.name_regex,
            },
        )
    }
}

impl<'p> ComponentQuery<'p> for NetifconQuery<'p> {
    type Item = Netifcon<'p>;

    fn policy(&self) -> &'p SelinuxPolicy {
        self.policy
    }

    fn name(&self) -> &StringCriterion {
        &self.name
    }

    fn set_name(&mut self, name: &str, opts: NameOptions) -> Result<(), PolicyError> {
        self.name = StringCriterion::new(name, opts)?;
        log::debug!("netifcon name criterion: {:?}", self.name);
        Ok(())
    }

    fn results(&self) -> impl Iterator<Item = Netifcon<'p>> + '_ {
        self.policy.netifcons().filter(move |netifcon| {
            self.name
                .matcher()
                .is_none_or(|matcher| match_regex(netifcon.netif(), matcher))
        })
    }
}
