use serde::{Deserialize, Serialize};

use super::compquery::{
    ComponentQuery, DominanceOptions, NameOptions, StringCriterion, match_in_set, match_level,
    match_regex,
};
use crate::{
    error::PolicyError,
    policy::{SelinuxPolicy, Sensitivity},
};

/// Sensitivity query criteria, as read from a criteria file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensitivityCriteria {
    /// Name of the sensitivity to match
    pub name: String,
    pub name_regex: bool,
    /// Alias name to match
    pub alias: String,
    pub alias_regex: bool,
    /// Sensitivity to match by dominance
    pub sens: String,
    /// Match if `sens` dominates the sensitivity
    pub sens_dom: bool,
    /// Match if `sens` is dominated by the sensitivity
    pub sens_domby: bool,
}

/// Query MLS sensitivities
#[derive(Debug, Clone)]
pub struct SensitivityQuery<'p> {
    policy: &'p SelinuxPolicy,
    name: StringCriterion,
    alias: StringCriterion,
    sens: Option<Sensitivity<'p>>,
    sens_opts: DominanceOptions,
}

impl<'p> SensitivityQuery<'p> {
    /// A query with no criteria, matching every sensitivity
    pub fn new(policy: &'p SelinuxPolicy) -> Self {
        Self {
            policy,
            name: StringCriterion::default(),
            alias: StringCriterion::default(),
            sens: None,
            sens_opts: DominanceOptions::default(),
        }
    }

    pub fn with_criteria(
        policy: &'p SelinuxPolicy,
        criteria: &SensitivityCriteria,
    ) -> Result<Self, PolicyError> {
        let mut query = Self::new(policy);
        query.apply(criteria)?;
        Ok(query)
    }

    /// Replace every criterion. On error the query is left unchanged.
    pub fn apply(&mut self, criteria: &SensitivityCriteria) -> Result<(), PolicyError> {
        let name = StringCriterion::new(
            &criteria.name,
            NameOptions {
                regex: criteria.name_regex,
            },
        )?;
        let alias = StringCriterion::new(
            &criteria.alias,
            NameOptions {
                regex: criteria.alias_regex,
            },
        )?;
        let sens = self.resolve(&criteria.sens)?;

        self.name = name;
        self.alias = alias;
        self.sens = sens;
        self.sens_opts = DominanceOptions {
            dom: criteria.sens_dom,
            domby: criteria.sens_domby,
        };
        Ok(())
    }

    pub fn alias(&self) -> &StringCriterion {
        &self.alias
    }

    /// Set the criterion for the sensitivity's aliases
    pub fn set_alias(&mut self, alias: &str, opts: NameOptions) -> Result<(), PolicyError> {
        self.alias = StringCriterion::new(alias, opts)?;
        log::debug!("sensitivity alias criterion: {:?}", self.alias);
        Ok(())
    }

    /// The resolved dominance reference, if set
    pub fn sensitivity(&self) -> Option<&Sensitivity<'p>> {
        self.sens.as_ref()
    }

    pub fn dominance(&self) -> DominanceOptions {
        self.sens_opts
    }

    /// Set the criterion for matching the sensitivity by dominance.
    ///
    /// The name is resolved against the policy immediately.
    pub fn set_sensitivity(
        &mut self,
        sens: &str,
        opts: DominanceOptions,
    ) -> Result<(), PolicyError> {
        self.sens = self.resolve(sens)?;
        self.sens_opts = opts;
        log::debug!(
            "sensitivity dominance criterion: {:?} {:?}",
            self.sens,
            self.sens_opts
        );
        Ok(())
    }

    fn resolve(&self, sens: &str) -> Result<Option<Sensitivity<'p>>, PolicyError> {
        if sens.is_empty() {
            return Ok(None);
        }
        self.policy.lookup_sensitivity(sens).map(Some)
    }

    /// Name, then alias, then dominance; later filters never see a rejected candidate
    fn matches(&self, candidate: &Sensitivity<'p>) -> bool {
        if let Some(matcher) = self.name.matcher()
            && !match_regex(candidate.name(), matcher)
        {
            log::trace!("{}: name does not match", candidate);
            return false;
        }

        if let Some(matcher) = self.alias.matcher()
            && !match_in_set(candidate.aliases(), matcher)
        {
            log::trace!("{}: no alias matches", candidate);
            return false;
        }

        if let Some(reference) = &self.sens
            && !match_level(candidate, reference, self.sens_opts.into())
        {
            log::trace!("{}: dominance does not match {}", candidate, reference);
            return false;
        }

        true
    }
}

impl<'p> ComponentQuery<'p> for SensitivityQuery<'p> {
    type Item = Sensitivity<'p>;

    fn policy(&self) -> &'p SelinuxPolicy {
        self.policy
    }

    fn name(&self) -> &StringCriterion {
        &self.name
    }

    fn set_name(&mut self, name: &str, opts: NameOptions) -> Result<(), PolicyError> {
        self.name = StringCriterion::new(name, opts)?;
        log::debug!("sensitivity name criterion: {:?}", self.name);
        Ok(())
    }

    fn results(&self) -> impl Iterator<Item = Sensitivity<'p>> + '_ {
        self.policy
            .sensitivities()
            .filter(move |candidate| self.matches(candidate))
    }
}
