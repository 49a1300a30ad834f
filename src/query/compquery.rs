use regex::Regex;

use crate::{error::PolicyError, policy::SelinuxPolicy};

/// Compiled form of a string criterion
#[derive(Debug, Clone)]
pub enum Matcher {
    Exact(String),
    Regex(Regex),
}

impl Matcher {
    /// Compile `raw` as a literal or as a regular expression
    pub fn compile(raw: &str, regex: bool) -> Result<Self, PolicyError> {
        if !regex {
            return Ok(Matcher::Exact(raw.to_string()));
        }

        Regex::new(raw)
            .map(Matcher::Regex)
            .map_err(|source| PolicyError::InvalidRegex {
                pattern: raw.to_string(),
                source,
            })
    }

    /// Exact comparison, or a regex search anywhere in `candidate`
    pub fn is_match(&self, candidate: &str) -> bool {
        match self {
            Matcher::Exact(expected) => expected == candidate,
            Matcher::Regex(regex) => regex.is_match(candidate),
        }
    }
}

/// A string criterion: the raw value, its compiled matcher, and the regex flag.
///
/// The matcher is built once when the criterion is set. An empty value
/// leaves the matcher unset and the criterion matches everything.
#[derive(Debug, Clone, Default)]
pub struct StringCriterion {
    raw: String,
    matcher: Option<Matcher>,
    regex: bool,
}

impl StringCriterion {
    pub fn new(raw: &str, opts: NameOptions) -> Result<Self, PolicyError> {
        let matcher = if raw.is_empty() {
            None
        } else {
            Some(Matcher::compile(raw, opts.regex)?)
        };

        Ok(Self {
            raw: raw.to_string(),
            matcher,
            regex: opts.regex,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_regex(&self) -> bool {
        self.regex
    }

    pub fn matcher(&self) -> Option<&Matcher> {
        self.matcher.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.matcher.is_some()
    }
}

/// Options accepted by name and alias setters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NameOptions {
    /// Match as a regular expression instead of literally
    pub regex: bool,
}

/// Options accepted by dominance setters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DominanceOptions {
    /// Match if the criterion dominates the candidate
    pub dom: bool,
    /// Match if the criterion is dominated by the candidate
    pub domby: bool,
}

/// Active dominance sub-modes. A candidate passes if any active sub-mode
/// holds; with none active, equality is tested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DominanceMode {
    pub equal: bool,
    pub dom: bool,
    pub domby: bool,
    pub incomp: bool,
}

impl DominanceMode {
    pub fn is_empty(&self) -> bool {
        !(self.equal || self.dom || self.domby || self.incomp)
    }
}

impl From<DominanceOptions> for DominanceMode {
    fn from(opts: DominanceOptions) -> Self {
        Self {
            equal: false,
            dom: opts.dom,
            domby: opts.domby,
            incomp: false,
        }
    }
}

/// Match a candidate's string form
pub fn match_regex(candidate: &str, matcher: &Matcher) -> bool {
    matcher.is_match(candidate)
}

/// Match if any member of the set matches
pub fn match_in_set<I, S>(members: I, matcher: &Matcher) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    members
        .into_iter()
        .any(|member| matcher.is_match(member.as_ref()))
}

/// Match `obj` against `criteria` in a dominance hierarchy
pub fn match_level<L: PartialOrd>(obj: &L, criteria: &L, mode: DominanceMode) -> bool {
    if mode.is_empty() {
        return criteria == obj;
    }

    (mode.equal && criteria == obj)
        || (mode.dom && criteria >= obj)
        || (mode.domby && criteria <= obj)
        || (mode.incomp && criteria.partial_cmp(obj).is_none())
}

/// A query over one kind of policy component
pub trait ComponentQuery<'p> {
    type Item;

    fn policy(&self) -> &'p SelinuxPolicy;

    fn name(&self) -> &StringCriterion;

    /// Set the name criterion; an empty name disables it
    fn set_name(&mut self, name: &str, opts: NameOptions) -> Result<(), PolicyError>;

    /// Matching components. Each call starts a fresh scan.
    fn results(&self) -> impl Iterator<Item = Self::Item> + '_;
}
