pub mod compquery;
pub mod netifcon;
pub mod sensitivity;

pub use compquery::{
    ComponentQuery, DominanceMode, DominanceOptions, Matcher, NameOptions, StringCriterion,
};
pub use netifcon::{NetifconCriteria, NetifconQuery};
pub use sensitivity::{SensitivityCriteria, SensitivityQuery};
