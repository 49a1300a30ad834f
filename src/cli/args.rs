use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::query::{NetifconCriteria, SensitivityCriteria};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Query network labeling statements and MLS sensitivities of an SELinux policy"
)]
pub struct Args {
    /// Path to the policy description (TOML)
    #[arg(long = "policy", value_name = "PATH")]
    pub policy: PathBuf,

    /// Path to a criteria file (TOML)
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Query MLS sensitivities
    Sensitivity(SensitivityArgs),
    /// Query netifcon statements
    Netifcon(NetifconArgs),
    /// List nodecon statements
    Nodecon,
    /// List portcon statements
    Portcon,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SensitivityArgs {
    /// Sensitivity name to match
    #[arg(long = "name")]
    pub name: Option<String>,

    /// Match the name as a regular expression
    #[arg(long = "name-regex")]
    pub name_regex: bool,

    /// Alias name to match
    #[arg(long = "alias")]
    pub alias: Option<String>,

    /// Match the alias as a regular expression
    #[arg(long = "alias-regex")]
    pub alias_regex: bool,

    /// Sensitivity to match by dominance
    #[arg(long = "sens", value_name = "SENSITIVITY")]
    pub sens: Option<String>,

    /// Match sensitivities dominated by the reference (--sens or the criteria file)
    #[arg(long = "dom")]
    pub sens_dom: bool,

    /// Match sensitivities dominating the reference (--sens or the criteria file)
    #[arg(long = "domby")]
    pub sens_domby: bool,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct NetifconArgs {
    /// Interface name to match
    #[arg(long = "name")]
    pub name: Option<String>,

    /// Match the name as a regular expression
    #[arg(long = "name-regex")]
    pub name_regex: bool,
}

impl SensitivityArgs {
    /// Overlay command line criteria on top of `criteria`
    pub fn merge_into(&self, criteria: &mut SensitivityCriteria) {
        if let Some(name) = &self.name {
            criteria.name = name.clone();
        }
        criteria.name_regex |= self.name_regex;
        if let Some(alias) = &self.alias {
            criteria.alias = alias.clone();
        }
        criteria.alias_regex |= self.alias_regex;
        if let Some(sens) = &self.sens {
            criteria.sens = sens.clone();
        }
        criteria.sens_dom |= self.sens_dom;
        criteria.sens_domby |= self.sens_domby;
    }
}

impl NetifconArgs {
    /// Overlay command line criteria on top of `criteria`
    pub fn merge_into(&self, criteria: &mut NetifconCriteria) {
        if let Some(name) = &self.name {
            criteria.name = name.clone();
        }
        criteria.name_regex |= self.name_regex;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sensitivity_subcommand() {
        let args = Args::try_parse_from([
            "sepolq", "--policy", "policy.toml", "sensitivity", "--sens", "s1", "--dom",
        ])
        .unwrap();

        match args.command {
            Command::Sensitivity(sens) => {
                assert_eq!(sens.sens.as_deref(), Some("s1"));
                assert!(sens.sens_dom);
                assert!(!sens.sens_domby);
            }
            other => panic!("expected sensitivity, got {:?}", other),
        }
    }

    #[test]
    fn dominance_flag_without_reference_on_command_line() {
        let args = Args::try_parse_from([
            "sepolq",
            "--policy",
            "policy.toml",
            "--config",
            "criteria.toml",
            "sensitivity",
            "--dom",
        ])
        .unwrap();

        let Command::Sensitivity(sens) = args.command else {
            panic!("expected sensitivity subcommand");
        };
        assert_eq!(args.config.as_deref(), Some(std::path::Path::new("criteria.toml")));
        assert!(sens.sens.is_none());
        assert!(sens.sens_dom);

        let mut criteria = SensitivityCriteria {
            sens: "s1".to_string(),
            ..Default::default()
        };
        sens.merge_into(&mut criteria);
        assert_eq!(criteria.sens, "s1");
        assert!(criteria.sens_dom);
        assert!(!criteria.sens_domby);
    }

    #[test]
    fn cli_overrides_file_criteria() {
        let mut criteria = SensitivityCriteria {
            name: "s0".to_string(),
            alias: "secret".to_string(),
            ..Default::default()
        };
        let args = SensitivityArgs {
            name: Some("s.*".to_string()),
            name_regex: true,
            ..Default::default()
        };

        args.merge_into(&mut criteria);
        assert_eq!(criteria.name, "s.*");
        assert!(criteria.name_regex);
        assert_eq!(criteria.alias, "secret");
    }
}
