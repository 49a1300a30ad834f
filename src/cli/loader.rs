use crate::{
    error::PolicyError,
    net::ProtocolTable,
    policy::{MemoryPolicy, SelinuxPolicy},
};

use super::args::{Args, Command};
use super::config::ConfigFile;

/// Load the policy and merge query criteria from the config file and command line
pub struct PolicyLoader;

impl PolicyLoader {
    /// Load the policy named by `--policy`
    pub fn load(args: &Args) -> Result<SelinuxPolicy, PolicyError> {
        let protocols = ProtocolTable::host();
        let source = MemoryPolicy::load(&args.policy, &protocols)?;
        log::info!("Loaded policy {}", args.policy.display());
        Ok(SelinuxPolicy::with_protocols(source, protocols))
    }

    /// Criteria for the selected subcommand: file first, command line on top
    pub fn criteria(args: &Args) -> Result<ConfigFile, PolicyError> {
        let mut config = match args.config.as_ref() {
            Some(config_path) => ConfigFile::load(config_path)?,
            None => ConfigFile::default(),
        };

        match &args.command {
            Command::Sensitivity(sens) => sens.merge_into(&mut config.sensitivity),
            Command::Netifcon(netifcon) => netifcon.merge_into(&mut config.netifcon),
            Command::Nodecon | Command::Portcon => {}
        }

        Ok(config)
    }
}
