use std::io::Write;

use crate::{
    error::PolicyError,
    policy::PolicySymbol,
    query::{ComponentQuery, NetifconQuery, SensitivityQuery},
};

use super::{
    args::{Args, Command},
    loader::PolicyLoader,
};

/// Run the selected query and write one statement per line to `out`
pub fn run(args: &Args, out: &mut impl Write) -> Result<(), PolicyError> {
    let policy = PolicyLoader::load(args)?;
    let criteria = PolicyLoader::criteria(args)?;

    let mut count = 0usize;
    match &args.command {
        Command::Sensitivity(_) => {
            let query = SensitivityQuery::with_criteria(&policy, &criteria.sensitivity)?;
            for sens in query.results() {
                writeln!(out, "{}", sens.statement()?)?;
                count += 1;
            }
        }
        Command::Netifcon(_) => {
            let query = NetifconQuery::with_criteria(&policy, &criteria.netifcon)?;
            for netifcon in query.results() {
                writeln!(out, "{}", netifcon.statement()?)?;
                count += 1;
            }
        }
        Command::Nodecon => {
            for nodecon in policy.nodecons() {
                writeln!(out, "{}", nodecon.statement()?)?;
                count += 1;
            }
        }
        Command::Portcon => {
            for portcon in policy.portcons() {
                writeln!(out, "{}", portcon?.statement()?)?;
                count += 1;
            }
        }
    }

    log::debug!("{} statements written", count);
    Ok(())
}
