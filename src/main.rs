use clap::Parser;
use sepolq::{
    cli::{Args, run},
    error::PolicyError,
};

fn main() -> Result<(), PolicyError> {
    env_logger::init();

    let args = Args::parse();

    let stdout = std::io::stdout();
    run(&args, &mut stdout.lock())
}
