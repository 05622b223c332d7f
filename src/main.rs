mod cmd;

use argh::FromArgs;
use cmd::SubCommand;

#[derive(FromArgs, PartialEq, Debug)]
/// Tools for inspecting and converting SC3D model containers.
struct TopLevel {
    #[argh(switch, short = 'v')]
    /// enable debug logging
    verbose: bool,
    #[argh(subcommand)]
    command: SubCommand,
}

fn main() {
    let args: TopLevel = argh::from_env();
    let filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .format_target(false)
        .format_level(false)
        .init();

    let result = match args.command {
        SubCommand::Info(args) => cmd::info::run(args),
        SubCommand::Dump(args) => cmd::dump::run(args),
    };
    if let Err(e) = result {
        eprintln!("Failed: {e:?}");
        std::process::exit(1);
    }
}
