// Operational update opmode
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

use super::{MERGE_ARGS, SHARED_ARGS};

pub fn subcommand() -> Command {
    Command::new("update")
        .short_flag('u')
        .long_flag("update")
        .arg_required_else_help(true)
        .about(
            "Append the latest simulation outputs onto the annual records.
The simulated period follows the date stored in the last date file.",
        )
        .arg(
            Arg::new("rapid-io")
                .short('i')
                .long("rapid-io")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Set)
                .required(true)
                .help("Simulation tree, containing input/ and output/ region directories."),
        )
        .arg(
            Arg::new("records")
                .short('r')
                .long("records")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Set)
                .required(true)
                .help("Annual records directory, one sub directory per region."),
        )
        .arg(
            Arg::new("last-date")
                .long("last-date")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Set)
                .help("Last simulated date (YYYYMMDD).
Defaults to last_date_prev_sim.txt within the --logs directory,
or within the simulation tree when no --logs directory is given."),
        )
        .next_help_heading("Environment")
        .args(SHARED_ARGS.iter())
        .next_help_heading("Merge")
        .args(MERGE_ARGS.iter())
}
