// Yearly append opmode
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

use super::{MERGE_ARGS, SHARED_ARGS};

pub fn subcommand() -> Command {
    Command::new("append")
        .short_flag('a')
        .long_flag("append")
        .arg_required_else_help(true)
        .about("Append one year of simulated discharge onto the record of every region.")
        .arg(
            Arg::new("records")
                .short('r')
                .long("records")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Set)
                .required(true)
                .help("Records directory, one sub directory per region."),
        )
        .arg(
            Arg::new("additions")
                .short('d')
                .long("additions")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Set)
                .required(true)
                .help("Additions directory, one sub directory per region."),
        )
        .arg(
            Arg::new("year")
                .short('y')
                .long("year")
                .value_name("YYYY")
                .value_parser(value_parser!(i32))
                .action(ArgAction::Set)
                .required(true)
                .help("Simulated year, covered by the additions."),
        )
        .next_help_heading("Environment")
        .args(SHARED_ARGS.iter())
        .next_help_heading("Merge")
        .args(MERGE_ARGS.iter())
}
