// Single pair opmode
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

use super::{MERGE_ARGS, SHARED_ARGS};

pub fn subcommand() -> Command {
    Command::new("merge")
        .short_flag('m')
        .long_flag("merge")
        .arg_required_else_help(true)
        .about("Append one addition onto one record.")
        .arg(
            Arg::new("record")
                .short('r')
                .long("record")
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .action(ArgAction::Set)
                .required(true)
                .help("Record file, updated in place unless --output is given."),
        )
        .arg(
            Arg::new("addition")
                .short('d')
                .long("addition")
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .action(ArgAction::Set)
                .required(true)
                .help("Addition file."),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .action(ArgAction::Set)
                .help("Store the merged record into this file."),
        )
        .next_help_heading("Environment")
        .args(SHARED_ARGS.iter())
        .next_help_heading("Merge")
        .args(MERGE_ARGS.iter())
}
