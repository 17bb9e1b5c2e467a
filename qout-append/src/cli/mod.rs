use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use clap::{value_parser, Arg, ArgAction, ArgMatches, ColorChoice, Command};

use qout_archive::prelude::{ArchiveConfig, MergeOpts};

use crate::Error;

mod append;
mod merge;
mod update;

lazy_static! {
    /// Options shared by all modes
    pub static ref SHARED_ARGS: Vec<Arg> = vec![
        Arg::new("logs")
            .long("logs")
            .value_name("DIR")
            .value_parser(value_parser!(PathBuf))
            .action(ArgAction::Set)
            .help("Log into a time stamped file within this directory, instead of stdout."),
        Arg::new("config")
            .short('c')
            .long("config")
            .value_name("FILE")
            .value_parser(value_parser!(PathBuf))
            .action(ArgAction::Set)
            .help("Archive configuration (JSON). Defaults to the ERA-5 naming conventions."),
        Arg::new("parallel")
            .short('p')
            .long("parallel")
            .action(ArgAction::SetTrue)
            .help("Process regions concurrently."),
        Arg::new("strict")
            .long("strict")
            .action(ArgAction::SetTrue)
            .help("Exit with an error status when any region failed."),
    ];

    /// Merge options shared by all modes.
    /// Time axes are not exposed: Qout files declare them through their dimensions.
    pub static ref MERGE_ARGS: Vec<Arg> = vec![
        Arg::new("require-reach-ids")
            .long("require-reach-ids")
            .action(ArgAction::SetTrue)
            .help("Refuse to merge datasets that do not describe their reach identifiers."),
    ];
}

pub struct Cli {
    /// Arguments passed by user
    pub matches: ArgMatches,
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}

impl Cli {
    /// Build new command line interface
    pub fn new() -> Self {
        Self {
            matches: {
                Command::new("qout-append")
                    .author("Qout archive maintainers")
                    .version(env!("CARGO_PKG_VERSION"))
                    .about("Appends simulated river discharge onto Qout archives")
                    .arg_required_else_help(true)
                    .color(ColorChoice::Always)
                    .subcommand(append::subcommand())
                    .subcommand(update::subcommand())
                    .subcommand(merge::subcommand())
                    .get_matches()
            },
        }
    }

    /// Selected mode, and its own arguments
    pub fn mode(&self) -> Option<(&str, &ArgMatches)> {
        self.matches.subcommand()
    }

    /// Log file directory, if any
    pub fn logs(matches: &ArgMatches) -> Option<&PathBuf> {
        matches.get_one::<PathBuf>("logs")
    }

    pub fn strict(matches: &ArgMatches) -> bool {
        matches.get_flag("strict")
    }

    fn merge_opts(matches: &ArgMatches, base: &MergeOpts) -> MergeOpts {
        let mut opts = base.clone();
        if matches.get_flag("require-reach-ids") {
            opts.require_reach_ids = true;
        }
        opts
    }

    /// Builds the [ArchiveConfig]: optional JSON file, then command line overrides.
    pub fn archive_config(matches: &ArgMatches) -> Result<ArchiveConfig, Error> {
        let cfg = match matches.get_one::<PathBuf>("config") {
            Some(path) => Self::load_config(path)?,
            None => ArchiveConfig::default(),
        };
        let opts = Self::merge_opts(matches, &cfg.merge);
        let parallel = cfg.parallel || matches.get_flag("parallel");
        Ok(cfg.with_merge_opts(opts).with_parallel(parallel))
    }

    fn load_config(path: &Path) -> Result<ArchiveConfig, Error> {
        let mut content = String::new();
        File::open(path)?.read_to_string(&mut content)?;
        let cfg = serde_json::from_str(&content)?;
        info!("configuration loaded from \"{}\"", path.display());
        Ok(cfg)
    }

    /// Required path argument
    pub fn path<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a PathBuf, Error> {
        matches
            .get_one::<PathBuf>(id)
            .ok_or_else(|| Error::MissingArgument(id.to_string()))
    }
}
