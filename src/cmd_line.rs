//! Command line options that are used across applications.

use std::path::{Path, PathBuf};

use clap::{App, Arg, ArgMatches};

use crate::{
    config::{default_root, Config},
    cycle::Cycle,
    errors::GfsFetchErr,
};

/// Struct to package up command line arguments.
#[derive(Clone, Debug)]
pub struct CommonCmdLineArgs {
    // Directory for downloads and the forecast log.
    root: PathBuf,
    // The parameter file.
    config: PathBuf,
    // Run to use instead of the configured or latest one.
    cycle: Option<Cycle>,
    // Forecast hours up to 384 instead of 120 when the configuration has no steps.
    extended: bool,
}

impl<'a, 'b> CommonCmdLineArgs {
    /// Create a new set of args.
    pub fn new_app(app_name: &'static str, about: &'static str) -> App<'a, 'b> {
        App::new(app_name)
            .author("Ryan <rnleach@users.noreply.github.com>")
            .about(about)
            .version(crate_version!())
            .arg(
                Arg::with_name("root")
                    .short("r")
                    .long("root")
                    .takes_value(true)
                    .help("Path to the data directory.")
                    .long_help("Path to the data directory. Defaults to '${HOME}/gfs/'"),
            )
            .arg(
                Arg::with_name("config")
                    .short("c")
                    .long("config")
                    .takes_value(true)
                    .help("Path to the parameter file.")
                    .long_help(
                        "Path to the parameter file. Defaults to 'parameter.json' in the data \
                         directory.",
                    ),
            )
            .arg(
                Arg::with_name("datetime")
                    .short("d")
                    .long("datetime")
                    .takes_value(true)
                    .help("Issuance of the forecast, YYYYMMDDHH.")
                    .long_help(
                        "Issuance of the forecast as YYYYMMDDHH with HH one of 00, 06, 12, 18. \
                         Overrides date and time of the parameter file.",
                    ),
            )
            .arg(
                Arg::with_name("extended")
                    .short("e")
                    .long("extended")
                    .help("Forecast up to 384 hours instead of 120."),
            )
            .after_help(concat!(
                "Without a datetime on the command line or a date in the parameter file the ",
                "latest run is used, falling back to the run 6 hours earlier if it is not ",
                "completely on the server yet."
            ))
    }

    /// Process an `App` to get the parsed values out of it and the matches object so an application
    /// can continue with further argument parsing.
    pub fn matches(app: App<'a, 'b>) -> Result<(Self, ArgMatches<'a>), GfsFetchErr> {
        let matches = app.get_matches();
        let cmd_line_opts = Self::from_matches(&matches)?;
        Ok((cmd_line_opts, matches))
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self, GfsFetchErr> {
        let root = matches
            .value_of("root")
            .map(PathBuf::from)
            .or_else(default_root)
            .ok_or_else(|| GfsFetchErr::GeneralError("no home directory".to_owned()))?;

        let config = matches
            .value_of("config")
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join(Config::FILE_NAME));

        let cycle = matches.value_of("datetime").map(Cycle::parse).transpose()?;

        Ok(CommonCmdLineArgs {
            root,
            config,
            cycle,
            extended: matches.is_present("extended"),
        })
    }

    /// Get the data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the path of the parameter file.
    pub fn config(&self) -> &Path {
        &self.config
    }

    /// Get the run given on the command line.
    pub fn cycle(&self) -> Option<Cycle> {
        self.cycle
    }

    /// Extended forecast range.
    pub fn extended(&self) -> bool {
        self.extended
    }
}
