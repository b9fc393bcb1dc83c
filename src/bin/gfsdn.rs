//! GFS Downloader.
//!
//! Plans and downloads the selected messages of a GFS run into the data directory.

use std::fs;

use chrono::Utc;
use clap::Arg;
use gfs_fetch::{Client, CommonCmdLineArgs, Config, GfsFetchErr};
use log::info;
use serde_json::json;

fn main() {
    env_logger::init();

    if let Err(ref err) = run() {
        eprintln!("{}: {}", Utc::now().format("%Y-%m-%d %H:%M:%S"), err);
        ::std::process::exit(err.exit_code());
    }
}

fn run() -> Result<(), GfsFetchErr> {
    let app = CommonCmdLineArgs::new_app("gfsdn", "Download parts of GFS forecast files.").arg(
        Arg::with_name("plan-only")
            .short("p")
            .long("plan-only")
            .help("Print the download plan as JSON and exit."),
    );

    let (common_args, matches) = CommonCmdLineArgs::matches(app)?;

    let config = Config::load(&common_args.config())?;
    let request = config.request(common_args.extended(), common_args.cycle())?;
    let client = Client::connect(config.formatter()?);

    let planned = client.plan(&request)?;
    info!(
        "Plan for the {} run: {} file(s), {} bytes",
        planned.cycle,
        planned.plan.entries().len(),
        planned.plan.expected_size()
    );

    if matches.is_present("plan-only") {
        let out = json!({
            "cycle": planned.cycle.to_string(),
            "plan": planned.plan,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    fs::create_dir_all(common_args.root())?;
    let retrieval = client.download(planned, common_args.root(), &request.target)?;
    retrieval.check_sizes()?;

    for (target, size) in retrieval.targets.iter().zip(&retrieval.written) {
        println!("{} {}", size, target.display());
    }

    Ok(())
}
