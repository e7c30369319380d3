use clap::Parser;
use log::{debug, warn};

mod args;
mod regprep;

fn main() {
    let args = args::Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    debug!("args: {:?}", args);

    let res = regprep::run_conversion(&args);

    if let Err(e) = res {
        warn!("Conversion failed: {}", e);
        eprintln!("Conversion failed: {}", e);
        regprep::print_diagnostics(&e);
        std::process::exit(1);
    }
}
