#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::{
    process::ExitCode,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use structopt::StructOpt;
use tabsearch_cli::args::CliArgs;

fn main() -> ExitCode {
    let args = CliArgs::from_args();
    tabsearch_cli::init_logging(args.log_level());

    // Stop the search cleanly on `Ctrl-C`, so that the touches found so far are still printed
    let abort_flag = Arc::new(AtomicBool::new(false));
    let handler_flag = abort_flag.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)) {
        log::warn!("Can't set Ctrl-C handler: {}", e);
    }

    match tabsearch_cli::run(&args.input_file, &args.options, Some(&abort_flag)) {
        Ok(Some(result)) => {
            result.print();
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}
