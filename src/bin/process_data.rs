use std::process::ExitCode;

use category_etl::cli::{report_error, run_process_data};

fn main() -> ExitCode {
    match run_process_data(std::env::args_os().skip(1)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::from(err.exit_code())
        }
    }
}
