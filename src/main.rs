use std::process::ExitCode;

use webhook_admin::cli::CliApp;
use webhook_admin::AppError;

fn main() -> ExitCode {
    match CliApp::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let category = err
                .chain()
                .find_map(|cause| cause.downcast_ref::<AppError>())
                .map(AppError::category)
                .unwrap_or("error");
            eprintln!("{}: {:#}", category, err);
            ExitCode::FAILURE
        }
    }
}
