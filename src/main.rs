use std::process::ExitCode;

fn main() -> ExitCode {
    match kascrm_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
