use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match potion_manager_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("potion-manager: {}", e);
            ExitCode::FAILURE
        }
    }
}
