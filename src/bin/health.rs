use std::env;
use std::process::ExitCode;

use url::Url;

const DEFAULT_URL: &str = "http://127.0.0.1:5000/health";

fn main() -> ExitCode {
    let target = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_URL.to_string());
    let url = match Url::parse(&target) {
        Ok(url) => url,
        Err(err) => {
            eprintln!("Invalid URL {target}: {err}");
            return ExitCode::from(2);
        }
    };

    match reqwest::blocking::get(url) {
        Ok(response) if response.status().is_success() => ExitCode::SUCCESS,
        Ok(response) => {
            eprintln!("Health check failed with status {}", response.status());
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Health check request failed: {err}");
            ExitCode::FAILURE
        }
    }
}
