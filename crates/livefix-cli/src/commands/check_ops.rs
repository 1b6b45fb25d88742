use std::time::Duration;

use livefix_core::http::HttpCorrectionService;
use livefix_core::script::contains_target_script;
use livefix_core::service::{CorrectionRequest, CorrectionService, Operation};
use livefix_core::settings::Settings;

use super::exit_with;

/// Send one request to the service and print the JSON response.
pub fn check(
    settings: &Settings,
    text: &str,
    endpoint: Option<&str>,
    operation: Option<Operation>,
) {
    if !contains_target_script(text) {
        eprintln!("warning: no Tamil characters in input; the engine would never send this");
    }
    let service = HttpCorrectionService::new(
        endpoint.unwrap_or(&settings.service.endpoint),
        Duration::from_millis(settings.service.timeout_ms),
    );
    let request = CorrectionRequest {
        text: text.to_string(),
        operation: operation.unwrap_or(settings.service.word_operation),
    };
    match service.correct(&request) {
        Ok(response) => match serde_json::to_string_pretty(&response) {
            Ok(json) => println!("{json}"),
            Err(e) => exit_with(&format!("Error: {e}")),
        },
        Err(failure) => exit_with(&format!(
            "Error ({}) from {}: {failure}",
            failure.kind(),
            service.endpoint()
        )),
    }
}
