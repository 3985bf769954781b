//! Progress indicators for long-running commands.

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner for indeterminate operations (downloads, bulk loads).
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .expect("Invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_starts_unfinished() {
        let pb = spinner("working");
        assert!(!pb.is_finished());
        pb.finish_and_clear();
    }
}
