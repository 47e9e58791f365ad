//! Terminal output utilities

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use sakit_core::{CredentialsError, ErrorKind};
use sakit_secrets::SecretError;
use sakit_storage::StorageError;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a banner header
pub fn header(msg: &str) {
    let rule = "=".repeat(60);
    println!("{}", style(&rule).dim());
    println!("  {}", style(msg).bold());
    println!("{}", style(&rule).dim());
}

/// Print a section title between rules
pub fn section(msg: &str) {
    let rule = "─".repeat(60);
    println!("\n{}", style(&rule).dim());
    println!("{}", style(msg).bold());
    println!("{}", style(&rule).dim());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Print remediation hints
pub fn hints(lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    eprintln!();
    for line in lines {
        eprintln!("  {}", style(line).dim());
    }
}

/// Create a spinner
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Kind and hints of the first sakit error in the chain
pub fn classify(err: &anyhow::Error) -> Option<(ErrorKind, Vec<String>)> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<SecretError>() {
            Some((e.kind(), e.hints()))
        } else if let Some(e) = cause.downcast_ref::<StorageError>() {
            Some((e.kind(), e.hints()))
        } else if let Some(e) = cause.downcast_ref::<CredentialsError>() {
            Some((e.kind(), e.hints()))
        } else {
            cause
                .downcast_ref::<sakit_core::Error>()
                .map(|e| (e.kind(), e.hints()))
        }
    })
}

/// Print an error with its kind-specific hints
pub fn report(err: &anyhow::Error) {
    match classify(err) {
        Some((kind, lines)) => {
            error(&format!("{} ({})", format_chain(err), kind));
            hints(&lines);
        }
        None => error(&format_chain(err)),
    }
}

/// `context: cause: cause` on one line
fn format_chain(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}
