//! Terminal rendering of stores and results

use cv_state::{LogStore, Subscription, UiState};
use cv_types::{ApiLogEntry, LogStatus};
use serde::Serialize;

/// Mirror the banner and loading cells to the terminal while the guard lives
pub fn attach(ui: &UiState) -> Vec<Subscription> {
    vec![
        ui.loading_message.subscribe(|message| {
            if !message.is_empty() {
                eprintln!("⏳ {}", message);
            }
        }),
        ui.success_message.subscribe(|message| {
            if !message.is_empty() {
                eprintln!("✅ {}", message);
            }
        }),
        ui.error_message.subscribe(|message| {
            if !message.is_empty() {
                eprintln!("❌ {}", message);
            }
        }),
    ]
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_logs(logs: &LogStore) {
    let entries = logs.entries();
    if entries.is_empty() {
        println!("No API calls recorded");
        return;
    }

    println!("API log ({} entries, most recent first):", entries.len());
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
}

fn format_entry(entry: &ApiLogEntry) -> String {
    let icon = match entry.status {
        LogStatus::Pending => "…",
        LogStatus::Success => "✓",
        LogStatus::Error => "✗",
    };
    let detail = entry
        .error
        .as_deref()
        .or(entry.message.as_deref())
        .unwrap_or_default();

    format!(
        "  {} {} {:<4} {:<24} {}",
        icon,
        entry.timestamp.format("%H:%M:%S"),
        entry.method,
        entry.endpoint,
        detail
    )
    .trim_end()
    .to_string()
}
