use crate::record::PageMeta;
use crate::sync::SyncStats;
use crate::ui::theme::{err_theme, theme};
use crate::ui::Icons;
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(err_theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(err_theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn timing(elapsed: &str) {
    println!("{} {}", Icons::CLOCK.style(theme().dim.clone()), elapsed);
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value);
}

/// Summary printed after a rebuild
pub fn sync_summary(stats: &SyncStats) {
    section("Rebuild complete");
    summary_row("Pages:", &stats.pages.to_string());
    summary_row("Documents:", &stats.documents.to_string());
    if stats.skipped > 0 {
        summary_row("Skipped:", &stats.skipped.to_string().style(theme().warn.clone()).to_string());
    }
    timing(&format!("{:.2?}", stats.elapsed));
}

/// `draft` marker for a page listing line
pub fn draft_marker(meta: &PageMeta) -> String {
    if meta.draft {
        "draft".style(theme().draft.clone()).to_string()
    } else {
        String::new()
    }
}
