//! Fixed-width text tables for the shell

use crate::backup::BackupRecord;
use chrono::{DateTime, Local, Utc};
use std::fmt::Write;

const NAME_WIDTH: usize = 15;
const SOURCE_WIDTH: usize = 40;
const DATE_WIDTH: usize = 25;

/// Width of a full backup listing row
pub const LISTING_WIDTH: usize = NAME_WIDTH + SOURCE_WIDTH + 2 * DATE_WIDTH;

/// `text` followed by spaces up to `width`. Longer text is kept whole.
pub fn spaced(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%d/%m/%Y (%H:%M)").to_string()
}

pub fn rule(width: usize) -> String {
    "-".repeat(width)
}

/// Header, rule, and one row per record
pub fn render_backups(records: &[BackupRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}{}{}{}",
        spaced("Name", NAME_WIDTH),
        spaced("Source", SOURCE_WIDTH),
        spaced("Creation date", DATE_WIDTH),
        spaced("Last modification date", DATE_WIDTH),
    );
    let _ = writeln!(out, "{}", rule(LISTING_WIDTH));

    for record in records {
        let _ = writeln!(
            out,
            "{}{}{}{}",
            spaced(&record.name, NAME_WIDTH),
            spaced(&record.source_path.display().to_string(), SOURCE_WIDTH),
            spaced(&format_date(&record.created_at), DATE_WIDTH),
            spaced(&format_date(&record.last_modified), DATE_WIDTH),
        );
    }
    out
}
