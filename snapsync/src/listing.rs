// File: snapsync/src/listing.rs
use engine::SnapshotSummary;

const UNIT: u64 = 1024;
const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

/// 1024-based size with one decimal: `512 B`, `1.5 KB`, `3.0 GB`
pub fn human_readable_size(bytes: u64) -> String {
    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < PREFIXES.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.1} {}B", bytes as f64 / div as f64, PREFIXES[exp])
}

/// `<RFC 3339 mtime>  <dir name>  <size>`; unknown fields print as `?`
pub fn format_line(summary: &SnapshotSummary) -> String {
    let modified = summary
        .modified_at
        .map(|time| time.to_rfc3339())
        .unwrap_or_else(|| "?".to_string());
    let size = summary
        .size_bytes
        .map(human_readable_size)
        .unwrap_or_else(|| "?".to_string());

    format!(
        "{}  {}  {}",
        modified,
        summary.instance.generation_name(),
        size
    )
}

pub fn render_json(summaries: &[SnapshotSummary]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summaries)
}
