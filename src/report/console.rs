use crate::resolve::ExtractResult;
use crate::screen::{ElementDescriptor, SavedConfigEntry};

/// Values longer than this are cut in the extraction table.
pub const VALUE_WIDTH: usize = 30;

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

/// Format extraction results against the configuration they came from.
///
/// Produces output like:
/// ```text
/// === Extraction: 2 entries ===
///
/// ✓ [0] Student Name     container+label   Zhang San
/// ✗ [1] Contact phone    not found
///
/// === Found: 1/2 ===
/// ```
pub fn format_extract_report(config: &[SavedConfigEntry], results: &[ExtractResult]) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Extraction: {} entries ===\n\n", config.len()));

    for (position, entry) in config.iter().enumerate() {
        let label = pad(entry.display_name(), 16);
        match results.iter().find(|r| r.config_index == position) {
            Some(result) => out.push_str(&format!(
                "\u{2713} [{}] {} {} {}\n",
                position,
                label,
                pad(result.found_by.as_str(), 17),
                truncate_value(&result.value, VALUE_WIDTH)
            )),
            None => out.push_str(&format!("\u{2717} [{}] {} not found\n", position, label)),
        }
    }

    out.push_str(&format!(
        "\n=== Found: {}/{} ===\n",
        results.len(),
        config.len()
    ));
    out
}

/// One line per scanned element.
pub fn format_scan_report(descriptors: &[ElementDescriptor]) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== Scan: {} elements ===\n\n", descriptors.len()));

    for d in descriptors {
        let label = d.label.as_deref().unwrap_or("-");
        out.push_str(&format!(
            "#{:<3} {:<14} {:<16} {}",
            d.index,
            d.element_type.as_str(),
            pad(label, 16),
            d.container_path
        ));
        if d.disabled {
            out.push_str("  (disabled)");
        }
        out.push('\n');
    }
    out
}

pub fn format_config_listing(entries: &[SavedConfigEntry]) -> String {
    if entries.is_empty() {
        return "No saved configuration.\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("=== Saved configuration: {} entries ===\n\n", entries.len()));
    for (position, entry) in entries.iter().enumerate() {
        out.push_str(&format!(
            "[{}] {} {:<14} {}\n",
            position,
            pad(entry.display_name(), 16),
            entry.element_type.as_str(),
            entry.container_selector
        ));
    }
    out
}

/// Cut `value` to `max` characters, marking the cut with `...`.
pub fn truncate_value(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let kept: String = value.chars().take(max).collect();
    format!("{}...", kept)
}

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}
