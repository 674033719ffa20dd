use once_cell::sync::Lazy;
use regex::Regex;

/// Characters Windows (and most filesystems) refuse in file names.
static ILLEGAL_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;

/// Removes illegal characters from a filename. Characters are dropped, not
/// replaced, so a clean name passes through untouched.
pub fn sanitize_filename(filename: &str) -> String {
    ILLEGAL_FILENAME_CHARS.replace_all(filename, "").into_owned()
}

/// Formats a size in bytes to a human-readable string (KB, MB, GB).
/// Missing or unusable sizes render as "N/A".
pub fn format_filesize(size_bytes: Option<f64>) -> String {
    let Some(bytes) = size_bytes.filter(|b| b.is_finite()) else {
        return "N/A".to_string();
    };

    if bytes >= GB {
        format!("{:.2} GB", bytes / GB)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes / MB)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes / KB)
    } else {
        format!("{} Bytes", bytes as i64)
    }
}
