use crate::error::AppError;
use std::path::Path;

/// Parse the bundled newline-delimited label file. Line order is the class
/// index order of the model's output vector, so lines are kept as-is apart
/// from a trailing `\r` (the file may be checked out with CRLF endings).
pub fn load_labels(path: &Path) -> Result<Vec<String>, AppError> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError {
        message: format!("Failed to read label file {}: {}", path.display(), e),
    })?;
    Ok(parse_labels(&content))
}

pub fn parse_labels(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_label_per_line() {
        let labels = parse_labels("apple\nbanana\ncherry\n");
        assert_eq!(labels, vec!["apple", "banana", "cherry"]);
    }

    #[test]
    fn strips_carriage_returns() {
        let labels = parse_labels("apple\r\nbanana\r\n");
        assert_eq!(labels, vec!["apple", "banana"]);
    }

    #[test]
    fn keeps_interior_blank_lines_for_index_alignment() {
        // A blank line is still a class slot; dropping it would shift every
        // label after it by one.
        let labels = parse_labels("apple\n\ncherry\n");
        assert_eq!(labels, vec!["apple", "", "cherry"]);
    }

    #[test]
    fn empty_file_gives_empty_list() {
        assert!(parse_labels("").is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_labels(Path::new("/nonexistent/labels.txt")).unwrap_err();
        assert!(err.message.contains("Failed to read label file"));
    }
}
