//! Safety checks for batch output files.
//!
//! Batch mode overwrites its output, so the output path is validated against
//! the input before anything is written.

use anyhow::{bail, Result};
use std::path::Path;

/// Validates that a batch output path is safe to overwrite.
///
/// Checks:
/// - Output must have a `.json` extension
/// - Output cannot be the same file as the input queries
///
/// # Returns
/// * `Ok(())` if the output path is safe
/// * `Err` with a descriptive message if the check fails
pub fn validate_output_path(output: &Path, input: &Path) -> Result<()> {
    let is_json = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if !is_json {
        bail!(
            "Safety check failed: output file '{}' must have a .json extension",
            output.display()
        );
    }

    if output == input {
        bail!(
            "Safety check failed: output '{}' cannot be the same as input '{}'",
            output.display(),
            input.display()
        );
    }

    // Different spellings of the same existing file
    if let (Ok(out), Ok(inp)) = (output.canonicalize(), input.canonicalize()) {
        if out == inp {
            bail!(
                "Safety check failed: output '{}' resolves to input '{}'",
                output.display(),
                input.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_output() {
        let output = PathBuf::from("/tmp/links-out.json");
        let input = PathBuf::from("/data/queries.json");
        assert!(validate_output_path(&output, &input).is_ok());
    }

    #[test]
    fn test_missing_json_extension() {
        let output = PathBuf::from("/tmp/links-out.txt");
        let input = PathBuf::from("/data/queries.json");
        let result = validate_output_path(&output, &input);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must have a .json extension"));
    }

    #[test]
    fn test_output_equals_input() {
        let path = PathBuf::from("/data/queries.json");
        let result = validate_output_path(&path, &path);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot be the same as input"));
    }

    #[test]
    fn test_output_resolves_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("queries.json");
        std::fs::write(&input, "[]").unwrap();
        let output = dir.path().join(".").join("queries.json");
        let result = validate_output_path(&output, &input);
        assert!(result.is_err());
    }
}
