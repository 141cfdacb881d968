//! Seed documents for the policy collection.

use std::fs;
use std::path::Path;

use crate::document::Document;
use crate::error::{AssistantError, Result};

/// The three built-in sample policies.
pub fn sample_documents() -> Vec<Document> {
    vec![
        Document::new(
            "leave_policy",
            "Annual leave: Employees get 20 paid days per year. Leave should be requested 7 days in advance except emergencies.",
        ),
        Document::new(
            "overtime",
            "Overtime: Non-exempt employees will be compensated at 1.5x for hours worked beyond 40 hours/week. Prior approval is required.",
        ),
        Document::new(
            "compensation",
            "Compensation reviews are annual and based on performance. Bonuses are discretionary.",
        ),
    ]
}

/// Read a JSON array of `{"id": ..., "text": ...}` objects.
///
/// # Errors
///
/// - `IoError` if the file cannot be read
/// - `SerializationError` if it is not a list of documents
/// - `Config` if any id or text is blank
pub fn load_documents(path: impl AsRef<Path>) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let documents: Vec<Document> = serde_json::from_str(&raw).map_err(|e| {
        AssistantError::SerializationError(format!("{}: {e}", path.display()))
    })?;

    if let Some(bad) = documents
        .iter()
        .find(|d| d.id.trim().is_empty() || d.text.trim().is_empty())
    {
        return Err(AssistantError::Config(format!(
            "{}: document {:?} has an empty id or text",
            path.display(),
            bad.id
        )));
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sample_ids() {
        let ids: Vec<String> = sample_documents().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["leave_policy", "overtime", "compensation"]);
    }

    #[test]
    fn test_load_documents() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "holiday", "text": "Public holidays follow the local calendar."}}]"#
        )
        .unwrap();

        let docs = load_documents(file.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "holiday");
    }

    #[test]
    fn test_load_rejects_bad_input() {
        let mut not_json = NamedTempFile::new().unwrap();
        write!(not_json, "leave: 20 days").unwrap();
        assert!(matches!(
            load_documents(not_json.path()),
            Err(AssistantError::SerializationError(_))
        ));

        let mut blank = NamedTempFile::new().unwrap();
        write!(blank, r#"[{{"id": "x", "text": "  "}}]"#).unwrap();
        assert!(matches!(
            load_documents(blank.path()),
            Err(AssistantError::Config(_))
        ));

        assert!(matches!(
            load_documents("/nonexistent/docs.json"),
            Err(AssistantError::IoError(_))
        ));
    }
}
