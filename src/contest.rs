use std::collections::HashSet;

use serde::Serialize;

use crate::models::McqRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContestManifest {
    pub contest_name: String,
    pub mcq_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContestError {
    #[error("Contest name is required")]
    EmptyName,
    #[error("Please enter at least one MCQ ID")]
    NoIds,
    #[error("Invalid MCQ IDs found: {}", .0.join(", "))]
    UnknownIds(Vec<String>),
}

/// Splits free text on commas and newlines, dropping blank entries.
pub fn parse_ids(input: &str) -> Vec<String> {
    input
        .split([',', '\n', '\r'])
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds a manifest after checking every id against `records`.
///
/// Input order and duplicates are kept as given.
pub fn assemble(
    name: &str,
    ids_input: &str,
    records: &[McqRecord],
) -> Result<ContestManifest, ContestError> {
    if name.trim().is_empty() {
        return Err(ContestError::EmptyName);
    }

    let ids = parse_ids(ids_input);
    if ids.is_empty() {
        return Err(ContestError::NoIds);
    }

    let known: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
    let unknown: Vec<String> = ids
        .iter()
        .filter(|id| !known.contains(id.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(ContestError::UnknownIds(unknown));
    }

    Ok(ContestManifest {
        contest_name: name.to_string(),
        mcq_ids: ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(ids: &[&str]) -> Vec<McqRecord> {
        ids.iter()
            .map(|id| McqRecord {
                id: id.to_string(),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn reports_only_missing_ids() {
        let err = assemble("Quiz1", "id1, id2\nid3", &records(&["id1", "id2"])).unwrap_err();

        assert_eq!(err, ContestError::UnknownIds(vec!["id3".to_string()]));
        assert_eq!(err.to_string(), "Invalid MCQ IDs found: id3");
    }

    #[test]
    fn builds_manifest_in_input_order() {
        let manifest =
            assemble("Quiz1", "id1, id2\nid3", &records(&["id3", "id2", "id1"])).unwrap();

        assert_eq!(
            manifest,
            ContestManifest {
                contest_name: "Quiz1".to_string(),
                mcq_ids: vec!["id1".to_string(), "id2".to_string(), "id3".to_string()],
            }
        );
    }

    #[test]
    fn keeps_duplicates() {
        let manifest = assemble("Q", "a,a\n\n,b", &records(&["a", "b"])).unwrap();
        assert_eq!(manifest.mcq_ids, vec!["a", "a", "b"]);
    }

    #[test]
    fn lists_every_invalid_id_in_one_message() {
        let err = assemble("Q", "x\ny,z", &records(&["y"])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid MCQ IDs found: x, z");
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            assemble("  ", "a", &records(&["a"])),
            Err(ContestError::EmptyName)
        );
    }

    #[test]
    fn blank_id_list_is_rejected() {
        assert_eq!(
            assemble("Q", " ,\n , ", &records(&["a"])),
            Err(ContestError::NoIds)
        );
    }

    #[test]
    fn manifest_serializes_with_snake_case_keys() {
        let manifest = assemble("Q", "a", &records(&["a"])).unwrap();
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json, serde_json::json!({"contest_name": "Q", "mcq_ids": ["a"]}));
    }
}
