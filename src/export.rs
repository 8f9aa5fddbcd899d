//! Export of the loaded dataset as a json file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{CVError, Category, Dataset, Record};

pub fn file_name(category: Category) -> String {
    format!("{}-data.json", category.path())
}

/// Pretty printed json array (two space indent) of `records`.
pub fn serialize_records(records: &[Record]) -> Result<String, CVError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Expand `~` and environment variables of a user supplied directory.
pub fn expand_dir(dir: &Path) -> Result<PathBuf, CVError> {
    let raw = dir.to_string_lossy();
    let expanded = shellexpand::full(&raw).map_err(|e| CVError::InvalidPath(e.to_string()))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Write the full dataset, ignoring any filter or paging, to
/// `<dir>/<category>-data.json`. Nothing is written without a dataset.
pub fn export_dataset(dataset: Option<&Dataset>, dir: &Path) -> Result<PathBuf, CVError> {
    let dataset = dataset.ok_or(CVError::NoDataToExport)?;
    let content = serialize_records(&dataset.records)?;

    let path = expand_dir(dir)?.join(file_name(dataset.category));
    fs::write(&path, content)?;
    info!(
        "Exported {} {} to {}",
        dataset.len(),
        dataset.category,
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comment, Post};

    fn dataset() -> Dataset {
        Dataset::new(
            Category::Posts,
            vec![Record::Post(Post {
                author_id: Some(1),
                id: 1,
                title: Some("Hello".into()),
                body: Some("...".into()),
            })],
        )
    }

    #[test]
    fn serializes_wire_shape_with_two_space_indent() {
        let json = serialize_records(&dataset().records).unwrap();
        let expected = "[\n  {\n    \"userId\": 1,\n    \"id\": 1,\n    \"title\": \"Hello\",\n    \"body\": \"...\"\n  }\n]";
        assert_eq!(json, expected);
    }

    #[test]
    fn omits_missing_fields() {
        let records = vec![Record::Comment(Comment {
            post_id: Some(3),
            id: 4,
            name: None,
            email: Some("a@b.c".into()),
            body: None,
        })];
        let json = serialize_records(&records).unwrap();
        assert!(!json.contains("name"));
        assert!(json.contains("\"postId\": 3"));
    }

    #[test]
    fn export_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let data = dataset();
        let first = export_dataset(Some(&data), dir.path()).unwrap();
        let a = fs::read(&first).unwrap();
        let second = export_dataset(Some(&data), dir.path()).unwrap();
        let b = fs::read(&second).unwrap();
        assert_eq!(first, second);
        assert_eq!(a, b);
        assert_eq!(first.file_name().unwrap(), "posts-data.json");
    }

    #[test]
    fn empty_dataset_exports_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let data = Dataset::new(Category::Comments, Vec::new());
        let path = export_dataset(Some(&data), dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "comments-data.json");
        let content = fs::read_to_string(path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, serde_json::json!([]));
    }

    #[test]
    fn missing_dataset_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_dataset(None, dir.path()).unwrap_err();
        assert!(matches!(err, CVError::NoDataToExport));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
