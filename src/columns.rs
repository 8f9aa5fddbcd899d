//! Column descriptors of the content table.

use std::cmp::Ordering;

use crate::domain::{Category, Record};

pub const MISSING_LABEL: &str = "N/A";
pub const MISSING_CONTENT: &str = "No content";

/// Which record field a column reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Id,
    Title,
    Name,
    Actions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub id: &'static str,
    pub header: &'static str,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    /// Raw value of the bound field, `None` if the record lacks it.
    pub fn field(&self, record: &Record) -> Option<String> {
        match self.kind {
            ColumnKind::Id => Some(record.id().to_string()),
            ColumnKind::Title => record.title().map(str::to_string),
            ColumnKind::Name => record.name().map(str::to_string),
            ColumnKind::Actions => None,
        }
    }

    /// Text shown in the cell.
    pub fn cell(&self, record: &Record) -> String {
        match self.kind {
            ColumnKind::Id => record.id().to_string(),
            ColumnKind::Title | ColumnKind::Name => self
                .field(record)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| MISSING_LABEL.to_string()),
            ColumnKind::Actions => "…".to_string(),
        }
    }

    pub fn is_sortable(&self) -> bool {
        !matches!(self.kind, ColumnKind::Actions)
    }

    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self.kind {
            ColumnKind::Id => a.id().cmp(&b.id()),
            ColumnKind::Title | ColumnKind::Name => self.cell(a).cmp(&self.cell(b)),
            ColumnKind::Actions => Ordering::Equal,
        }
    }
}

/// Ordered column set plus the column the free text filter applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    specs: Vec<ColumnSpec>,
    filterable: Option<usize>,
}

impl Columns {
    pub fn new(specs: Vec<ColumnSpec>, filterable: Option<&str>) -> Self {
        let filterable = filterable.and_then(|id| specs.iter().position(|c| c.id == id));
        Self { specs, filterable }
    }

    pub fn all(&self) -> &[ColumnSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ColumnSpec> {
        self.specs.iter().find(|c| c.id == id)
    }

    pub fn filter_column(&self) -> Option<&ColumnSpec> {
        self.filterable.map(|idx| &self.specs[idx])
    }
}

/// Columns for a category: id, label (`title` or `name`) and row actions.
pub fn build_columns(category: Category) -> Columns {
    let label = match category {
        Category::Posts => ColumnSpec {
            id: "title",
            header: "Title",
            kind: ColumnKind::Title,
        },
        Category::Comments => ColumnSpec {
            id: "name",
            header: "Name",
            kind: ColumnKind::Name,
        },
    };
    let label_id = label.id;
    Columns::new(
        vec![
            ColumnSpec {
                id: "id",
                header: "ID",
                kind: ColumnKind::Id,
            },
            label,
            ColumnSpec {
                id: "actions",
                header: "",
                kind: ColumnKind::Actions,
            },
        ],
        Some(label_id),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    CopyId,
    CopyLabel,
}

impl RowAction {
    pub const ALL: [RowAction; 2] = [RowAction::CopyId, RowAction::CopyLabel];

    pub fn title(&self) -> &'static str {
        match self {
            RowAction::CopyId => "Copy ID",
            RowAction::CopyLabel => "Copy Title/Name",
        }
    }

    /// Text put on the clipboard for `record`.
    pub fn text_for(&self, record: &Record) -> String {
        match self {
            RowAction::CopyId => record.id().to_string(),
            RowAction::CopyLabel => record
                .title()
                .filter(|s| !s.is_empty())
                .or(record.name().filter(|s| !s.is_empty()))
                .unwrap_or(MISSING_CONTENT)
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comment, Post};

    fn comment(id: i64, name: Option<&str>) -> Record {
        Record::Comment(Comment {
            post_id: Some(1),
            id,
            name: name.map(str::to_string),
            email: Some("a@b.c".into()),
            body: Some("body".into()),
        })
    }

    #[test]
    fn always_three_columns() {
        for category in Category::ALL {
            let columns = build_columns(category);
            let ids: Vec<_> = columns.all().iter().map(|c| c.id).collect();
            let label = match category {
                Category::Posts => "title",
                Category::Comments => "name",
            };
            assert_eq!(ids, vec!["id", label, "actions"]);
            assert_eq!(columns.filter_column().map(|c| c.id), Some(label));
        }
    }

    #[test]
    fn headers_follow_category() {
        assert_eq!(build_columns(Category::Posts).all()[1].header, "Title");
        assert_eq!(build_columns(Category::Comments).all()[1].header, "Name");
    }

    #[test]
    fn missing_label_renders_fallback() {
        let columns = build_columns(Category::Comments);
        let label = &columns.all()[1];
        assert_eq!(label.cell(&comment(3, None)), MISSING_LABEL);
        assert_eq!(label.cell(&comment(3, Some(""))), MISSING_LABEL);
        assert_eq!(label.cell(&comment(3, Some("Ann"))), "Ann");
        assert_eq!(columns.all()[0].cell(&comment(3, None)), "3");
    }

    #[test]
    fn copy_actions() {
        let record = comment(42, None);
        assert_eq!(RowAction::CopyId.text_for(&record), "42");
        assert_eq!(RowAction::CopyLabel.text_for(&record), MISSING_CONTENT);

        let post = Record::Post(Post {
            author_id: Some(1),
            id: 1,
            title: Some("Hello".into()),
            body: None,
        });
        assert_eq!(RowAction::CopyLabel.text_for(&post), "Hello");
    }

    #[test]
    fn unknown_filter_column_is_ignored() {
        let columns = Columns::new(build_columns(Category::Posts).all().to_vec(), Some("body"));
        assert!(columns.filter_column().is_none());
    }

    #[test]
    fn actions_column_is_not_sortable() {
        let columns = build_columns(Category::Posts);
        assert!(columns.get("id").unwrap().is_sortable());
        assert!(!columns.get("actions").unwrap().is_sortable());
    }
}
