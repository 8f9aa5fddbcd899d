use std::fmt;
use std::io::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetcher::{FetchError, FetchOutcome};

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum CVError {
    #[error("io error: {0}")]
    IoError(#[from] Error),
    #[error(transparent)]
    FetchError(#[from] FetchError),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("no data available to download")]
    NoDataToExport,
    #[error("clipboard error: {0}")]
    ClipboardError(#[from] arboard::Error),
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// The content type that is fetched and shown. Selecting a category is the
/// only input that changes what is requested from the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Posts,
    Comments,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Posts, Category::Comments];

    /// Path segment of the REST resource.
    pub fn path(&self) -> &'static str {
        match self {
            Category::Posts => "posts",
            Category::Comments => "comments",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Posts => "Posts",
            Category::Comments => "Comments",
        }
    }

    pub fn next(&self) -> Category {
        match self {
            Category::Posts => Category::Comments,
            Category::Comments => Category::Posts,
        }
    }

    /// Decode a response body into records of this category's shape.
    pub fn decode(&self, body: &[u8]) -> Result<Vec<Record>, serde_json::Error> {
        match self {
            Category::Posts => {
                let posts: Vec<Post> = serde_json::from_slice(body)?;
                Ok(posts.into_iter().map(Record::Post).collect())
            }
            Category::Comments => {
                let comments: Vec<Comment> = serde_json::from_slice(body)?;
                Ok(comments.into_iter().map(Record::Comment).collect())
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none", default)]
    pub author_id: Option<i64>,
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub post_id: Option<i64>,
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub body: Option<String>,
}

/// One fetched content item. Serializes back to its wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Post(Post),
    Comment(Comment),
}

impl Record {
    pub fn id(&self) -> i64 {
        match self {
            Record::Post(p) => p.id,
            Record::Comment(c) => c.id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Record::Post(p) => p.title.as_deref(),
            Record::Comment(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Record::Post(_) => None,
            Record::Comment(c) => c.name.as_deref(),
        }
    }
}

/// The full, unfiltered collection currently held by the view.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub category: Category,
    pub records: Arc<Vec<Record>>,
}

impl Dataset {
    pub fn new(category: Category, records: Vec<Record>) -> Self {
        Self {
            category,
            records: Arc::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Setters)]
pub struct CVConfig {
    pub base_url: String,
    pub category: Category,
    pub page_size: usize,
    pub export_dir: PathBuf,
    pub request_timeout: Option<Duration>,
    pub event_poll_time: u64,
    pub notification_ttl: Duration,
}

impl Default for CVConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            category: Category::Posts,
            page_size: DEFAULT_PAGE_SIZE,
            export_dir: PathBuf::from("."),
            request_timeout: None,
            event_poll_time: 100,
            notification_ttl: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PreviousPage,
    SelectCategory(Category),
    Reload,
    ToggleFocus,
    Filter,
    ColumnMenu,
    ToggleSort,
    ToggleSelection,
    RowActions,
    Download,
    Help,
    Enter,
    Exit,
    RawKey(KeyEvent),
    FetchFinished(FetchOutcome),
}

pub const HELP_TEXT: &str = "\
Keys
  q          quit
  Tab        switch focus between selector and table
  1 / 2      show posts / comments
  r          fetch the current category again
  Enter      submit selector, open row actions in the table
  /          filter by title or name (Esc clears)
  c          column visibility menu
  s          sort the current column (asc, desc, off)
  ← / →      move between columns
  ↑ / ↓      move between rows
  n / p      next / previous page
  space      select or unselect the current row
  a          row actions (copy id, copy title/name)
  d          download the current dataset as json
  ?          this help
  Esc        close popups";
