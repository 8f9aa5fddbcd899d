use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::columns::{ColumnKind, RowAction, build_columns};
use crate::domain::{CVConfig, CVError, Category, Dataset, HELP_TEXT, Message, Record};
use crate::export;
use crate::fetcher::{ContentSource, FetchOutcome, FetchWorker};
use crate::inputter::{InputResult, Inputter};
use crate::table::{SortDirection, Table, TableAction};

pub const NO_DATA_TITLE: &str = "No data available to download";
pub const NO_DATA_DESCRIPTION: &str = "Please fetch some data before downloading.";
pub const SUBMIT_TITLE: &str = "You submitted the following values:";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
    IDLE,
    LOADING,
    LOADED,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    SELECTOR,
    TABLE,
    FILTERINPUT,
    COLUMNMENU,
    ROWACTIONS,
    POPUP,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub created: Instant,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub fill: bool,
    pub data: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MenuItem {
    pub label: String,
    pub checked: Option<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PopupView {
    Help(String),
    Menu {
        title: String,
        items: Vec<MenuItem>,
        cursor: usize,
    },
}

/// Everything the UI needs to draw one frame.
pub struct UIData {
    pub category: Category,
    pub selector_focused: bool,
    pub status: Status,
    pub has_data: bool,
    pub error: Option<String>,
    pub table: Vec<ColumnView>,
    pub selected_rows: Vec<bool>,
    pub selected_row: usize,
    pub selected_column: usize,
    pub nrows: usize,
    pub total_rows: usize,
    pub nselected: usize,
    pub page_index: usize,
    pub page_count: usize,
    pub can_previous_page: bool,
    pub can_next_page: bool,
    pub filter_text: String,
    pub cmdinput: InputResult,
    pub active_cmdinput: bool,
    pub popup: Option<PopupView>,
    pub notification: Option<Notification>,
    pub status_message: String,
}

/// The view shell. Owns the selected category, the loaded dataset and the
/// table built on top of it, and reacts to [`Message`]s.
pub struct Model {
    config: CVConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    category: Category,
    dataset: Option<Dataset>,
    table: Option<Table>,
    fetch_error: Option<String>,
    worker: FetchWorker,
    cursor_row: usize,
    cursor_column: usize,
    menu_cursor: usize,
    input: Inputter,
    last_input: InputResult,
    notification: Option<Notification>,
    status_message: String,
    clipboard: Option<Clipboard>,
}

impl Model {
    pub fn init(config: &CVConfig, source: Arc<dyn ContentSource>) -> Self {
        Self {
            config: config.clone(),
            status: Status::IDLE,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            category: config.category,
            dataset: None,
            table: None,
            fetch_error: None,
            worker: FetchWorker::new(source),
            cursor_row: 0,
            cursor_column: 0,
            menu_cursor: 0,
            input: Inputter::default(),
            last_input: InputResult::default(),
            notification: None,
            status_message: "Started cview!".to_string(),
            clipboard: None,
        }
    }

    /// Fetch the configured start category.
    pub fn load(&mut self) {
        self.start_fetch();
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn fetch_error(&self) -> Option<&str> {
        self.fetch_error.as_deref()
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::FILTERINPUT
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    /// Apply every fetch that finished since the last call.
    pub fn poll_fetches(&mut self) {
        while let Some(outcome) = self.worker.poll() {
            self.fetch_finished(outcome);
        }
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), CVError> {
        self.expire_notification();

        let Some(msg) = message else {
            return Ok(());
        };
        match msg {
            Message::Quit => self.quit(),
            Message::FetchFinished(outcome) => self.fetch_finished(outcome),
            Message::RawKey(key) => self.raw_input(key),
            msg => match self.modus {
                Modus::SELECTOR => match msg {
                    Message::MoveUp | Message::MoveLeft | Message::MoveDown | Message::MoveRight => {
                        self.select_category(self.category.next())
                    }
                    Message::Enter => self.submit(),
                    msg => self.handle_common(msg),
                },
                Modus::TABLE => match msg {
                    Message::MoveUp => self.move_cursor_up(),
                    Message::MoveDown => self.move_cursor_down(),
                    Message::MoveLeft => self.cursor_column = self.cursor_column.saturating_sub(1),
                    Message::MoveRight => self.move_cursor_right(),
                    Message::NextPage => self.apply(TableAction::NextPage),
                    Message::PreviousPage => self.apply(TableAction::PreviousPage),
                    Message::ToggleSort => self.toggle_sort(),
                    Message::ToggleSelection => self.toggle_selection(),
                    Message::Enter | Message::RowActions => self.open_row_actions(),
                    Message::Filter => self.enter_filter_mode(),
                    Message::ColumnMenu => self.open_menu(Modus::COLUMNMENU),
                    msg => self.handle_common(msg),
                },
                Modus::COLUMNMENU | Modus::ROWACTIONS => match msg {
                    Message::MoveUp => self.menu_cursor = self.menu_cursor.saturating_sub(1),
                    Message::MoveDown => {
                        self.menu_cursor = (self.menu_cursor + 1).min(self.menu_len().saturating_sub(1))
                    }
                    Message::Enter | Message::ToggleSelection => self.menu_enter(),
                    Message::Exit => self.close_popup(),
                    _ => (),
                },
                Modus::POPUP => {
                    if let Message::Exit | Message::Help | Message::Enter = msg {
                        self.close_popup()
                    }
                }
                Modus::FILTERINPUT => (),
            },
        }
        Ok(())
    }

    // Messages that behave the same on the selector and the table.
    fn handle_common(&mut self, msg: Message) {
        match msg {
            Message::SelectCategory(c) => self.select_category(c),
            Message::Reload => self.start_fetch(),
            Message::ToggleFocus => {
                self.modus = match self.modus {
                    Modus::SELECTOR => Modus::TABLE,
                    _ => Modus::SELECTOR,
                }
            }
            Message::Download => self.download(),
            Message::Help => self.open_popup(),
            Message::Exit => self.notification = None,
            _ => (),
        }
    }

    // -------------------- Fetching ---------------------- //

    /// Switch to `category` and fetch it. Selecting the category that is
    /// already shown does nothing.
    pub fn select_category(&mut self, category: Category) {
        if category == self.category && self.status != Status::IDLE {
            return;
        }
        self.category = category;
        self.start_fetch();
    }

    fn start_fetch(&mut self) {
        // The previous dataset is gone as soon as a new fetch starts.
        self.dataset = None;
        self.table = None;
        self.fetch_error = None;
        self.cursor_row = 0;
        self.cursor_column = 0;
        self.status = Status::LOADING;
        let request_id = self.worker.request(self.category);
        info!("Fetching {} (request #{request_id})", self.category);
        self.set_status_message(format!("Loading {} ...", self.category));
    }

    /// Apply a finished fetch. Outcomes of requests that were superseded by
    /// a later one are dropped.
    pub fn fetch_finished(&mut self, outcome: FetchOutcome) {
        let latest = self.worker.last_request();
        if outcome.request_id != latest || self.status != Status::LOADING {
            debug!(
                "Dropping stale fetch #{} for {} (latest #{latest})",
                outcome.request_id, outcome.category
            );
            return;
        }

        self.status = Status::LOADED;
        match outcome.result {
            Ok(records) => {
                let dataset = Dataset::new(outcome.category, records);
                self.table = Some(Table::new(
                    Arc::clone(&dataset.records),
                    build_columns(dataset.category),
                    self.config.page_size,
                ));
                self.set_status_message(format!("Loaded {} {}", dataset.len(), dataset.category));
                self.dataset = Some(dataset);
            }
            Err(e) => {
                error!("Error fetching {}: {e}", outcome.category);
                self.fetch_error = Some(format!("Could not load {}: {e}", outcome.category));
                self.set_status_message(format!("Loading {} failed", outcome.category));
            }
        }
    }

    // -------------------- Table ---------------------- //

    fn apply(&mut self, action: TableAction) {
        if let Some(table) = &self.table {
            trace!("Table action {action:?}");
            self.table = Some(table.apply(action));
            self.clamp_cursor();
        }
    }

    fn clamp_cursor(&mut self) {
        if let Some(table) = &self.table {
            self.cursor_row = self
                .cursor_row
                .min(table.page_rows().len().saturating_sub(1));
            self.cursor_column = self
                .cursor_column
                .min(table.visible_columns().len().saturating_sub(1));
        }
    }

    fn current_record(&self) -> Option<&Record> {
        self.table
            .as_ref()
            .and_then(|t| t.page_rows().get(self.cursor_row).copied())
    }

    fn move_cursor_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
        } else if self.table.as_ref().is_some_and(Table::can_previous_page) {
            self.apply(TableAction::PreviousPage);
            self.cursor_row = self.config.page_size.saturating_sub(1);
            self.clamp_cursor();
        }
    }

    fn move_cursor_down(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        if self.cursor_row + 1 < table.page_rows().len() {
            self.cursor_row += 1;
        } else if table.can_next_page() {
            self.apply(TableAction::NextPage);
            self.cursor_row = 0;
        }
    }

    fn move_cursor_right(&mut self) {
        self.cursor_column += 1;
        self.clamp_cursor();
    }

    fn toggle_sort(&mut self) {
        let Some(column) = self
            .table
            .as_ref()
            .and_then(|t| t.visible_columns().get(self.cursor_column).copied().cloned())
        else {
            return;
        };
        if !column.is_sortable() {
            self.set_status_message(format!("Column \"{}\" cannot be sorted", column.id));
            return;
        }
        self.apply(TableAction::ToggleSort(column.id.to_string()));
        let sorting = self.table.as_ref().and_then(|t| t.state().sorting.clone());
        let message = match sorting {
            Some(s) => format!("Sorted by {} {:?}", s.column, s.direction),
            None => "Sorting cleared".to_string(),
        };
        self.set_status_message(message);
    }

    fn toggle_selection(&mut self) {
        if let Some(id) = self.current_record().map(Record::id) {
            self.apply(TableAction::ToggleRowSelection(id));
        }
    }

    // -------------------- Filter input ---------------------- //

    fn enter_filter_mode(&mut self) {
        if self.table.is_none() {
            return;
        }
        trace!("Entering filter mode ...");
        let current = self
            .table
            .as_ref()
            .map(|t| t.state().filter_text.clone())
            .unwrap_or_default();
        self.previous_modus = self.modus;
        self.modus = Modus::FILTERINPUT;
        self.input.set(&current);
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if self.modus != Modus::FILTERINPUT {
            return;
        }
        self.last_input = self.input.read(key);
        // Filter live while typing.
        let text = self.last_input.input.clone();
        if self.table.as_ref().map(|t| t.state().filter_text != text) == Some(true) {
            self.apply(TableAction::SetFilterText(text));
        }
        if self.last_input.finished {
            trace!(
                "Filter input finished: {:?} (canceled: {})",
                self.last_input.input, self.last_input.canceled
            );
            self.modus = self.previous_modus;
            self.previous_modus = Modus::FILTERINPUT;
            if let Some(table) = &self.table {
                let n = table.row_count();
                self.set_status_message(format!("{n} matching rows"));
            }
        }
    }

    // -------------------- Menus and popups ---------------------- //

    fn open_menu(&mut self, modus: Modus) {
        if self.table.is_none() {
            return;
        }
        self.previous_modus = self.modus;
        self.modus = modus;
        self.menu_cursor = 0;
    }

    fn open_row_actions(&mut self) {
        if self.current_record().is_some() {
            self.open_menu(Modus::ROWACTIONS);
        }
    }

    fn open_popup(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
    }

    fn menu_len(&self) -> usize {
        match self.modus {
            Modus::COLUMNMENU => self.table.as_ref().map(|t| t.columns().len()).unwrap_or(0),
            Modus::ROWACTIONS => RowAction::ALL.len(),
            _ => 0,
        }
    }

    fn menu_enter(&mut self) {
        match self.modus {
            Modus::COLUMNMENU => {
                let column = self
                    .table
                    .as_ref()
                    .and_then(|t| t.columns().all().get(self.menu_cursor))
                    .map(|c| c.id.to_string());
                if let Some(column) = column {
                    self.apply(TableAction::ToggleColumn(column));
                }
            }
            Modus::ROWACTIONS => {
                let action = RowAction::ALL[self.menu_cursor.min(RowAction::ALL.len() - 1)];
                if let Some(text) = self.action_text(action) {
                    self.copy_to_clipboard(text);
                }
                self.close_popup();
            }
            _ => (),
        }
    }

    /// Text `action` produces for the row under the cursor.
    pub fn action_text(&self, action: RowAction) -> Option<String> {
        self.current_record().map(|r| action.text_for(r))
    }

    fn copy_to_clipboard(&mut self, text: String) {
        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => warn!("No clipboard available: {e:?}"),
            }
        }
        let result = match self.clipboard.as_mut() {
            Some(clipboard) => clipboard.set_text(text.clone()).map_err(CVError::from),
            None => Err(CVError::ClipboardError(arboard::Error::ClipboardNotSupported)),
        };
        match result {
            Ok(_) => {
                trace!("Copied {text:?} to clipboard.");
                self.set_status_message(format!("Copied \"{text}\""));
            }
            Err(e) => {
                trace!("Error copying to clipboard: {:?}", e);
                self.notify("Copy failed", e.to_string());
            }
        }
    }

    // -------------------- Download, submit and notifications ---------------------- //

    fn download(&mut self) {
        match export::export_dataset(self.dataset.as_ref(), &self.config.export_dir) {
            Ok(path) => self.set_status_message(format!("Saved {}", path.display())),
            Err(CVError::NoDataToExport) => self.notify(NO_DATA_TITLE, NO_DATA_DESCRIPTION),
            Err(e) => {
                error!("Export failed: {e}");
                self.notify("Download failed", e.to_string());
            }
        }
    }

    // Echo of the selector form as pretty json.
    fn submit(&mut self) {
        let values = serde_json::json!({ "content_type": self.category.path() });
        let description =
            serde_json::to_string_pretty(&values).unwrap_or_else(|_| values.to_string());
        self.notify(SUBMIT_TITLE, description);
    }

    fn notify(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.notification = Some(Notification {
            title: title.into(),
            description: description.into(),
            created: Instant::now(),
        });
    }

    fn expire_notification(&mut self) {
        if self
            .notification
            .as_ref()
            .is_some_and(|n| n.created.elapsed() > self.config.notification_ttl)
        {
            self.notification = None;
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    // -------------------- UI data ---------------------- //

    pub fn get_uidata(&self) -> UIData {
        let mut uidata = UIData {
            category: self.category,
            selector_focused: self.modus == Modus::SELECTOR,
            status: self.status,
            has_data: self.table.is_some(),
            error: self.fetch_error.clone(),
            table: Vec::new(),
            selected_rows: Vec::new(),
            selected_row: self.cursor_row,
            selected_column: self.cursor_column,
            nrows: 0,
            total_rows: 0,
            nselected: 0,
            page_index: 0,
            page_count: 0,
            can_previous_page: false,
            can_next_page: false,
            filter_text: String::new(),
            cmdinput: self.last_input.clone(),
            active_cmdinput: self.modus == Modus::FILTERINPUT,
            popup: self.popup_view(),
            notification: self.notification.clone(),
            status_message: self.status_message.clone(),
        };

        if let Some(table) = &self.table {
            let state = table.state();
            let rows = table.page_rows();
            uidata.table = table
                .visible_columns()
                .into_iter()
                .map(|column| {
                    let data: Vec<String> = rows.iter().map(|r| column.cell(r)).collect();
                    let mut name = column.header.to_string();
                    if let Some(s) = state.sorting.as_ref().filter(|s| s.column == column.id) {
                        name.push_str(match s.direction {
                            SortDirection::Ascending => " ▲",
                            SortDirection::Descending => " ▼",
                        });
                    }
                    let width = data
                        .iter()
                        .map(|d| d.chars().count())
                        .chain(std::iter::once(name.chars().count()))
                        .max()
                        .unwrap_or(0);
                    ColumnView {
                        name,
                        width,
                        fill: matches!(column.kind, ColumnKind::Title | ColumnKind::Name),
                        data,
                    }
                })
                .collect();
            uidata.selected_rows = rows.iter().map(|r| state.is_selected(r.id())).collect();
            uidata.nrows = table.row_count();
            uidata.total_rows = table.records().len();
            uidata.nselected = state.selected.len();
            uidata.page_index = state.page_index;
            uidata.page_count = table.page_count();
            uidata.can_previous_page = table.can_previous_page();
            uidata.can_next_page = table.can_next_page();
            uidata.filter_text = state.filter_text.clone();
        }
        uidata
    }

    fn popup_view(&self) -> Option<PopupView> {
        match self.modus {
            Modus::POPUP => Some(PopupView::Help(HELP_TEXT.to_string())),
            Modus::COLUMNMENU => self.table.as_ref().map(|t| PopupView::Menu {
                title: "Columns".to_string(),
                items: t
                    .columns()
                    .all()
                    .iter()
                    .map(|c| MenuItem {
                        label: c.id.to_string(),
                        checked: Some(t.state().is_visible(c.id)),
                    })
                    .collect(),
                cursor: self.menu_cursor,
            }),
            Modus::ROWACTIONS => Some(PopupView::Menu {
                title: "Actions".to_string(),
                items: RowAction::ALL
                    .iter()
                    .map(|a| MenuItem {
                        label: a.title().to_string(),
                        checked: None,
                    })
                    .collect(),
                cursor: self.menu_cursor,
            }),
            _ => None,
        }
    }
}
