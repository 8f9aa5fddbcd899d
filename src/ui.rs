use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use crate::domain::Category;
use crate::model::{Model, PopupView, Status, UIData};

pub const TITLE: &str = " Dynamic Content Manager ";
pub const SELECTOR_HEIGHT: u16 = 3;
pub const FILTER_HEIGHT: u16 = 1;
pub const FOOTER_HEIGHT: u16 = 1;
pub const STATUSLINE_HEIGHT: u16 = 1;
pub const SELECTION_MARKER_WIDTH: u16 = 2;
pub const NOTIFICATION_WIDTH: u16 = 44;

const FOCUS_COLOR: Color = Color::Blue;
const SELECTED_ROW_STYLE: Style = Style::new().add_modifier(Modifier::REVERSED);

#[derive(Default)]
pub struct TableUI {
    table_state: TableState,
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let outer = Block::bordered()
            .title(Line::from(TITLE.bold()).centered())
            .title_bottom(Line::from(vec![" Help ".into(), "<?> ".blue().bold()]).centered())
            .border_set(border::THICK);
        let inner = outer.inner(frame.area());
        frame.render_widget(outer, frame.area());

        let [selector, filter, table, footer, statusline] = Layout::vertical([
            Constraint::Length(SELECTOR_HEIGHT),
            Constraint::Length(FILTER_HEIGHT),
            Constraint::Fill(1),
            Constraint::Length(FOOTER_HEIGHT),
            Constraint::Length(STATUSLINE_HEIGHT),
        ])
        .areas(inner);

        self.draw_selector(&uidata, frame, selector);
        self.draw_filter(&uidata, frame, filter);
        self.draw_table(&uidata, frame, table);
        self.draw_footer(&uidata, frame, footer);
        frame.render_widget(Paragraph::new(uidata.status_message.clone().dim()), statusline);

        if let Some(popup) = &uidata.popup {
            self.draw_popup(popup, frame, inner);
        }
        if let Some(notification) = &uidata.notification {
            let mut text = vec![
                Line::from(notification.title.clone().bold()),
                Line::from(""),
            ];
            text.extend(Text::from(notification.description.clone()).lines);
            let height = (text.len() as u16 + 2).min(inner.height);
            let width = NOTIFICATION_WIDTH.min(inner.width);
            let area = Rect::new(inner.right() - width, inner.y, width, height);
            frame.render_widget(Clear, area);
            frame.render_widget(
                Paragraph::new(text)
                    .wrap(Wrap { trim: false })
                    .block(Block::bordered().title(" Esc ".dim())),
                area,
            );
        }
    }

    fn draw_selector(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::raw("Select Content Type: ")];
        for category in Category::ALL {
            let label = format!(" {} ", category.label());
            if category == uidata.category {
                spans.push(Span::styled(label, SELECTED_ROW_STYLE.add_modifier(Modifier::BOLD)));
            } else {
                spans.push(Span::raw(label));
            }
            spans.push(Span::raw(" "));
        }
        let mut block = Block::bordered().title(" Fetch Content ");
        if uidata.selector_focused {
            block = block.border_style(Style::new().fg(FOCUS_COLOR));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn draw_filter(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let [input, columns] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(14)]).areas(area);
        let line = if uidata.active_cmdinput {
            let prompt = "/";
            let pos = uidata.cmdinput.cursor_pos as u16 + prompt.len() as u16;
            frame.set_cursor_position(Position::new(
                (input.x + pos).min(input.right().saturating_sub(1)),
                input.y,
            ));
            Line::from(vec![prompt.blue().bold(), uidata.cmdinput.input.clone().into()])
        } else if uidata.filter_text.is_empty() {
            Line::from("Filter by title or name... </>".dim())
        } else {
            Line::from(vec!["Filter: ".dim(), uidata.filter_text.clone().yellow()])
        };
        frame.render_widget(Paragraph::new(line), input);
        frame.render_widget(
            Paragraph::new(Line::from("Columns <c>").right_aligned()),
            columns,
        );
    }

    fn draw_table(&mut self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let block = Block::bordered().title(" Displaying Content ");
        if uidata.status == Status::LOADING {
            frame.render_widget(Paragraph::new("loading data...").block(block), area);
            return;
        }
        if !uidata.has_data {
            let mut lines = vec![Line::from("No data.")];
            if let Some(error) = &uidata.error {
                lines.push(Line::from(error.clone().red()));
                lines.push(Line::from("Press <r> to try again.".dim()));
            }
            frame.render_widget(
                Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
                area,
            );
            return;
        }
        let nrows = uidata.table.first().map(|c| c.data.len()).unwrap_or(0);
        if nrows == 0 {
            frame.render_widget(Paragraph::new("No results.").centered().block(block), area);
            return;
        }

        let mut widths = vec![Constraint::Length(SELECTION_MARKER_WIDTH)];
        widths.extend(uidata.table.iter().map(|c| {
            if c.fill {
                Constraint::Fill(1)
            } else {
                Constraint::Length(c.width as u16)
            }
        }));

        let header = Row::new(
            std::iter::once(Cell::from(""))
                .chain(uidata.table.iter().enumerate().map(|(idx, c)| {
                    let cell = Cell::from(c.name.clone()).bold();
                    if idx == uidata.selected_column {
                        cell.underlined()
                    } else {
                        cell
                    }
                })),
        );

        let rows = (0..nrows).map(|ridx| {
            let marker = if uidata.selected_rows.get(ridx).copied().unwrap_or(false) {
                "✓"
            } else {
                ""
            };
            Row::new(
                std::iter::once(Cell::from(marker.green()))
                    .chain(uidata.table.iter().map(|c| Cell::from(c.data[ridx].clone()))),
            )
        });

        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(SELECTED_ROW_STYLE)
            .block(block);
        self.table_state.select(Some(uidata.selected_row));
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_footer(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let [info, buttons] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(40)]).areas(area);

        if uidata.has_data {
            let mut text = format!(
                "Page {}/{} · {} of {} rows",
                uidata.page_index + 1,
                uidata.page_count.max(1),
                uidata.nrows,
                uidata.total_rows
            );
            if uidata.nselected > 0 {
                text.push_str(&format!(" · {} selected", uidata.nselected));
            }
            frame.render_widget(Paragraph::new(text), info);
        }

        let button = |label: &'static str, enabled: bool| {
            if enabled {
                Span::styled(label, Style::new().add_modifier(Modifier::BOLD))
            } else {
                Span::styled(label, Style::new().add_modifier(Modifier::DIM))
            }
        };
        let line = Line::from(vec![
            button("< Previous", uidata.can_previous_page),
            "  ".into(),
            button("Next >", uidata.can_next_page),
            "  ".into(),
            "[d] Download".blue().bold(),
        ])
        .right_aligned();
        frame.render_widget(Paragraph::new(line), buttons);
    }

    fn draw_popup(&self, popup: &PopupView, frame: &mut Frame, area: Rect) {
        let (title, lines): (String, Vec<Line>) = match popup {
            PopupView::Help(text) => (" Help ".to_string(), Text::from(text.clone()).lines),
            PopupView::Menu {
                title,
                items,
                cursor,
            } => (
                format!(" {title} "),
                items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        let label = match item.checked {
                            Some(true) => format!("[x] {}", item.label),
                            Some(false) => format!("[ ] {}", item.label),
                            None => item.label.clone(),
                        };
                        if idx == *cursor {
                            Line::from(Span::styled(label, SELECTED_ROW_STYLE))
                        } else {
                            Line::from(label)
                        }
                    })
                    .collect(),
            ),
        };
        let width = lines
            .iter()
            .map(|l| l.width() as u16)
            .chain(std::iter::once(title.chars().count() as u16))
            .max()
            .unwrap_or(0)
            + 4;
        let area = popup_area(area, width, lines.len() as u16 + 2);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::bordered()
                    .title(title)
                    .border_style(Style::new().fg(FOCUS_COLOR)),
            ),
            area,
        );
    }
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CVConfig, Message, Post, Record};
    use crate::fetcher::{ContentSource, FetchError, FetchOutcome};
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;

    struct Unreachable;

    impl ContentSource for Unreachable {
        fn fetch(&self, _category: Category) -> Result<Vec<Record>, FetchError> {
            Err(FetchError::Status { status: 599 })
        }
    }

    fn render(model: &Model) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let mut ui = TableUI::new();
        terminal.draw(|f| ui.draw(model, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn loaded(records: Vec<Record>) -> Model {
        let mut model = Model::init(&CVConfig::default(), Arc::new(Unreachable));
        model.load();
        model.fetch_finished(FetchOutcome {
            request_id: 1,
            category: Category::Posts,
            result: Ok(records),
        });
        model
    }

    #[test]
    fn shows_loading_placeholder() {
        let mut model = Model::init(&CVConfig::default(), Arc::new(Unreachable));
        model.load();
        let screen = render(&model);
        assert!(screen.contains("loading data..."));
        assert!(screen.contains("Dynamic Content Manager"));
    }

    #[test]
    fn shows_rows_and_paging() {
        let model = loaded(vec![Record::Post(Post {
            author_id: Some(1),
            id: 1,
            title: Some("Hello".into()),
            body: Some("...".into()),
        })]);
        let screen = render(&model);
        assert!(screen.contains("Title"));
        assert!(screen.contains("Hello"));
        assert!(screen.contains("Page 1/1"));
    }

    #[test]
    fn shows_no_results_and_errors() {
        let model = loaded(Vec::new());
        assert!(render(&model).contains("No results."));

        let mut model = Model::init(&CVConfig::default(), Arc::new(Unreachable));
        model.load();
        model.fetch_finished(FetchOutcome {
            request_id: 1,
            category: Category::Posts,
            result: Err(FetchError::Status { status: 404 }),
        });
        let screen = render(&model);
        assert!(screen.contains("No data."));
        assert!(screen.contains("404"));
    }

    #[test]
    fn shows_notification() {
        let mut model = Model::init(&CVConfig::default(), Arc::new(Unreachable));
        model.update(Some(Message::Download)).unwrap();
        assert!(render(&model).contains("No data available to download"));
    }
}
