use std::env;
use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Wrap};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{fetch_customers, insert_customer};
use crate::error::LedgerError;
use crate::import::import_file;
use crate::payment::{apply_payment, ensure_customers};
use crate::report::{export_html, format_amount, render_table};

use super::forms::{CustomerField, CustomerForm, PaymentField, PaymentForm, PaymentOutcome};
use super::helpers::{centered_rect, offset_index, surface_error};
use super::screens::{CustomerList, FilePicker, MenuItem, ReportScreen};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows taken by the table border and header in the customer list.
const TABLE_CHROME_HEIGHT: u16 = 3;

/// High-level navigation states.
enum Screen {
    Menu,
    Import(FilePicker),
    Customers(CustomerList),
    Report(ReportScreen),
}

/// Modal overlays scoped to the current screen.
enum Mode {
    Normal,
    AddingCustomer(CustomerForm),
    Paying(PaymentForm),
    PaymentResult(PaymentOutcome),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Warning,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Warning => Style::default().fg(Color::Yellow),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    config: Config,
    selected: usize,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(conn: Connection, config: Config) -> Self {
        Self {
            conn,
            config,
            selected: 0,
            screen: Screen::Menu,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Process one key press. Returns `true` once the user asked to leave.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingCustomer(form) => self.handle_add_customer(code, form)?,
            Mode::Paying(form) => self.handle_payment(code, form)?,
            Mode::PaymentResult(outcome) => match code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(_) => Mode::Normal,
                _ => Mode::PaymentResult(outcome),
            },
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match self.screen {
            Screen::Menu => match code {
                KeyCode::Char('q') | KeyCode::Esc => *exit = true,
                KeyCode::Up => self.move_menu(-1),
                KeyCode::Down => self.move_menu(1),
                KeyCode::Home => self.selected = 0,
                KeyCode::End => self.selected = MenuItem::ALL.len() - 1,
                KeyCode::Enter => {
                    let item = MenuItem::ALL[self.selected];
                    return self.dispatch(item, exit);
                }
                KeyCode::Char(ch) => match MenuItem::from_key(ch) {
                    Some(item) => {
                        self.selected = MenuItem::ALL
                            .iter()
                            .position(|candidate| *candidate == item)
                            .unwrap_or(0);
                        return self.dispatch(item, exit);
                    }
                    None => self.set_status(
                        format!("Invalid option '{ch}'. Choose 1-6."),
                        StatusKind::Warning,
                    ),
                },
                _ => {}
            },
            Screen::Import(ref mut picker) => {
                let mut chosen = None;
                let mut cancelled = false;
                let mut failure = None;
                match code {
                    KeyCode::Char('q') => *exit = true,
                    KeyCode::Esc => cancelled = true,
                    KeyCode::Up => picker.move_selection(-1),
                    KeyCode::Down => picker.move_selection(1),
                    KeyCode::PageUp => picker.move_selection(-10),
                    KeyCode::PageDown => picker.move_selection(10),
                    KeyCode::Home => picker.select_first(),
                    KeyCode::End => picker.select_last(),
                    KeyCode::Backspace | KeyCode::Left => {
                        if let Err(err) = picker.leave() {
                            failure = Some(surface_error(&err));
                        }
                    }
                    KeyCode::Enter => {
                        if let Some(entry) = picker.current().cloned() {
                            if entry.is_dir {
                                if let Err(err) = picker.enter(&entry.path) {
                                    failure = Some(surface_error(&err));
                                }
                            } else {
                                chosen = Some(entry.path);
                            }
                        }
                    }
                    _ => {}
                }

                if let Some(message) = failure {
                    self.set_status(message, StatusKind::Error);
                } else if cancelled {
                    self.screen = Screen::Menu;
                    self.report(LedgerError::NoFileSelected)?;
                } else if let Some(path) = chosen {
                    self.screen = Screen::Menu;
                    match import_file(&self.conn, &path) {
                        Ok(summary) => self.set_status(
                            format!(
                                "Imported {} customer(s) from {}.",
                                summary.inserted,
                                summary.source.display()
                            ),
                            StatusKind::Info,
                        ),
                        Err(err) => self.report(err)?,
                    }
                }
            }
            Screen::Customers(ref mut list) => match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Esc | KeyCode::Enter => self.back_to_menu(),
                KeyCode::Up => list.move_selection(-1),
                KeyCode::Down => list.move_selection(1),
                KeyCode::PageUp => list.move_selection(-10),
                KeyCode::PageDown => list.move_selection(10),
                KeyCode::Home => list.select_first(),
                KeyCode::End => list.select_last(),
                _ => {}
            },
            Screen::Report(ref mut report) => match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Esc | KeyCode::Enter => self.back_to_menu(),
                KeyCode::Up => report.scroll_by(-1),
                KeyCode::Down => report.scroll_by(1),
                KeyCode::PageUp => report.scroll_by(-10),
                KeyCode::PageDown => report.scroll_by(10),
                KeyCode::Char('o') | KeyCode::Char('O') => {
                    let path = report.export_path.clone();
                    match open_link(&path) {
                        Ok(()) => self.set_status(
                            format!("Opened {}.", path.display()),
                            StatusKind::Info,
                        ),
                        Err(err) => self.set_status(
                            format!("Failed to open report: {err}"),
                            StatusKind::Error,
                        ),
                    }
                }
                _ => {}
            },
        }
        Ok(Mode::Normal)
    }

    /// Run the action behind a menu entry.
    fn dispatch(&mut self, item: MenuItem, exit: &mut bool) -> Result<Mode> {
        self.clear_status();
        match item {
            MenuItem::Import => self.open_import(),
            MenuItem::Add => return Ok(Mode::AddingCustomer(CustomerForm::default())),
            MenuItem::Pay => match ensure_customers(&self.conn) {
                Ok(_) => return Ok(Mode::Paying(PaymentForm::default())),
                Err(err) => self.report(err)?,
            },
            MenuItem::List => self.open_customer_list()?,
            MenuItem::Report => self.open_report()?,
            MenuItem::Exit => *exit = true,
        }
        Ok(Mode::Normal)
    }

    fn handle_add_customer(&mut self, code: KeyCode, mut form: CustomerForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Add customer cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_customer(&form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(LedgerError::Storage(err)) => return Err(err),
                Err(err) => {
                    let message = err.to_string();
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::AddingCustomer(form))
    }

    fn handle_payment(&mut self, code: KeyCode, mut form: PaymentForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Payment cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let (customer_id, amount) = match form.parse_inputs() {
                    Ok(inputs) => inputs,
                    Err(err) => {
                        form.error = Some(err.to_string());
                        return Ok(Mode::Paying(form));
                    }
                };
                let outcome = match apply_payment(&mut self.conn, customer_id, amount) {
                    Ok(receipt) => {
                        self.set_status(
                            format!(
                                "Payment of {} applied for {}.",
                                format_amount(receipt.amount),
                                receipt.name
                            ),
                            StatusKind::Info,
                        );
                        PaymentOutcome::Applied(receipt)
                    }
                    Err(LedgerError::Storage(err)) => return Err(err),
                    Err(err) => {
                        self.set_status(err.to_string(), StatusKind::Error);
                        PaymentOutcome::Refused(err.to_string())
                    }
                };
                return Ok(Mode::PaymentResult(outcome));
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::Paying(form))
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Menu => self.draw_menu(frame, content_area),
            Screen::Import(picker) => self.draw_file_picker(frame, content_area, picker),
            Screen::Customers(list) => self.draw_customer_list(frame, content_area, list),
            Screen::Report(report) => self.draw_report(frame, content_area, report),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingCustomer(form) => self.draw_customer_form(frame, area, form),
            Mode::Paying(form) => self.draw_payment_form(frame, area, form),
            Mode::PaymentResult(outcome) => self.draw_payment_result(frame, area, outcome),
            Mode::Normal => {}
        }
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(50, 60, area);
        let block = Block::default()
            .title("Current Account System")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL);

        let items: Vec<ListItem> = MenuItem::ALL
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let text = format!("{}. {}", item.key(), item.label());
                let style = if idx == self.selected {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(text, style)))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), popup_area);
    }

    fn draw_file_picker(&self, frame: &mut Frame, area: Rect, picker: &FilePicker) {
        let block = Block::default()
            .title(format!("Select XML file - {}", picker.dir.display()))
            .borders(Borders::ALL);
        let inner_height = block.inner(area).height as usize;
        let offset = (picker.selected + 1).saturating_sub(inner_height.max(1));

        let items: Vec<ListItem> = if picker.entries.is_empty() {
            vec![ListItem::new(Span::styled(
                "No XML files here.",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            picker
                .entries
                .iter()
                .enumerate()
                .skip(offset)
                .map(|(idx, entry)| {
                    let mut style = if entry.is_dir {
                        Style::default().fg(Color::Blue)
                    } else {
                        Style::default()
                    };
                    if idx == picker.selected {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    ListItem::new(Span::styled(entry.label.clone(), style))
                })
                .collect()
        };

        frame.render_widget(List::new(items).block(block), area);
    }

    fn draw_customer_list(&self, frame: &mut Frame, area: Rect, list: &CustomerList) {
        let visible = area.height.saturating_sub(TABLE_CHROME_HEIGHT) as usize;
        let offset = list.scroll_offset(visible);

        let header = Row::new(["ID", "Name", "Balance", "Debt"]).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        let rows: Vec<Row> = list
            .customers
            .iter()
            .enumerate()
            .skip(offset)
            .map(|(idx, customer)| {
                let row = Row::new(vec![
                    Cell::from(customer.id.to_string()),
                    Cell::from(customer.name.clone()),
                    Cell::from(Line::from(format_amount(customer.balance)).alignment(Alignment::Right)),
                    Cell::from(Line::from(format_amount(customer.debt)).alignment(Alignment::Right)),
                ]);
                if idx == list.selected {
                    row.style(Style::default().add_modifier(Modifier::REVERSED))
                } else {
                    row
                }
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Min(12),
                Constraint::Length(14),
                Constraint::Length(14),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(format!("Customers ({})", list.customers.len()))
                .borders(Borders::ALL),
        );

        frame.render_widget(table, area);
    }

    fn draw_report(&self, frame: &mut Frame, area: Rect, report: &ReportScreen) {
        let block = Block::default()
            .title(format!(
                "Customer report - saved to {}",
                report.export_path.display()
            ))
            .borders(Borders::ALL);
        let paragraph = Paragraph::new(report.table.clone())
            .block(block)
            .scroll((report.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let pairs: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::AddingCustomer(_)) | (_, Mode::Paying(_)) => {
                &[("[Tab]", " Next field   "), ("[Enter]", " Save   "), ("[Esc]", " Cancel")]
            }
            (_, Mode::PaymentResult(_)) => &[("[Enter]", " Close")],
            (Screen::Menu, _) => &[
                ("[1-6]", " Choose   "),
                ("[↑↓]", " Navigate   "),
                ("[Enter]", " Select   "),
                ("[q]", " Quit"),
            ],
            (Screen::Import(_), _) => &[
                ("[↑↓]", " Navigate   "),
                ("[Enter]", " Open/Import   "),
                ("[Backspace]", " Up   "),
                ("[Esc]", " Cancel"),
            ],
            (Screen::Customers(_), _) => &[("[↑↓]", " Scroll   "), ("[Esc]", " Menu")],
            (Screen::Report(_), _) => &[
                ("[↑↓]", " Scroll   "),
                ("[o]", " Open HTML   "),
                ("[Esc]", " Menu"),
            ],
        };

        let spans: Vec<Span<'static>> = pairs
            .iter()
            .flat_map(|(key, text)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(text.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_customer_form(&self, frame: &mut Frame, area: Rect, form: &CustomerForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Customer").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line(CustomerField::Name),
            form.build_line(CustomerField::Balance),
            form.build_line(CustomerField::Debt),
            Line::from(""),
        ];
        lines.push(form_hint(form.error.as_deref()));

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        frame.set_cursor_position((
            inner.x + form.cursor_column(),
            inner.y + form.active.row(),
        ));
    }

    fn draw_payment_form(&self, frame: &mut Frame, area: Rect, form: &PaymentForm) {
        let popup_area = centered_rect(60, 35, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Apply Payment").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            form.build_line(PaymentField::CustomerId),
            form.build_line(PaymentField::Amount),
            Line::from(""),
            form_hint(form.error.as_deref()),
        ];

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        frame.set_cursor_position((
            inner.x + form.cursor_column(),
            inner.y + form.active.row(),
        ));
    }

    fn draw_payment_result(&self, frame: &mut Frame, area: Rect, outcome: &PaymentOutcome) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let (title, lines) = match outcome {
            PaymentOutcome::Applied(receipt) => (
                "Payment Applied",
                vec![
                    Line::from(format!(
                        "Payment of {} applied for {}.",
                        format_amount(receipt.amount),
                        receipt.name
                    )),
                    Line::from(format!("Debt on record: {}", format_amount(receipt.debt))),
                    Line::from(format!("Amount paid: {}", format_amount(receipt.amount))),
                    Line::from(format!(
                        "Remaining balance for {}: {}",
                        receipt.name,
                        format_amount(receipt.new_balance)
                    )),
                ],
            ),
            PaymentOutcome::Refused(message) => (
                "Payment Refused",
                vec![Line::from(Span::styled(
                    message.clone(),
                    Style::default().fg(Color::Red),
                ))],
            ),
        };

        let block = Block::default().title(title).borders(Borders::ALL);
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    /// Show a recoverable ledger error in the footer; storage failures end the
    /// session.
    fn report(&mut self, err: LedgerError) -> Result<()> {
        match err {
            LedgerError::Storage(inner) => Err(inner),
            LedgerError::NoFileSelected | LedgerError::EmptyLedger => {
                self.set_status(err.to_string(), StatusKind::Warning);
                Ok(())
            }
            other => {
                warn!(error = %other, "operation failed");
                self.set_status(other.to_string(), StatusKind::Error);
                Ok(())
            }
        }
    }

    fn back_to_menu(&mut self) {
        self.clear_status();
        self.screen = Screen::Menu;
    }

    fn move_menu(&mut self, offset: isize) {
        self.selected = offset_index(self.selected, offset, MenuItem::ALL.len());
    }

    fn open_import(&mut self) {
        let start = self
            .config
            .db_path
            .parent()
            .map(|dir| dir.to_path_buf())
            .filter(|dir| dir.is_dir())
            .or_else(|| env::current_dir().ok());
        let Some(start) = start else {
            self.set_status("Could not determine a directory to browse.", StatusKind::Error);
            return;
        };
        match FilePicker::open(&start) {
            Ok(picker) => self.screen = Screen::Import(picker),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn save_new_customer(&mut self, form: &CustomerForm) -> Result<(), LedgerError> {
        let draft = form.parse_inputs()?;
        let customer = insert_customer(&self.conn, &draft)?;
        info!(id = customer.id, name = %customer.name, "customer added");
        self.set_status(
            format!(
                "Customer {} added (id {}) with balance {} and debt {}.",
                customer.name,
                customer.id,
                format_amount(customer.balance),
                format_amount(customer.debt)
            ),
            StatusKind::Info,
        );
        Ok(())
    }

    fn open_customer_list(&mut self) -> Result<()> {
        if let Err(err) = ensure_customers(&self.conn) {
            return self.report(err);
        }
        let customers = fetch_customers(&self.conn)?;
        self.screen = Screen::Customers(CustomerList::new(customers));
        Ok(())
    }

    fn open_report(&mut self) -> Result<()> {
        if let Err(err) = ensure_customers(&self.conn) {
            return self.report(err);
        }
        let customers = fetch_customers(&self.conn)?;
        let export_path = self.config.export_path.clone();
        if let Err(err) = export_html(&customers, &export_path) {
            self.set_status(surface_error(&err), StatusKind::Error);
            return Ok(());
        }
        self.screen = Screen::Report(ReportScreen::new(render_table(&customers), export_path));
        self.set_status(
            format!(
                "Listing saved to {}.",
                self.config.export_path.display()
            ),
            StatusKind::Info,
        );
        Ok(())
    }
}

/// Error text when validation failed, otherwise the key hints.
fn form_hint(error: Option<&str>) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            "Enter to save • Tab to switch • Esc to cancel",
            Style::default().fg(Color::Gray),
        )),
    }
}
