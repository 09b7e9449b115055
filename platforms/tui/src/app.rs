use action::Action;
use deltasheet::{
    Cursor, Delta, Direction as Move, Field, Key, MachineError, PresetManager, Region,
    RunMode, Simulator, StateRef, Step, Symbol,
};
use keymap::{Config, KeyMapConfig};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
    Frame,
};

const BLOCK_PADDING: Padding = Padding::new(1, 1, 0, 0);

/// Width of the state column of the sheet.
const STATE_WIDTH: u16 = 8;
/// Width of one output column of the sheet, separator included.
const SLOT_WIDTH: u16 = 11;
/// Width of one tape cell.
const TAPE_CELL_WIDTH: i32 = 4;
/// First sheet line drawn above row 0: the initial state, a spacer and the column header.
const SHEET_TOP_LINE: i64 = -3;

const BASE: Color = Color::Rgb(55, 36, 0);
const ACCENT: Color = Color::Rgb(238, 224, 197);

pub struct App {
    simulator: Simulator,
    pub(crate) keymap: Config<Action>,
    message: String,
    show_help: bool,
    hits: Vec<(Rect, Region)>,
    pointer: Option<(u16, u16)>,
    sheet_scroll: i64,
}

impl App {
    pub fn new(simulator: Simulator) -> Self {
        let info = simulator
            .preset()
            .and_then(|i| PresetManager::get_preset_info(i).ok());
        let message = match info {
            Some(info) => format!("Loaded preset: {}. Press 'h' for help.", info.name),
            None => "Press 'h' for help.".to_string(),
        };

        Self {
            simulator,
            keymap: Action::keymap_config(),
            message,
            show_help: false,
            hits: Vec::new(),
            pointer: None,
            sheet_scroll: 0,
        }
    }

    pub fn render(&mut self, f: &mut Frame) {
        self.hits.clear();
        let inner_area = f.area().inner(Margin::new(1, 0));

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header with switches
                Constraint::Min(8),    // Sheet
                Constraint::Length(4), // Current state display
                Constraint::Length(5), // Tape
                Constraint::Length(3), // Status
            ])
            .split(inner_area);

        self.render_header(f, main_chunks[0]);

        if self.show_help {
            self.render_help(f, main_chunks[1]);
        } else {
            self.render_sheet(f, main_chunks[1]);
        }

        self.render_display(f, main_chunks[2]);
        self.render_tape(f, main_chunks[3]);
        self.render_status(f, main_chunks[4]);

        // Regions move while the tape and sheet animate, so re-test the pointer every frame.
        self.refresh_hover();
    }

    fn render_header(&mut self, f: &mut Frame, area: Rect) {
        let outer = block("Turing Machine");
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let machine = self.simulator.machine();
        let executing = machine.is_executing();
        let title = if executing { "EXECUTING..." } else { "EXECUTE" };
        let switch = if executing { "[    ■]" } else { "[■    ]" };

        let switch_text = format!("{title} {switch}");
        let switch_width = switch_text.chars().count() as u16;
        let stop_text = "[ STOP ]";
        let stop_width = stop_text.len() as u16;

        let auto_play = match machine.run_mode() {
            RunMode::Auto => "ON",
            RunMode::Manual => "OFF",
        };
        let mode_text = format!("Mode: {} | Auto-play: {}", machine.mode().label(), auto_play);

        let buf = f.buffer_mut();
        buf.set_string(inner.x, inner.y, mode_text, Style::default().fg(BASE));

        let stop_x = inner.right().saturating_sub(stop_width);
        let switch_x = stop_x.saturating_sub(switch_width + 2);

        let switch_rect = Rect::new(switch_x, inner.y, switch_width, 1);
        let stop_rect = Rect::new(stop_x, inner.y, stop_width, 1);

        let switch_color = if executing { Color::Green } else { BASE };
        let switch_style = self.hover_style(Region::ExecuteSwitch).fg(switch_color);
        let stop_style = self
            .hover_style(Region::StopButton)
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD);

        buf.set_string(switch_x, inner.y, switch_text, switch_style);
        buf.set_string(stop_x, inner.y, stop_text, stop_style);

        self.hits.push((switch_rect, Region::ExecuteSwitch));
        self.hits.push((stop_rect, Region::StopButton));
    }

    fn render_sheet(&mut self, f: &mut Frame, area: Rect) {
        let machine = self.simulator.machine();
        let sheet = machine.sheet();
        let input_mode = machine.is_input_mode();

        let title = if input_mode {
            "Delta Sheet (editing)"
        } else {
            "Delta Sheet"
        };
        let outer = block(title);
        let inner = outer.inner(area);
        f.render_widget(outer, area);
        self.hits.push((inner, Region::Sheet));

        let center = inner.height as i64 / 2;
        // Maps a sheet line to a screen row relative to `inner.y`.
        let screen_row = |line: i64| -> i64 {
            if input_mode {
                line - SHEET_TOP_LINE - self.sheet_scroll
            } else {
                let focus = -sheet.offset() / sheet.row_height();
                center + (line as f32 - focus).round() as i64
            }
        };

        let mut canvas = Canvas {
            buf: f.buffer_mut(),
            area: inner,
            hits: Vec::new(),
            input_mode,
        };

        if !input_mode {
            // The reading window the active row scrolls into.
            canvas.fill(center, Style::default().bg(ACCENT));
        }

        let header = Style::default().fg(BASE).add_modifier(Modifier::BOLD);

        // Initial state selector.
        let y = screen_row(SHEET_TOP_LINE);
        canvas.put(1, y, "INIT STATE:", header, None);
        let initial = sheet.initial_state();
        let dec = Region::InitialState(Delta::Decrement);
        let inc = Region::InitialState(Delta::Increment);
        canvas.put(14, y, "‹", self.hover_style(dec), Some(dec));
        let stepper = format!("{:>2}›", initial.to_string());
        canvas.put(15, y, &stepper, self.hover_style(inc), Some(inc));

        let y = screen_row(SHEET_TOP_LINE + 1);
        canvas.put(1, y, &format!("STATES: {}", sheet.len()), header, None);

        let y = screen_row(SHEET_TOP_LINE + 2);
        canvas.put(1, y, "STATE", header, None);
        for symbol in Symbol::ALL {
            let x = STATE_WIDTH + symbol.index() as u16 * SLOT_WIDTH;
            canvas.put(x, y, "│", header, None);
            canvas.put(x + 3, y, &format!("S = {symbol}"), header, None);
        }

        let shutter = machine.shutter();
        let shutter_on = !input_mode && machine.is_executing();

        for row in sheet.rows() {
            let line = row.index() as i64;
            let y = screen_row(line);
            let label = Region::RowLabel(row.index());

            let active = !input_mode && sheet.cursor() == Cursor::Row(row.index());
            let mut label_style = Style::default().fg(BASE);
            if active {
                label_style = label_style.add_modifier(Modifier::BOLD);
            }
            if shutter_on && shutter.covers_state() {
                label_style = label_style.add_modifier(Modifier::DIM);
            }

            if input_mode && self.simulator.is_hovered(label) {
                canvas.put(1, y, "DELETE", label_style.fg(Color::Red), Some(label));
            } else {
                let text = format!("{:>3}", StateRef::State(row.index()).to_string());
                canvas.put(1, y, &text, label_style, Some(label));
            }

            for symbol in Symbol::ALL {
                let x = STATE_WIDTH + symbol.index() as u16 * SLOT_WIDTH;
                let covered = shutter_on && shutter.covers(symbol);
                canvas.put(x, y, "│", Style::default().fg(BASE), None);

                let slot = |field| Region::Slot {
                    row: row.index(),
                    symbol,
                    field,
                };
                let dim = |style: Style| {
                    if covered {
                        style.add_modifier(Modifier::DIM)
                    } else {
                        style
                    }
                };

                match row.slot(symbol) {
                    Some(transition) => {
                        let dec = slot(Field::NextState(Delta::Decrement));
                        let inc = slot(Field::NextState(Delta::Increment));
                        let write = slot(Field::Write);
                        let direction = slot(Field::Direction);

                        canvas.put(x + 1, y, "‹", dim(self.hover_style(dec)), Some(dec));
                        canvas.put(
                            x + 2,
                            y,
                            &format!("{:>2}›", transition.next.to_string()),
                            dim(self.hover_style(inc).fg(BASE)),
                            Some(inc),
                        );
                        let write_style = symbol_style(transition.write);
                        canvas.put(
                            x + 5,
                            y,
                            &format!(" {} ", transition.write),
                            dim(self.hover_style(write).patch(write_style)),
                            Some(write),
                        );
                        let arrow_color = direction_color(transition.direction);
                        canvas.put(
                            x + 8,
                            y,
                            &format!(" {} ", arrow(transition.direction)),
                            dim(self.hover_style(direction).fg(arrow_color)),
                            Some(direction),
                        );
                    }
                    None => {
                        let region = slot(Field::Write);
                        canvas.put(
                            x + 1,
                            y,
                            "    ╳     ",
                            dim(self.hover_style(region).fg(Color::DarkGray)),
                            Some(region),
                        );
                    }
                }
            }
        }

        let len = sheet.len() as i64;
        if input_mode {
            let y = screen_row(len);
            let width = STATE_WIDTH + 3 * SLOT_WIDTH;
            let text = format!("{:^width$}", "+ ADD STATE", width = width as usize);
            let style = self.hover_style(Region::AddRow).fg(BASE);
            canvas.put(0, y, &text, style, Some(Region::AddRow));
        }

        let y = screen_row(len + 1);
        let halt_style = Style::default().fg(BASE).add_modifier(Modifier::BOLD);
        canvas.put(1, y, &format!("{:>3}", StateRef::Halt.to_string()), halt_style, None);
        for symbol in Symbol::ALL {
            let x = STATE_WIDTH + symbol.index() as u16 * SLOT_WIDTH;
            canvas.put(x, y, "│", Style::default().fg(BASE), None);
            let style = Style::default().fg(Color::DarkGray);
            canvas.put(x + 1, y, "╲╲╲╲╲╲╲╲╲╲", style, None);
        }

        let hits = canvas.hits;
        self.hits.extend(hits);
    }

    fn render_display(&self, f: &mut Frame, area: Rect) {
        let machine = self.simulator.machine();

        let state = match machine.state() {
            Some(state) if machine.is_executing() => state.to_string(),
            _ => "--".to_string(),
        };
        let read = machine
            .read_symbol()
            .map_or("-".to_string(), |symbol| symbol.to_string());
        let rule = machine.transition().map_or("-".to_string(), |t| {
            format!("write {} move {} next {}", t.write, t.direction, t.next)
        });

        let shutter: String = machine
            .shutter()
            .as_array()
            .iter()
            .map(|&covered| if covered { '■' } else { '□' })
            .collect();

        let text = vec![
            Line::from(vec![
                Span::styled("State: ", Style::default().fg(Color::Yellow)),
                Span::styled(state, Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(" | Phase: ", Style::default().fg(Color::Yellow)),
                Span::raw(machine.mode().label()),
                Span::styled(" | Steps: ", Style::default().fg(Color::Yellow)),
                Span::raw(machine.step_count().to_string()),
            ]),
            Line::from(vec![
                Span::styled("Read: ", Style::default().fg(Color::Cyan)),
                Span::raw(read),
                Span::styled(" | Rule: ", Style::default().fg(Color::Cyan)),
                Span::raw(rule),
                Span::styled(" | Shutter: ", Style::default().fg(Color::Cyan)),
                Span::raw(shutter),
            ]),
        ];

        f.render_widget(section("Current State", text), area);
    }

    fn render_tape(&mut self, f: &mut Frame, area: Rect) {
        let outer = block("Tape");
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let tape = self.simulator.machine().tape();
        let center = inner.x as i32 + inner.width as i32 / 2 - TAPE_CELL_WIDTH / 2;
        let shift = tape.offset() / tape.cell_size();

        let head_row = inner.y;
        let cell_row = inner.y + 1;
        let info_row = inner.y + 2;

        let buf = f.buffer_mut();
        buf.set_string(
            (center + 2) as u16,
            head_row,
            "▼",
            Style::default().fg(BASE).add_modifier(Modifier::BOLD),
        );

        for (index, symbol) in tape.cells() {
            let x = center + ((index as f32 + shift) * TAPE_CELL_WIDTH as f32).round() as i32;
            if x < inner.x as i32 || x + TAPE_CELL_WIDTH > inner.right() as i32 {
                continue;
            }

            let mut style = symbol_style(symbol);
            if x == center {
                style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
            }
            if tape.is_hovered(index) {
                style = style.add_modifier(Modifier::REVERSED);
            }

            buf.set_string(x as u16, cell_row, format!("│ {symbol} "), style);
            self.hits.push((
                Rect::new(x as u16, cell_row, TAPE_CELL_WIDTH as u16, 1),
                Region::TapeCell(index),
            ));
        }

        let info = format!(
            "Head at position: {} (symbol: '{}') | Cells: {}..={}",
            tape.head(),
            tape.symbol_at(tape.head()),
            tape.leftmost(),
            tape.rightmost()
        );
        buf.set_string(inner.x, info_row, info, Style::default().fg(Color::Cyan));
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let help_text = vec![
            Line::from("Controls:"),
            Line::from("  x - Execute from the initial state"),
            Line::from("  s - Stop"),
            Line::from("  Enter - Take one phase (manual mode)"),
            Line::from("  p - Toggle auto-play"),
            Line::from("  e - Enter/leave sheet input mode"),
            Line::from("  ← → - Move the head (halted only)"),
            Line::from("  0 1 b - Write into the tape cell under the mouse"),
            Line::from("  Delete - Clear the sheet slot under the mouse (input mode)"),
            Line::from("  PgUp PgDn - Switch presets"),
            Line::from("  h - Toggle this help"),
            Line::from("  q - Quit"),
            Line::from(""),
            Line::from("Mouse:"),
            Line::from("  Click the sheet to edit it, click outside to leave input mode"),
            Line::from("  Click an empty slot to define it, click a field to cycle it"),
            Line::from("  Click ‹ or › on a state to step it"),
            Line::from("  Click the last row's label to delete it"),
        ];

        f.render_widget(section("Help", help_text).wrap(Wrap { trim: false }), area);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let findings = self.simulator.findings();
        let mut spans = vec![Span::raw(self.message.clone())];
        if let Some(first) = findings.first() {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                format!("Check: {first}"),
                Style::default().fg(Color::Yellow),
            ));
        }

        let paragraph = Paragraph::new(Line::from(spans))
            .block(block("Status").title_alignment(Alignment::Left));
        f.render_widget(paragraph, area);
    }

    fn hover_style(&self, region: Region) -> Style {
        if self.simulator.is_hovered(region) {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        }
    }

    fn hit(&self, x: u16, y: u16) -> Option<Region> {
        self.hits
            .iter()
            .rev()
            .find(|(rect, _)| {
                x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
            })
            .map(|&(_, region)| region)
    }

    fn refresh_hover(&mut self) {
        let region = self.pointer.and_then(|(x, y)| self.hit(x, y));
        self.simulator.hover(region);
    }

    pub fn pointer_moved(&mut self, x: u16, y: u16) {
        self.pointer = Some((x, y));
        self.refresh_hover();
    }

    pub fn click(&mut self, x: u16, y: u16) {
        self.pointer_moved(x, y);
        let result = self.simulator.click();
        self.report(result);
    }

    pub fn scroll_sheet(&mut self, lines: i64) {
        if self.simulator.machine().is_input_mode() {
            let max = self.simulator.machine().sheet().len() as i64 + 2;
            self.sheet_scroll = (self.sheet_scroll + lines).clamp(-2, max);
        }
    }

    pub fn perform(&mut self, action: Action) {
        let result = match action {
            Action::Quit | Action::ToggleHelp => Ok(None),
            Action::Execute => {
                self.simulator.machine_mut().leave_input_mode();
                self.simulator.machine_mut().start().map(Some)
            }
            Action::Stop => {
                self.simulator.machine_mut().stop();
                self.message = "Stop requested".to_string();
                return;
            }
            Action::Advance => self.simulator.key_pressed(Key::Confirm),
            Action::ToggleAutoPlay => {
                let run_mode = self.simulator.toggle_run_mode();
                self.message = format!(
                    "Auto-play {}",
                    if run_mode == RunMode::Auto {
                        "enabled"
                    } else {
                        "disabled"
                    }
                );
                return;
            }
            Action::ToggleInputMode => {
                if self.simulator.machine().is_input_mode() {
                    self.simulator.machine_mut().leave_input_mode();
                    Ok(None)
                } else {
                    self.sheet_scroll = 0;
                    self.simulator.machine_mut().enter_input_mode().map(|_| None)
                }
            }
            Action::HeadLeft => self.simulator.key_pressed(Key::Left),
            Action::HeadRight => self.simulator.key_pressed(Key::Right),
            Action::WriteOne => self.simulator.key_pressed(Key::Symbol(Symbol::One)),
            Action::WriteZero => self.simulator.key_pressed(Key::Symbol(Symbol::Zero)),
            Action::WriteBlank => self.simulator.key_pressed(Key::Symbol(Symbol::Blank)),
            Action::Delete => self.simulator.key_pressed(Key::Delete),
            Action::PreviousPreset => {
                let loaded = self.simulator.previous_preset();
                self.report_preset(loaded);
                return;
            }
            Action::NextPreset => {
                let loaded = self.simulator.next_preset();
                self.report_preset(loaded);
                return;
            }
        };

        if action == Action::ToggleHelp {
            self.show_help = !self.show_help;
        }
        self.report(result);
    }

    /// Called once per frame.
    pub fn tick(&mut self) {
        if let Some(Step::Halt(reason)) = self.simulator.tick() {
            self.message = format!("Machine halted: {reason}. Press 'x' to run again.");
        }
    }

    fn report(&mut self, result: Result<Option<Step>, MachineError>) {
        match result {
            Ok(Some(Step::Continue(mode))) => {
                self.message = format!("Phase: {}", mode.label());
            }
            Ok(Some(Step::Halt(reason))) => {
                self.message = format!("Machine halted: {reason}. Press 'x' to run again.");
            }
            Ok(Some(Step::Suspended)) => {
                self.message = "Waiting for animation...".to_string();
            }
            Ok(Some(Step::Idle)) | Ok(None) => {}
            Err(e) => self.message = format!("Error: {e}"),
        }
    }

    fn report_preset(&mut self, loaded: Result<usize, MachineError>) {
        match loaded.and_then(PresetManager::get_preset_info) {
            Ok(info) => {
                self.sheet_scroll = 0;
                self.message = format!(
                    "Loaded preset {}/{}: {} ({})",
                    info.index + 1,
                    PresetManager::count(),
                    info.name,
                    info.description
                );
            }
            Err(e) => self.message = format!("Error: {e}"),
        }
    }
}

/// Draws clipped text into a sheet area and records the regions it covers.
struct Canvas<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    hits: Vec<(Rect, Region)>,
    input_mode: bool,
}

impl Canvas<'_> {
    fn put(&mut self, col: u16, row: i64, text: &str, style: Style, region: Option<Region>) {
        if row < 0 || row >= self.area.height as i64 || col >= self.area.width {
            return;
        }

        let x = self.area.x + col;
        let y = self.area.y + row as u16;
        let width = (text.chars().count() as u16).min(self.area.width - col);
        self.buf.set_stringn(x, y, text, width as usize, style);

        // Outside input mode the whole sheet is a single region.
        if let (true, Some(region)) = (self.input_mode, region) {
            self.hits.push((Rect::new(x, y, width, 1), region));
        }
    }

    fn fill(&mut self, row: i64, style: Style) {
        if row < 0 || row >= self.area.height as i64 {
            return;
        }
        let y = self.area.y + row as u16;
        self.buf
            .set_style(Rect::new(self.area.x, y, self.area.width, 1), style);
    }
}

fn symbol_style(symbol: Symbol) -> Style {
    match symbol {
        Symbol::One => Style::default().fg(Color::Rgb(221, 183, 30)),
        Symbol::Zero => Style::default().fg(Color::Rgb(92, 102, 186)),
        Symbol::Blank => Style::default().fg(Color::Gray),
    }
}

fn arrow(direction: Move) -> char {
    match direction {
        Move::Left => '←',
        Move::Right => '→',
    }
}

fn direction_color(direction: Move) -> Color {
    match direction {
        Move::Left => Color::Rgb(14, 25, 121),
        Move::Right => Color::Rgb(121, 14, 14),
    }
}

fn section<'a>(title: &'a str, content: Vec<Line<'a>>) -> Paragraph<'a> {
    Paragraph::new(content).block(block(title))
}

fn block(title: &str) -> Block {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" {title} "))
        .padding(BLOCK_PADDING)
}
