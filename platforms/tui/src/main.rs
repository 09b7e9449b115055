mod app;

use action::Action;
use app::App;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use deltasheet::{MachineConfig, PresetManager, RunMode, Simulator};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;
use std::{error::Error, fs, io, time::Duration};
use tracing::info;

/// A delta sheet Turing machine simulator with a Terminal User Interface.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  deltasheet --preset \"Binary Increment\" --auto
  deltasheet --preset 2 --log deltasheet.log")]
struct Cli {
    /// Preset to load at startup, by name or by index.
    /// If not provided, the application starts from the first preset.
    #[clap(short, long)]
    preset: Option<String>,

    /// Start in auto-play mode, advancing one phase per frame.
    #[clap(short, long)]
    auto: bool,

    /// Frames per second; every animation advances once per frame.
    #[clap(long, default_value_t = 60)]
    fps: u64,

    /// Tape animation speed in pixels per frame.
    #[clap(long)]
    tape_speed: Option<f32>,

    /// Sheet animation speed in pixels per frame.
    #[clap(long)]
    sheet_speed: Option<f32>,

    /// Write engine logs to this file.
    #[clap(long, value_name = "FILE")]
    log: Option<PathBuf>,
}

/// Represents the state of the application loop.
#[derive(PartialEq)]
enum AppState {
    Running,
    ShouldQuit,
}

/// A wrapper around the terminal to ensure it's restored on drop.
struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl Tui {
    /// Creates a new TUI.
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        // Restore the terminal to its previous state.
        // The results are ignored as we can't do much about errors during drop.
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // The terminal is taken over by the UI, so logs only go to a file.
    if let Some(path) = &cli.log {
        let file = fs::File::create(path)
            .map_err(|e| format!("Failed to create log file '{}': {}", path.display(), e))?;
        tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    // Build the simulator before initializing the TUI so that errors reach stderr.
    let app = match load_simulator(&cli) {
        Ok(simulator) => App::new(simulator),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize the TUI. The `Tui` struct will handle cleanup on drop.
    let mut tui = Tui::new()?;

    // Run the application.
    run_app(&mut tui.terminal, app, frame_duration(cli.fps))?;

    Ok(())
}

/// Builds the simulator from CLI arguments.
fn load_simulator(cli: &Cli) -> Result<Simulator, String> {
    let mut config = MachineConfig::default();
    if let Some(speed) = cli.tape_speed {
        config = config.with_tape_speed(speed);
    }
    if let Some(speed) = cli.sheet_speed {
        config = config.with_sheet_speed(speed);
    }

    let index = match &cli.preset {
        None => 0,
        Some(preset) => preset
            .parse::<usize>()
            .ok()
            .or_else(|| PresetManager::find_by_name(preset))
            .ok_or_else(|| {
                format!(
                    "Unknown preset '{}'. Available presets: {}",
                    preset,
                    PresetManager::list_names().join(", ")
                )
            })?,
    };

    let mut simulator = Simulator::with_preset(config, index).map_err(|e| e.to_string())?;
    if cli.auto {
        simulator.machine_mut().set_run_mode(RunMode::Auto);
    }

    info!(preset = index, auto = cli.auto, "Simulator ready");
    Ok(simulator)
}

fn frame_duration(fps: u64) -> Duration {
    Duration::from_micros(1_000_000 / fps.max(1))
}

/// Runs the main application loop.
///
/// Every frame renders once and advances the simulator once; input is read in between.
fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    frame: Duration,
) -> io::Result<()> {
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|f| app.render(f))?;

        let timeout = frame.saturating_sub(last_frame.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key_event(&mut app, key) == AppState::ShouldQuit {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => handle_mouse_event(&mut app, mouse),
                _ => {}
            }
        }

        if last_frame.elapsed() >= frame {
            app.tick();
            last_frame = Instant::now();
        }
    }
}

/// Handles key events and updates the application state.
fn handle_key_event(app: &mut App, key: KeyEvent) -> AppState {
    if let Some(action) = app.keymap.get(&key) {
        match action {
            Action::Quit => return AppState::ShouldQuit,
            other => {
                let action = other.clone();
                app.perform(action);
            }
        }
    }
    AppState::Running
}

/// Routes pointer movement, clicks and wheel scrolling to the application.
fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => {
            app.pointer_moved(mouse.column, mouse.row)
        }
        MouseEventKind::Down(MouseButton::Left) => app.click(mouse.column, mouse.row),
        MouseEventKind::ScrollUp => app.scroll_sheet(-1),
        MouseEventKind::ScrollDown => app.scroll_sheet(1),
        _ => {}
    }
}
