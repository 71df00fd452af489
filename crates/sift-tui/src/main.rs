mod providers;
mod surface;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

use sift_core::config::Config;
use sift_engine::{Registry, SessionState, WorkerEvent};

use providers::{FilesProvider, LinesProvider, Picked};
use surface::{SharedModel, TuiSurface, UiModel};

fn init_logging() {
    if std::env::var("SIFT_LOG").is_err() {
        return;
    }
    let Some(dir) = dirs::data_dir().map(|d| d.join("sift")) else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::File::create(dir.join("sift.log")) else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("SIFT_LOG"))
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
}

fn usage(registry: &Registry) {
    eprintln!("usage: sift [FLAGS] <list> [ARGS]");
    eprintln!();
    eprintln!("flags: --input=STR --normal --top --tab --height=N --no-sort --no-quit");
    eprintln!("       --first --reverse --ignore-case --number-select|-N --auto-preview|-A");
    eprintln!("       --strict|-S --regex|-R --interactive|-I");
    eprintln!();
    eprintln!("lists:");
    for name in registry.names() {
        eprintln!("  {name}");
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    init_logging();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let picked: Picked = Arc::new(Mutex::new(Vec::new()));
    let mut registry = Registry::new(Config::load(), cwd);
    registry.register(Box::new(FilesProvider::new(picked.clone())));
    registry.register(Box::new(LinesProvider::new(picked.clone())));

    let tokens: Vec<String> = std::env::args().skip(1).collect();
    if tokens.is_empty() || tokens.iter().any(|t| t == "--help" || t == "-h") {
        usage(&registry);
        std::process::exit(2);
    }

    let model: SharedModel = Arc::new(Mutex::new(UiModel::default()));
    let surface = TuiSurface::new(model.clone());
    let (name, events) = match registry.start(&tokens, Box::new(surface)) {
        Ok(started) => started,
        Err(err) => {
            eprintln!("sift: {err}");
            std::process::exit(1);
        }
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut registry, &name, events, &model).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    registry.stop_all();
    if let Err(err) = result {
        eprintln!("sift: {err}");
    }
    // errors shown while the alternate screen was up would vanish with it
    if let Ok(model) = model.lock() {
        if let Some((message, true)) = &model.message {
            eprintln!("sift: {message}");
        }
    }
    if let Ok(out) = picked.lock() {
        for line in out.iter() {
            println!("{line}");
        }
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    registry: &mut Registry,
    name: &str,
    mut events: UnboundedReceiver<WorkerEvent>,
    model: &SharedModel,
) -> io::Result<()> {
    // dedicated thread for crossterm event reading
    let (key_tx, mut key_rx) = mpsc::unbounded_channel::<Event>();
    std::thread::spawn(move || loop {
        if event::poll(Duration::from_millis(50)).unwrap_or(false) {
            if let Ok(ev) = event::read() {
                if key_tx.send(ev).is_err() {
                    break;
                }
            }
        }
    });

    let mut tick = tokio::time::interval(Duration::from_millis(30));

    loop {
        if let Ok(model) = model.lock() {
            terminal.draw(|f| ui::render(f, &model))?;
        }

        let Some(session) = registry.session_mut(name) else {
            return Ok(());
        };
        if session.state() != SessionState::Active {
            return Ok(());
        }

        tokio::select! {
            Some(ev) = key_rx.recv() => {
                if let Event::Key(key) = ev {
                    if key.kind == KeyEventKind::Press {
                        if let Some(key_name) = key_name(&key) {
                            session.on_key(&key_name, Instant::now());
                        }
                    }
                }
            }
            Some(ev) = events.recv() => {
                session.on_worker_event(ev, Instant::now());
            }
            _ = tick.tick() => {
                session.on_tick(Instant::now());
            }
        }
    }
}

/// Translate a crossterm key event into the engine's key names.
fn key_name(key: &KeyEvent) -> Option<String> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    Some(match key.code {
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) if ctrl => format!("C-{}", c.to_ascii_lowercase()),
        KeyCode::Char(c) => c.to_string(),
        _ => return None,
    })
}
