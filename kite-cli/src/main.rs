mod agents;
mod app;
mod controller;
mod event;
mod input;
mod transcript;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use crossterm::event::{Event as TermEvent, KeyCode, KeyEventKind, KeyModifiers};
use kite::{Gateway, HttpGateway};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;

use app::{App, Focus};
use controller::Controller;
use event::AppEvent;
use input::InputMode;

#[derive(Parser)]
struct Args {
    /// Base URL of the agent controller service
    #[arg(long, env = "KITE_BASE_URL", default_value = "http://127.0.0.1:8083")]
    base_url: String,

    /// Agent namespace
    #[arg(long, env = "KITE_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Disable mouse scroll support (re-enables terminal text selection)
    #[arg(long)]
    no_mouse: bool,
}

fn cleanup_terminal() {
    let _ = crossterm::execute!(std::io::stdout(), crossterm::event::DisableMouseCapture);
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PopKeyboardEnhancementFlags
    );
    ratatui::restore();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // File-based tracing; stderr would corrupt the TUI.
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let log_dir = PathBuf::from(&home).join(".kite");
        std::fs::create_dir_all(&log_dir).ok();
        let log_file = std::fs::File::create(log_dir.join("kite.log"))?;

        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::try_from_env("KITE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(log_file)
            .with_ansi(false)
            .init();
    }

    let args = Args::parse();
    tracing::info!("connecting to {} (namespace {})", args.base_url, args.namespace);
    let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::new(&args.base_url, &args.namespace));

    // Install panic hook that restores the terminal
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        cleanup_terminal();
        default_hook(info);
    }));

    let terminal = ratatui::init();

    // Probe for the kitty keyboard protocol: with it, Ctrl+Enter is
    // distinguishable from Enter and the editor can be multi-line. Without
    // it we fall back to a single-line editor where Enter submits.
    let input_mode = if crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PushKeyboardEnhancementFlags(
                crossterm::event::KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
            )
        );
        InputMode::MultiLine
    } else {
        InputMode::SingleLine
    };

    if !args.no_mouse {
        crossterm::execute!(std::io::stdout(), crossterm::event::EnableMouseCapture)?;
    }

    let result = run_app(terminal, Arc::clone(&gateway), input_mode).await;

    cleanup_terminal();

    result
}

async fn run_app(
    mut terminal: DefaultTerminal,
    gateway: Arc<dyn Gateway>,
    input_mode: InputMode,
) -> anyhow::Result<()> {
    let mut app = App::new(input_mode);
    let mut controller = Controller::new(Arc::clone(&gateway));

    // Unified event channel
    let (app_tx, mut app_rx) = mpsc::unbounded_channel::<AppEvent>();

    // Stop flag for the event reader thread
    let stop = Arc::new(AtomicBool::new(false));

    // Spawn terminal event reader using poll() with timeout so it can stop
    let term_tx = app_tx.clone();
    let stop_reader = Arc::clone(&stop);
    tokio::task::spawn_blocking(move || {
        while !stop_reader.load(Ordering::Relaxed) {
            if crossterm::event::poll(std::time::Duration::from_millis(50)).unwrap_or(false) {
                match crossterm::event::read() {
                    Ok(ev) => {
                        if term_tx.send(AppEvent::Terminal(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        }
    });

    // Tick timer for spinner animation
    let tick_tx = app_tx.clone();
    let stop_tick = Arc::clone(&stop);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_millis(100));
        loop {
            interval.tick().await;
            if stop_tick.load(Ordering::Relaxed) {
                break;
            }
            if tick_tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });

    // SIGTERM handler for graceful shutdown
    let sigterm_tx = app_tx.clone();
    tokio::spawn(async move {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut sig) = signal(SignalKind::terminate()) {
            sig.recv().await;
            let _ = sigterm_tx.send(AppEvent::Quit);
        }
    });

    // Initial load: agents (offline placeholders at worst), then a
    // best-effort all-sessions overview.
    let load_tx = app_tx.clone();
    let load_gateway = Arc::clone(&gateway);
    tokio::spawn(async move {
        let _ = load_tx.send(AppEvent::Status("Loading agents...".to_string()));
        let agents = load_gateway.list_agents().await;
        let _ = load_tx.send(AppEvent::Agents(agents));
        if let Ok(sessions) = load_gateway.list_all_sessions().await {
            let _ = load_tx.send(AppEvent::AllSessions(sessions));
        }
    });

    loop {
        if app.dirty {
            terminal.draw(|frame| ui::draw(frame, &app))?;
            app.dirty = false;
        }

        let event = match app_rx.recv().await {
            Some(e) => e,
            None => break,
        };

        match event {
            AppEvent::Terminal(TermEvent::Key(key)) => {
                // With the kitty protocol, ignore Release/Repeat events
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                app.dirty = true;

                if app.show_help {
                    // Any key closes the help overlay.
                    app.show_help = false;
                    continue;
                }

                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
                {
                    break;
                }

                match key.code {
                    KeyCode::Tab => {
                        app.focus = match app.focus {
                            Focus::Agents => Focus::Input,
                            Focus::Input => Focus::Agents,
                        };
                        continue;
                    }
                    KeyCode::PageUp => {
                        app.transcript.scroll_up(10);
                        continue;
                    }
                    KeyCode::PageDown => {
                        let vh = ui::transcript_viewport_height(&app, terminal.size()?.height);
                        app.transcript.scroll_down(10, vh);
                        continue;
                    }
                    _ => {}
                }

                match app.focus {
                    Focus::Agents => match key.code {
                        KeyCode::Up | KeyCode::Char('k') => {
                            if let Some(agent) = app.agents.select_prev().cloned() {
                                app.note_agent_focus(&agent);
                                controller.spawn_session_preview(agent, &app_tx);
                            }
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            if let Some(agent) = app.agents.select_next().cloned() {
                                app.note_agent_focus(&agent);
                                controller.spawn_session_preview(agent, &app_tx);
                            }
                        }
                        KeyCode::Enter => {
                            if let Some(agent) = app.agents.current().cloned() {
                                app.note_agent_selected(&agent);
                                controller.select_agent(agent, &app_tx).await;
                            }
                        }
                        KeyCode::Char('s') => {
                            app.status = "All sessions".to_string();
                            app.agent_label = "*".to_string();
                            app.session_label = "-".to_string();
                            controller.spawn_all_sessions(&app_tx);
                        }
                        KeyCode::Char('c') => app.transcript.clear(),
                        KeyCode::Char('?') => app.show_help = true,
                        KeyCode::Char('q') => break,
                        _ => {}
                    },
                    Focus::Input => match key.code {
                        KeyCode::Enter => {
                            let submit = match app.editor.mode() {
                                InputMode::SingleLine => true,
                                InputMode::MultiLine => {
                                    key.modifiers.contains(KeyModifiers::CONTROL)
                                        || key.modifiers.contains(KeyModifiers::ALT)
                                }
                            };
                            if submit {
                                if let Some(text) = app.editor.take_submission() {
                                    controller.submit(text, &app_tx).await;
                                }
                            } else {
                                app.editor.insert_newline();
                            }
                        }
                        KeyCode::Backspace => app.editor.backspace(),
                        KeyCode::Delete => app.editor.delete(),
                        KeyCode::Left => app.editor.move_left(),
                        KeyCode::Right => app.editor.move_right(),
                        KeyCode::Home => app.editor.move_home(),
                        KeyCode::End => app.editor.move_end(),
                        KeyCode::Up => app.editor.move_up(),
                        KeyCode::Down => app.editor.move_down(),
                        KeyCode::Char(c) => app.editor.insert_char(c),
                        _ => {}
                    },
                }
            }
            AppEvent::Terminal(TermEvent::Mouse(mouse)) => {
                use crossterm::event::MouseEventKind;
                match mouse.kind {
                    MouseEventKind::ScrollUp => {
                        app.transcript.scroll_up(3);
                        app.dirty = true;
                    }
                    MouseEventKind::ScrollDown => {
                        let vh = ui::transcript_viewport_height(&app, terminal.size()?.height);
                        app.transcript.scroll_down(3, vh);
                        app.dirty = true;
                    }
                    _ => {}
                }
            }
            AppEvent::Terminal(TermEvent::Resize(_, _)) => {
                app.dirty = true;
            }
            AppEvent::Terminal(_) => {}
            AppEvent::Tick => {
                if app.streaming {
                    app.tick += 1;
                    app.dirty = true;
                }
            }
            AppEvent::Agents(list) => {
                app.status = format!("Loaded {} agents", list.len());
                if let Some(agent) = app.agents.set_agents(list) {
                    app.note_agent_selected(&agent);
                    controller.select_agent(agent, &app_tx).await;
                }
                app.dirty = true;
            }
            AppEvent::Sessions { agent, sessions } => {
                app.transcript.show_sessions(&agent, &sessions);
                app.dirty = true;
            }
            AppEvent::AllSessions(sessions) => {
                app.transcript.show_all_sessions(&sessions);
                app.dirty = true;
            }
            AppEvent::Status(status) => {
                app.status = status;
                app.dirty = true;
            }
            AppEvent::SessionId(id) => {
                app.session_label = transcript::short_id(&id);
                app.dirty = true;
            }
            AppEvent::Echo(msg) => {
                app.transcript.add_message(&msg);
                app.dirty = true;
            }
            AppEvent::StreamStarted { turn } => {
                if turn == controller.current_turn() {
                    app.streaming = true;
                    app.status = "Streaming...".to_string();
                    app.dirty = true;
                }
            }
            AppEvent::Stream { turn, msg } => {
                if turn == controller.current_turn() {
                    app.transcript.add_message(&msg);
                    app.dirty = true;
                }
            }
            AppEvent::StreamDone { turn } => {
                if turn == controller.current_turn() {
                    app.streaming = false;
                    app.status = "Done".to_string();
                    app.dirty = true;
                }
            }
            AppEvent::StreamError { turn, message } => {
                if turn == controller.current_turn() {
                    tracing::warn!("stream failed: {message}");
                    app.streaming = false;
                    app.status = format!("Error: {message}");
                    app.dirty = true;
                }
            }
            AppEvent::Quit => break,
        }
    }

    // Signal reader thread and tick timer to stop
    stop.store(true, Ordering::Relaxed);

    // Stop any in-flight stream and release the gateway exactly once.
    controller.shutdown().await;

    Ok(())
}
