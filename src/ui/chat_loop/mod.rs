//! Main chat event loop and UI rendering
//!
//! This module handles the main chat interface, including:
//! - Terminal setup and restoration
//! - Event handling (keyboard, paste, resize)
//! - Feeding stream messages back into the app
//! - Throttled redraws

mod keybindings;
mod lifecycle;

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::core::app::{apply_actions, App, AppAction, AppCommand, AppInitConfig, Screen};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::ui::renderer::ui;

use keybindings::handle_key_event;
use lifecycle::{restore_terminal, setup_terminal, SharedTerminal};

const MAX_FPS: u64 = 60;
/// Status lines fade after this long.
const STATUS_TIMEOUT: Duration = Duration::from_secs(4);

pub enum UiEvent {
    Crossterm(Event),
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', "    ")
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect()
}

/// Insert pasted text into whichever field has focus.
fn handle_paste(app: &mut App, text: &str) -> Vec<AppAction> {
    let sanitized = sanitize_pasted_text(text);
    match app.ui.screen {
        Screen::KeyGate => {
            let single_line: String = sanitized.split_whitespace().collect();
            app.ui.key_input_mut().insert_str(single_line);
            vec![AppAction::ClearStatus]
        }
        Screen::Chat => {
            app.ui.textarea_mut().insert_str(sanitized);
            vec![AppAction::InputEdited]
        }
    }
}

/// Drain everything the stream task has sent so far. Consecutive chunks are
/// merged into one action; messages from other streams are dropped.
fn collect_stream_actions(
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    current_stream_id: u64,
) -> Vec<AppAction> {
    let mut actions = Vec::new();
    let mut coalesced = String::new();

    while let Ok((message, stream_id)) = rx.try_recv() {
        if stream_id != current_stream_id {
            continue;
        }
        match message {
            StreamMessage::Chunk(content) => coalesced.push_str(&content),
            StreamMessage::Error(error) => {
                flush_chunks(&mut actions, &mut coalesced, stream_id);
                actions.push(AppAction::StreamErrored { error, stream_id });
            }
            StreamMessage::End => {
                flush_chunks(&mut actions, &mut coalesced, stream_id);
                actions.push(AppAction::StreamCompleted { stream_id });
            }
        }
    }
    flush_chunks(&mut actions, &mut coalesced, current_stream_id);
    actions
}

fn flush_chunks(actions: &mut Vec<AppAction>, coalesced: &mut String, stream_id: u64) {
    if !coalesced.is_empty() {
        actions.push(AppAction::StreamChunk {
            content: std::mem::take(coalesced),
            stream_id,
        });
    }
}

fn execute_commands(commands: Vec<AppCommand>, stream_service: &ChatStreamService) {
    for cmd in commands {
        match cmd {
            AppCommand::SpawnStream(params) => {
                debug!(stream_id = params.stream_id, "spawning stream");
                stream_service.spawn_stream(params);
            }
        }
    }
}

async fn try_draw_frame(
    app: &Arc<Mutex<App>>,
    terminal: &SharedTerminal,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> std::io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    let mut app_guard = app.lock().await;
    let mut terminal_guard = terminal.lock().await;
    let mut max_scroll = 0;
    terminal_guard.draw(|f| max_scroll = ui(f, &app_guard))?;
    app_guard.ui.update_scroll_bounds(max_scroll);
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

struct EventProcessingOutcome {
    events_processed: bool,
    exit_requested: bool,
}

async fn process_ui_events(
    app: &Arc<Mutex<App>>,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    stream_service: &ChatStreamService,
    page_rows: u16,
) -> EventProcessingOutcome {
    let mut outcome = EventProcessingOutcome {
        events_processed: false,
        exit_requested: false,
    };

    while let Ok(ev) = event_rx.try_recv() {
        outcome.events_processed = true;
        let mut app_guard = app.lock().await;
        let actions = match ev {
            UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                handle_key_event(&mut app_guard, key, page_rows)
            }
            UiEvent::Crossterm(Event::Paste(text)) => handle_paste(&mut app_guard, &text),
            UiEvent::Crossterm(_) => Vec::new(),
        };
        let commands = apply_actions(&mut app_guard, actions);
        if app_guard.ui.exit_requested {
            outcome.exit_requested = true;
        }
        drop(app_guard);
        execute_commands(commands, stream_service);

        if outcome.exit_requested {
            break;
        }
    }

    outcome
}

pub async fn run_chat(init: AppInitConfig) -> Result<(), Box<dyn Error>> {
    let app = App::new(init)?;
    info!(
        base_url = %app.session.base_url,
        model = app.session.models.selected_id(),
        "starting chat"
    );
    let app = Arc::new(Mutex::new(app));

    let terminal = setup_terminal()?;
    let result = event_loop(&app, &terminal).await;

    {
        let mut app_guard = app.lock().await;
        app_guard.conversation().cancel_current_stream();
    }
    restore_terminal(&terminal).await?;
    result
}

async fn event_loop(app: &Arc<Mutex<App>>, terminal: &SharedTerminal) -> Result<(), Box<dyn Error>> {
    let (stream_service, mut stream_rx) = ChatStreamService::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;

    let result = loop {
        if let Err(err) = try_draw_frame(
            app,
            terminal,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        )
        .await
        {
            break Err(err.into());
        }

        let page_rows = {
            let terminal_guard = terminal.lock().await;
            terminal_guard.size().map(|size| size.height / 2).unwrap_or(10)
        };

        let event_outcome =
            process_ui_events(app, &mut event_rx, &stream_service, page_rows).await;
        if event_outcome.exit_requested {
            break Ok(());
        }

        let (stream_actions, streaming, status_expired) = {
            let app_guard = app.lock().await;
            let actions = collect_stream_actions(&mut stream_rx, app_guard.session.current_stream_id);
            let expired = app_guard
                .ui
                .status_set_at
                .is_some_and(|set_at| set_at.elapsed() >= STATUS_TIMEOUT);
            (actions, app_guard.session.is_streaming(), expired)
        };
        let received_any = !stream_actions.is_empty();

        if received_any || status_expired {
            let mut app_guard = app.lock().await;
            if status_expired && app_guard.ui.screen == Screen::Chat {
                app_guard.ui.clear_status();
            }
            let commands = apply_actions(&mut app_guard, stream_actions);
            drop(app_guard);
            execute_commands(commands, &stream_service);
        }

        if event_outcome.events_processed || received_any || status_expired || streaming {
            request_redraw = true;
        }

        let idle = !event_outcome.events_processed && !received_any && !request_redraw;
        if idle {
            tokio::time::sleep(Duration::from_millis(16)).await;
        } else if !event_outcome.events_processed && !received_any {
            // Only the pulse needs repainting; wait out the frame budget.
            tokio::time::sleep(frame_duration.saturating_sub(last_draw.elapsed())).await;
        }
    };

    event_reader_handle.abort();
    result
}
