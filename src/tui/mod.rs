//! Interactive terminal front end for the backlog.
//!
//! The event loop is a single mpsc channel: a blocking reader thread feeds
//! keyboard input, and spawned tasks feed load/save completions. Saves run
//! as independent tasks, so every other item stays interactive while any
//! number of updates are in flight, and an issued save always runs to
//! completion (there is no cancellation path).

mod render;

use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::app::{App, ItemKind, SaveRequest};
use crate::client::{BacklogClient, ClientError, Snapshot};
use crate::models::{UpdateFeatureInput, UpdateStoryInput, UpdateTaskInput};

/// Fixed hand-off target for the external project-tracking tool.
const TRACKER_URL: &str = "https://dev.azure.com";

/// Everything the event loop can wake up on.
enum AppEvent {
    Input(KeyEvent),
    LoadFinished(Result<Snapshot, ClientError>),
    SaveFinished {
        request: SaveRequest,
        result: Result<DateTime<Utc>, ClientError>,
    },
}

/// Top-level screen state. A failed load is fatal to the whole view until
/// retried; there is no partial render from a partial load.
enum Screen {
    Loading,
    Failed(String),
    Ready(App),
}

/// Run the interactive view until the user quits.
pub async fn run(client: BacklogClient) -> Result<()> {
    enable_raw_mode()?;
    std::io::stdout().execute(EnterAlternateScreen)?;
    let result = event_loop(client).await;
    std::io::stdout().execute(LeaveAlternateScreen)?;
    disable_raw_mode()?;
    result
}

async fn event_loop(client: BacklogClient) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    spawn_input_reader(tx.clone());
    spawn_load(&client, &tx);

    let mut screen = Screen::Loading;

    loop {
        terminal.draw(|frame| render::draw(frame, &screen))?;

        let Some(event) = rx.recv().await else {
            break;
        };

        match event {
            AppEvent::Input(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(key, &mut screen, &client, &tx) {
                    break;
                }
            }
            AppEvent::LoadFinished(Ok(snapshot)) => {
                tracing::debug!(
                    stories = snapshot.stories.len(),
                    features = snapshot.features.len(),
                    tasks = snapshot.tasks.len(),
                    "backlog loaded"
                );
                screen = Screen::Ready(App::new(snapshot));
            }
            AppEvent::LoadFinished(Err(err)) => {
                tracing::error!(error = %err, "backlog load failed");
                screen = Screen::Failed(format!("Failed to load backlog: {err}"));
            }
            AppEvent::SaveFinished { request, result } => {
                if let Screen::Ready(app) = &mut screen {
                    match result {
                        Ok(stamp) => app.save_succeeded(&request, stamp),
                        Err(err) => app.save_failed(request.id, &err.to_string()),
                    }
                }
            }
        }
    }

    Ok(())
}

/// Handle one key press. Returns `true` when the loop should exit.
fn handle_key(
    key: KeyEvent,
    screen: &mut Screen,
    client: &BacklogClient,
    tx: &mpsc::UnboundedSender<AppEvent>,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match screen {
        Screen::Loading => matches!(key.code, KeyCode::Char('q')),
        Screen::Failed(_) => match key.code {
            KeyCode::Char('q') => true,
            KeyCode::Char('r') => {
                *screen = Screen::Loading;
                spawn_load(client, tx);
                false
            }
            _ => false,
        },
        Screen::Ready(app) => {
            let editing = app
                .selected()
                .map(|row| app.state(row.id).is_editing())
                .unwrap_or(false);
            if editing {
                handle_edit_key(key, app, client, tx);
                false
            } else {
                handle_browse_key(key, app)
            }
        }
    }
}

/// Keys while the selected item has an active edit buffer.
fn handle_edit_key(
    key: KeyEvent,
    app: &mut App,
    client: &BacklogClient,
    tx: &mpsc::UnboundedSender<AppEvent>,
) {
    let Some(row) = app.selected() else {
        return;
    };
    match key.code {
        KeyCode::Esc => app.cancel_edit(row.id),
        KeyCode::Tab => app.switch_field(row.id),
        KeyCode::Backspace => app.backspace(row.id),
        KeyCode::Enter => {
            if let Some(request) = app.start_save(row.kind, row.id) {
                spawn_save(client, tx, request);
            }
        }
        KeyCode::Char(c) => app.insert_char(row.id, c),
        _ => {}
    }
}

/// Keys while browsing. Returns `true` on quit.
fn handle_browse_key(key: KeyEvent, app: &mut App) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Up | KeyCode::Char('k') => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_down(),
        KeyCode::Enter | KeyCode::Char(' ') => {
            if let Some(row) = app.selected() {
                app.toggle_expanded(row.kind, row.id);
            }
        }
        KeyCode::Char('e') => {
            if let Some(row) = app.selected() {
                app.begin_edit(row.kind, row.id);
            }
        }
        KeyCode::Char('o') => open_tracker(),
        _ => {}
    }
    false
}

/// Feed crossterm events into the channel from a blocking thread. The
/// thread exits once the receiving side is gone.
fn spawn_input_reader(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::task::spawn_blocking(move || loop {
        if tx.is_closed() {
            break;
        }
        match event::poll(std::time::Duration::from_millis(100)) {
            Ok(true) => {
                if let Ok(Event::Key(key)) = event::read() {
                    if tx.send(AppEvent::Input(key)).is_err() {
                        break;
                    }
                }
            }
            Ok(false) => {}
            Err(_) => break,
        }
    });
}

/// Issue the three-fetch load as one task. Any single failure fails the
/// whole load; retry re-issues all three.
fn spawn_load(client: &BacklogClient, tx: &mpsc::UnboundedSender<AppEvent>) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.load_all().await;
        let _ = tx.send(AppEvent::LoadFinished(result));
    });
}

/// Execute one save in the background and report the outcome.
fn spawn_save(client: &BacklogClient, tx: &mpsc::UnboundedSender<AppEvent>, request: SaveRequest) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = execute_save(&client, &request).await;
        let _ = tx.send(AppEvent::SaveFinished { request, result });
    });
}

async fn execute_save(
    client: &BacklogClient,
    request: &SaveRequest,
) -> Result<DateTime<Utc>, ClientError> {
    match request.kind {
        ItemKind::Story => {
            client
                .update_story(
                    request.id,
                    &UpdateStoryInput {
                        title: request.title.clone(),
                        description: request.description.clone(),
                    },
                )
                .await
        }
        ItemKind::Feature => {
            client
                .update_feature(
                    request.id,
                    &UpdateFeatureInput {
                        title: request.title.clone(),
                        description: request.description.clone(),
                    },
                )
                .await
        }
        ItemKind::Task => {
            client
                .update_task(
                    request.id,
                    &UpdateTaskInput {
                        title: request.title.clone(),
                        description: request.description.clone(),
                    },
                )
                .await
        }
    }
}

/// Fire-and-forget hand-off to the external tracker. Nothing is consumed
/// from the result beyond a diagnostic log.
fn open_tracker() {
    tokio::task::spawn_blocking(|| {
        if let Err(e) = open::that(TRACKER_URL) {
            tracing::warn!(error = %e, url = TRACKER_URL, "failed to open tracker");
        }
    });
}
