pub mod app;
pub mod executor;
pub mod filter;
pub mod message;
pub mod render;

use anyhow::Result;
use app::App;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use executor::{Executor, Services};
use futures_util::StreamExt;
use message::Message;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;

/// Spinner cadence while a refresh is in flight.
const TICK: Duration = Duration::from_millis(100);

/// Take over the terminal and run the session until the user quits.
pub async fn run(app: App, services: Services) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = event_loop(&mut terminal, app, services).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut app: App,
    services: Services,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let executor = Executor::new(services, tx);
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK);

    for cmd in app.init() {
        executor.dispatch(cmd);
    }

    loop {
        terminal.draw(|f| render::draw(f, &app))?;
        if app.should_quit() {
            return Ok(());
        }

        let msg = tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => Message::Key(key),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            Some(msg) = rx.recv() => msg,
            _ = tick.tick(), if app.is_refreshing() => Message::Tick,
        };

        for cmd in app.update(msg) {
            tracing::debug!(?cmd, "dispatching");
            executor.dispatch(cmd);
        }
    }
}
