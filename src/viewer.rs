use std::path::Path;

use crate::app::App;
use crate::config::ViewerConfig;
use crate::error::Result;
use crate::event::{Event, EventHandler, SessionWatch};
use crate::plot::build_plot;
use crate::ui;

/// Loads the session in `dir` and shows it until the user quits. With
/// `follow`, the session is reloaded whenever its records grow.
pub async fn render(dir: &Path, config: &ViewerConfig, follow: bool) -> Result<()> {
    let model = build_plot(dir)?;
    let mut app = App::new(model, dir.to_path_buf(), follow);
    let watch = follow.then(|| SessionWatch::new(dir));
    let mut events = EventHandler::new(config, watch);

    let mut terminal = ratatui::init();
    let result = run(&mut terminal, &mut app, &mut events).await;
    ratatui::restore();

    result
}

async fn run(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<()> {
    terminal.draw(|frame| ui::draw(frame, app))?;

    while app.running {
        let Some(event) = events.next().await else {
            break;
        };
        let should_draw = match event {
            Event::Key(key) => {
                let action = app.map_key(key);
                app.dispatch(action);
                true
            }
            Event::SessionChanged => {
                tracing::debug!(dir = %app.session_dir.display(), "session grew, reloading");
                app.reload();
                true
            }
            Event::Tick => {
                // Only a status message can expire on its own.
                let had_status = app.status_message.is_some();
                app.on_tick();
                had_status && app.status_message.is_none()
            }
            Event::Resize => true,
        };
        if should_draw && app.running {
            terminal.draw(|frame| ui::draw(frame, app))?;
        }
    }

    Ok(())
}
