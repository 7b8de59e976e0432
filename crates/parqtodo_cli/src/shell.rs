//! Interactive shell over one ready bridge.

use crate::action::{Action, Outcome, HELP};
use crate::render::{format_rows, paint_error, paint_view, Palette};
use crate::CliError;
use log::{debug, warn};
use parqtodo_core::{BridgeResult, PersistenceBridge, TaskListView};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;

pub fn run(
    view: &mut TaskListView,
    bridge: &PersistenceBridge,
    history_file: &Path,
) -> Result<(), CliError> {
    let mut rl = DefaultEditor::new()?;
    if rl.load_history(history_file).is_err() {
        debug!("event=shell_history module=cli status=empty");
    }

    let mut palette = Palette::for_theme(view.theme());
    println!("{}\n", paint_view(view, &palette));
    println!("type `help` for commands");

    loop {
        let prompt = format!("{} ", palette.prompt.paint("todo>"));
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let action = match Action::parse_line(&line) {
                    Ok(Some(action)) => action,
                    Ok(None) => continue,
                    Err(message) => {
                        println!("{}", paint_error(&message, &palette));
                        continue;
                    }
                };
                let error_in_view = action.reports_through_view();
                let result = action.execute(view, bridge);
                match respond(result, error_in_view, view, &mut palette) {
                    Some(text) => println!("{text}"),
                    None => break,
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                warn!("event=shell_readline module=cli status=error error={err}");
                return Err(err.into());
            }
        }
    }

    if let Err(err) = rl.save_history(history_file) {
        warn!("event=shell_history module=cli status=error error={err}");
    }
    Ok(())
}

/// Text printed for one executed action; `None` ends the session.
fn respond(
    result: BridgeResult<Outcome>,
    error_in_view: bool,
    view: &TaskListView,
    palette: &mut Palette,
) -> Option<String> {
    let text = match result {
        Ok(Outcome::Quit) => return None,
        Ok(Outcome::Theme(theme)) => {
            *palette = Palette::for_theme(theme);
            format!("theme: {}", theme.as_str())
        }
        Ok(Outcome::Help) => HELP.to_string(),
        Ok(Outcome::Json(body)) => body,
        Ok(Outcome::Rows(rows)) => format_rows(&rows),
        Ok(Outcome::View) | Ok(Outcome::Cleared(_)) => paint_view(view, palette),
        // Task changes leave their error on the view's error line.
        Err(_) if error_in_view => paint_view(view, palette),
        Err(err) => paint_error(&err.to_string(), palette),
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::respond;
    use crate::action::Action;
    use crate::render::Palette;
    use parqtodo_core::{
        BridgeConfig, EngineBundle, MemorySnapshotCache, PersistenceBridge, TaskId, TaskListView,
    };
    use std::sync::Arc;

    fn ready_view() -> (PersistenceBridge, TaskListView) {
        let config = BridgeConfig {
            bundle: Some(EngineBundle::Inline),
            ..BridgeConfig::default()
        };
        let bridge =
            PersistenceBridge::initialize(&config, Arc::new(MemorySnapshotCache::new())).unwrap();
        let mut view = TaskListView::new();
        view.load(&bridge).unwrap();
        (bridge, view)
    }

    fn run_line(
        action: Action,
        view: &mut TaskListView,
        bridge: &PersistenceBridge,
    ) -> Option<String> {
        let error_in_view = action.reports_through_view();
        let result = action.execute(view, bridge);
        respond(result, error_in_view, view, &mut Palette::plain())
    }

    #[test]
    fn rejected_query_prints_its_own_error_after_a_failed_change() {
        let (bridge, mut view) = ready_view();

        let failed_delete = run_line(Action::Delete(TaskId(999)), &mut view, &bridge).unwrap();
        assert!(failed_delete.contains("error: task not found: 999"));

        let rejected = run_line(
            Action::Sql("DELETE FROM todos".to_string()),
            &mut view,
            &bridge,
        )
        .unwrap();
        assert!(rejected.contains("only read-only statements are allowed"));
        assert!(!rejected.contains("task not found"));
    }

    #[test]
    fn quit_ends_the_session_and_theme_switches_palette() {
        let (bridge, mut view) = ready_view();
        assert_eq!(
            run_line(Action::Theme, &mut view, &bridge),
            Some("theme: dark".to_string())
        );
        assert_eq!(run_line(Action::Quit, &mut view, &bridge), None);
    }
}
