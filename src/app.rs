use std::path::PathBuf;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::action::Action;
use crate::plot::build_plot;
use crate::plot::series::{GroupKind, PlotModel};
use crate::ui::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Help,
}

/// Which sub-views are on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Both,
    Cpu,
    Mem,
}

impl Focus {
    pub const ALL: [Focus; 3] = [Focus::Both, Focus::Cpu, Focus::Mem];

    pub fn next(self) -> Self {
        match self {
            Focus::Both => Focus::Cpu,
            Focus::Cpu => Focus::Mem,
            Focus::Mem => Focus::Both,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Focus::Both => "cpu+mem",
            Focus::Cpu => "cpu",
            Focus::Mem => "mem",
        }
    }

    pub fn groups(self) -> &'static [GroupKind] {
        match self {
            Focus::Both => &GroupKind::ALL,
            Focus::Cpu => &[GroupKind::Cpu],
            Focus::Mem => &[GroupKind::Mem],
        }
    }
}

pub struct App {
    pub running: bool,
    pub model: PlotModel,
    pub session_dir: PathBuf,
    /// The session is watched for new rows (another tracer may still append).
    pub follow: bool,
    pub focus: Focus,
    pub show_legend: bool,
    pub input_mode: InputMode,
    pub status_message: Option<(String, Instant)>,
    pub theme: Theme,
}

impl App {
    pub fn new(model: PlotModel, session_dir: PathBuf, follow: bool) -> Self {
        App {
            running: true,
            model,
            session_dir,
            follow,
            focus: Focus::default(),
            show_legend: true,
            input_mode: InputMode::Normal,
            status_message: None,
            theme: Theme::dark(),
        }
    }

    pub fn show_help(&self) -> bool {
        self.input_mode == InputMode::Help
    }

    pub fn map_key(&self, key: KeyEvent) -> Action {
        // Ctrl+C always quits
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        match self.input_mode {
            InputMode::Help => match key.code {
                KeyCode::Char('?') | KeyCode::Esc => Action::ToggleHelp,
                KeyCode::Char('q') => Action::Quit,
                _ => Action::None,
            },
            InputMode::Normal => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
                KeyCode::Tab => Action::CycleFocus,
                KeyCode::Char('l') => Action::ToggleLegend,
                KeyCode::Char('r') => Action::Reload,
                KeyCode::Char('?') => Action::ToggleHelp,
                _ => Action::None,
            },
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::CycleFocus => self.focus = self.focus.next(),
            Action::ToggleLegend => self.show_legend = !self.show_legend,
            Action::ToggleHelp => {
                self.input_mode = match self.input_mode {
                    InputMode::Normal => InputMode::Help,
                    InputMode::Help => InputMode::Normal,
                };
            }
            Action::Reload => self.reload(),
            Action::None => {}
        }
    }

    pub fn on_tick(&mut self) {
        // Clear expired status messages (older than 3 seconds)
        if let Some((_, created)) = &self.status_message
            && created.elapsed().as_secs() >= 3
        {
            self.status_message = None;
        }
    }

    /// Re-reads the session; on failure the last model stays on screen.
    pub fn reload(&mut self) {
        match build_plot(&self.session_dir) {
            Ok(model) => self.model = model,
            Err(e) => {
                tracing::warn!(error = %e, "cannot reload session");
                self.status_message = Some((format!("Reload failed: {e}"), Instant::now()));
            }
        }
    }

    /// Returns (key_label, description) pairs for the help overlay.
    pub fn help_entries(&self) -> Vec<(String, &'static str)> {
        vec![
            ("q".to_string(), "Quit"),
            ("Tab".to_string(), "Cycle cpu / mem views"),
            ("l".to_string(), "Toggle legend"),
            ("r".to_string(), "Reload session"),
            ("?".to_string(), "Toggle help"),
            ("Ctrl+C".to_string(), "Quit (always)"),
        ]
    }
}
