#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    CycleFocus,
    ToggleLegend,
    ToggleHelp,
    Reload,
    None,
}
