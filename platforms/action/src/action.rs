use keymap::KeyMap;

#[derive(KeyMap, Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Quit the application
    #[key("q")]
    Quit,
    /// Start executing from the initial state
    #[key("x")]
    Execute,
    /// Stop the machine
    #[key("s")]
    Stop,
    /// Take one phase of the step cycle
    #[key("enter")]
    Advance,
    /// Toggle auto-play
    #[key("p")]
    ToggleAutoPlay,
    /// Enter or leave sheet input mode
    #[key("e")]
    ToggleInputMode,
    /// Move the head left
    #[key("left")]
    HeadLeft,
    /// Move the head right
    #[key("right")]
    HeadRight,
    /// Write 1 into the hovered tape cell
    #[key("1")]
    WriteOne,
    /// Write 0 into the hovered tape cell
    #[key("0")]
    WriteZero,
    /// Write a blank into the hovered tape cell
    #[key("b")]
    WriteBlank,
    /// Clear the hovered sheet slot
    #[key("delete")]
    Delete,
    /// Toggle help display
    #[key("h")]
    ToggleHelp,
    /// Load the previous preset
    #[key("pageup")]
    PreviousPreset,
    /// Load the next preset
    #[key("pagedown")]
    NextPreset,
}
