//! Session commands and key bindings.
//!
//! Commands are a closed enum decoupled from physical input codes; the
//! surface delivers raw key characters and `command_for_key` maps them.
//! Unrecognized keys map to nothing and are no-ops.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    TogglePlayPause,
    StepBack,
    StepForward,
    StageCurrent,
    StageAll,
    ToggleAutostage,
    ResetCurrent,
    ResetAll,
    Save,
    MarkSpanStart,
    MarkSpanEnd,
    SpeedUp,
    SlowDown,
    ReinitFromUnstaged,
    ReinitFromStaged,
    ToggleTracking,
    JumpToSpanStart,
    JumpToSpanEnd,
    Help,
}

const ESCAPE: char = '\x1b';

/// Key bindings. The historical bindings (Esc, Space, j/k, 1, a, c, 2, r, s,
/// parens, +/-) are kept; q quits alongside Esc for line-oriented input.
const BINDINGS: &[(char, Command, &str)] = &[
    (ESCAPE, Command::Quit, "quit"),
    ('q', Command::Quit, "quit"),
    (' ', Command::TogglePlayPause, "toggle play/pause"),
    ('j', Command::StepBack, "step back one frame (paused)"),
    ('k', Command::StepForward, "step forward one frame (paused)"),
    ('1', Command::StageCurrent, "stage current frame (paused)"),
    ('a', Command::StageAll, "stage all frames (paused)"),
    ('c', Command::ToggleAutostage, "toggle autostage"),
    ('2', Command::ResetCurrent, "reset current frame from staged"),
    ('r', Command::ResetAll, "reset all frames from staged"),
    ('s', Command::Save, "save (export the staged span)"),
    ('(', Command::MarkSpanStart, "mark span start at current frame"),
    (')', Command::MarkSpanEnd, "mark span end at current frame"),
    ('+', Command::SpeedUp, "speed up playback (halve interval)"),
    ('-', Command::SlowDown, "slow down playback (double interval)"),
    ('u', Command::ReinitFromUnstaged, "re-init tracker from unstaged box"),
    ('i', Command::ReinitFromStaged, "re-init tracker from staged box"),
    ('t', Command::ToggleTracking, "toggle tracking on/off"),
    ('b', Command::JumpToSpanStart, "jump to span start"),
    ('e', Command::JumpToSpanEnd, "jump to span end"),
    ('h', Command::Help, "print this command table"),
];

/// Map a key character to its command, if any.
pub fn command_for_key(key: char) -> Option<Command> {
    BINDINGS
        .iter()
        .find(|(bound, _, _)| *bound == key)
        .map(|(_, command, _)| *command)
}

/// Human-readable command table, one binding per line.
pub fn help_text() -> String {
    let mut out = String::from("commands:\n");
    for (key, _, description) in BINDINGS {
        let label = match *key {
            ESCAPE => "Esc".to_string(),
            ' ' => "Space".to_string(),
            other => other.to_string(),
        };
        out.push_str(&format!("  {:<5} {}\n", label, description));
    }
    out.push_str("  box x1 y1 x2 y2   seed the tracker with a rectangle\n");
    out
}
