//! Wait before the process exits
//!
//! redelim is usually started by double-clicking it, so the console window
//! would vanish with the summary still on it. The pause keeps it open until
//! the user presses Enter, or for a fixed delay when nobody can press Enter.

use console::Term;
use std::io::IsTerminal;
use std::time::Duration;

/// Default delay when no terminal is attached
pub const DEFAULT_PAUSE_SECS: u64 = 5;

/// How teardown waits before exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseMode {
    /// Wait for the user to press Enter
    Prompt,
    /// Sleep for a fixed time
    Delay(Duration),
    /// Exit immediately
    Skip,
}

impl PauseMode {
    /// Pick the mode for this process.
    ///
    /// `no_pause` always wins. Otherwise an attended terminal gets a prompt
    /// and anything else gets a delay of `delay_secs` (0 skips).
    pub fn resolve(no_pause: bool, delay_secs: u64) -> Self {
        Self::choose(no_pause, is_interactive(), delay_secs)
    }

    fn choose(no_pause: bool, interactive: bool, delay_secs: u64) -> Self {
        if no_pause {
            PauseMode::Skip
        } else if interactive {
            PauseMode::Prompt
        } else if delay_secs == 0 {
            PauseMode::Skip
        } else {
            PauseMode::Delay(Duration::from_secs(delay_secs))
        }
    }

    /// Block according to the mode. Terminal errors end the wait early.
    pub fn wait(&self) {
        match self {
            PauseMode::Prompt => {
                let term = Term::stdout();
                let _ = term.write_line("Press Enter to exit...");
                let _ = term.read_line();
            },
            PauseMode::Delay(delay) => {
                let _ = Term::stdout()
                    .write_line(&format!("Closing in {} seconds...", delay.as_secs()));
                std::thread::sleep(*delay);
            },
            PauseMode::Skip => {},
        }
    }
}

fn is_interactive() -> bool {
    console::user_attended() && std::io::stdin().is_terminal()
}
