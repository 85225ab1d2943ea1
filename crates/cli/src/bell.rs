//! Terminal bell notifications.

use std::io::stdout;

use crossterm::execute;
use crossterm::style::Print;
use script_monitor_core::error::{Error, Result};
use script_monitor_core::notification::Notifier;

/// Rings the terminal bell for every event a running script reports.
#[derive(Debug, Clone, Copy)]
pub struct TerminalBell {
    enabled: bool,
}

impl TerminalBell {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Notifier for TerminalBell {
    fn notify(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        execute!(stdout(), Print("\x07"))
            .map_err(|e| Error::NotificationFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_bell_is_silent() {
        assert!(TerminalBell::new(false).notify().is_ok());
    }
}
