//! Driving the controller from the terminal until a session ends.

use log::info;
use script_monitor_core::controller::SessionController;
use script_monitor_core::error::Result;
use script_monitor_core::process::SessionMessage;

use crate::output::Printer;

enum Step {
    Message(Option<SessionMessage>),
    Interrupt,
}

/// Applies process output and prints signals until the controller is idle.
///
/// Ctrl-C stops the active session instead of exiting.
pub async fn drive(controller: &mut SessionController, printer: &Printer) -> Result<()> {
    loop {
        let signals = controller.take_signals();
        printer.print_signals(controller, &signals)?;

        if !controller.is_busy() {
            return Ok(());
        }

        let step = tokio::select! {
            message = controller.next_message() => Step::Message(message),
            _ = tokio::signal::ctrl_c() => Step::Interrupt,
        };

        match step {
            Step::Message(Some(message)) => controller.handle(message),
            Step::Message(None) => return Ok(()),
            Step::Interrupt => {
                info!("Interrupted, stopping script");
                controller.stop().await;
            }
        }
    }
}
