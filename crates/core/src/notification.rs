use crate::error::Result;

/// Audible cue fired after each structured event of a run.
///
/// Implementations are best-effort: the controller logs failures and carries on.
pub trait Notifier: Send {
    fn notify(&self) -> Result<()>;
}

/// A notifier that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self) -> Result<()> {
        Ok(())
    }
}
