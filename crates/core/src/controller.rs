//! Session state machine tying the catalog, process and protocol together.
//!
//! [`SessionController`] owns the active [`ProcessSession`] and every collection
//! the UI shows. Output from the process arrives as [`SessionMessage`]s on a
//! channel and is applied only through [`SessionController::handle`], so all
//! mutation happens on whichever task owns the controller. Changes are reported
//! to the UI as explicit [`UiSignal`]s.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Local};
use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::arguments::build_arguments;
use crate::classify::{classify, classify_buffered, ClassifiedLine};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::interpolation::apply_substitutions;
use crate::notification::Notifier;
use crate::process::{
    CapturedOutput, Launch, MessageSender, Mode, ProcessEvent, ProcessSession, RawLine,
    SessionId, SessionMessage, StreamKind,
};
use crate::protocol::{decode, ScriptEvent};
use crate::script_definitions::{ArgumentField, ScriptDescriptor, Tag, TemplateSentence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    PreviewRunning,
    Running,
    Stopping,
}

/// A timestamped status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub at: DateTime<Local>,
    pub text: String,
}

impl StatusLine {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            at: Local::now(),
            text: text.into(),
        }
    }
}

impl Display for StatusLine {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "[{}] {}", self.at.format("%H:%M:%S"), self.text)
    }
}

/// What changed since the UI last looked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiSignal {
    Status(StatusLine),
    StateChanged(SessionState),
    TagsReplaced,
    TemplatesReplaced,
    TemplatesUpdated,
    FieldsReplaced,
    DisplayNameChanged(String),
    MonitorUrlChanged(String),
    FoundUrlChanged(String),
}

pub struct SessionController {
    settings: Settings,
    notifier: Box<dyn Notifier>,
    state: SessionState,
    script: Option<ScriptDescriptor>,
    session: Option<ProcessSession>,
    next_session_id: SessionId,
    sender: MessageSender,
    receiver: mpsc::UnboundedReceiver<SessionMessage>,
    tags: Vec<Tag>,
    templates: Vec<TemplateSentence>,
    fields: Vec<ArgumentField>,
    argument_values: HashMap<String, String>,
    monitor_url: Option<String>,
    found_url: Option<String>,
    status: Option<StatusLine>,
    signals: Vec<UiSignal>,
}

impl SessionController {
    pub fn new(settings: Settings, notifier: impl Notifier + 'static) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            settings,
            notifier: Box::new(notifier),
            state: SessionState::Idle,
            script: None,
            session: None,
            next_session_id: 1,
            sender,
            receiver,
            tags: Vec::new(),
            templates: Vec::new(),
            fields: Vec::new(),
            argument_values: HashMap::new(),
            monitor_url: None,
            found_url: None,
            status: None,
            signals: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a preview or run is in flight.
    pub fn is_busy(&self) -> bool {
        self.state != SessionState::Idle
    }

    pub fn script(&self) -> Option<&ScriptDescriptor> {
        self.script.as_ref()
    }

    pub fn active_session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(ProcessSession::id)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn templates(&self) -> &[TemplateSentence] {
        &self.templates
    }

    pub fn fields(&self) -> &[ArgumentField] {
        &self.fields
    }

    pub fn argument_values(&self) -> &HashMap<String, String> {
        &self.argument_values
    }

    pub fn monitor_url(&self) -> Option<&str> {
        self.monitor_url.as_deref()
    }

    pub fn found_url(&self) -> Option<&str> {
        self.found_url.as_deref()
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    /// Drains the signals raised since the last call.
    pub fn take_signals(&mut self) -> Vec<UiSignal> {
        std::mem::take(&mut self.signals)
    }

    /// Makes `descriptor` the current script and previews it.
    ///
    /// Any active session is stopped first.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter cannot be found or started.
    pub async fn select_script(&mut self, descriptor: ScriptDescriptor) -> Result<()> {
        self.stop().await;
        info!("Selected script `{}`", descriptor.file_path.display());
        self.script = Some(descriptor);
        self.preview().await
    }

    /// Previews the current script again, discarding tags, templates and
    /// argument fields.
    ///
    /// # Errors
    ///
    /// Returns an error if no script is selected or the interpreter cannot be
    /// found or started.
    pub async fn preview(&mut self) -> Result<()> {
        let Some(script) = self.script.clone() else {
            self.set_status("No script selected to run.");
            return Err(Error::NoScriptSelected);
        };

        self.stop().await;
        self.clear_collections();

        self.set_status(format!("Running {} with preview...", script.display_name));
        self.start_session(script, Mode::Preview, Vec::new())?;
        self.set_state(SessionState::PreviewRunning);
        Ok(())
    }

    /// Starts the current script, or stops it if it is already running.
    ///
    /// A preview still in flight is cancelled first.
    ///
    /// # Errors
    ///
    /// Returns an error if no script is selected or the interpreter cannot be
    /// found or started.
    pub async fn run(&mut self) -> Result<()> {
        if self.state == SessionState::Running {
            self.stop().await;
            return Ok(());
        }

        let Some(script) = self.script.clone() else {
            self.set_status("No script selected to run.");
            return Err(Error::NoScriptSelected);
        };

        self.stop().await;

        let arguments = build_arguments(&self.fields, &self.argument_values);
        debug!("Run arguments: {:?}", arguments);

        self.set_status(format!("Running {}...", script.display_name));
        self.start_session(script, Mode::Run, arguments)?;
        self.set_state(SessionState::Running);
        Ok(())
    }

    /// Kills the active session. Does nothing when idle.
    ///
    /// Once this returns, no output of the stopped session will be applied.
    pub async fn stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            self.set_state(SessionState::Idle);
            return;
        };

        let mode = session.mode();
        info!(
            "Stopping {} after {:?}",
            session.descriptor().file_name,
            session.elapsed()
        );
        self.set_state(SessionState::Stopping);
        session.stop().await;
        drop(session);
        self.discard_pending();
        self.set_state(SessionState::Idle);

        match mode {
            Mode::Run => self.set_status("Script stopped"),
            Mode::Preview => self.set_status("Preview cancelled"),
        }
    }

    /// Waits for the next message from the active session's process.
    pub async fn next_message(&mut self) -> Option<SessionMessage> {
        self.receiver.recv().await
    }

    /// Processes messages until the controller is idle again.
    pub async fn run_until_idle(&mut self) {
        while self.is_busy() {
            match self.next_message().await {
                Some(message) => self.handle(message),
                None => break,
            }
        }
    }

    /// Applies one message from a process session.
    ///
    /// Messages from sessions other than the active one are dropped.
    pub fn handle(&mut self, message: SessionMessage) {
        if self.active_session_id() != Some(message.session) {
            debug!("Discarding message from stale session {}", message.session);
            return;
        }

        match message.event {
            ProcessEvent::Line(line) => self.handle_line(line),
            ProcessEvent::Finished {
                exit_code,
                captured,
            } => self.handle_finished(exit_code, captured),
            ProcessEvent::TimedOut => {
                self.set_state(SessionState::Stopping);
                let timed_out = Error::TimedOut(self.settings.run_timeout);
                warn!("{}", timed_out);
                self.set_status(format!("{timed_out} - stopping process"));
            }
            ProcessEvent::Killed => {
                self.session = None;
                self.set_state(SessionState::Idle);
            }
        }
    }

    /// Replaces the formatted text of template `index` with a user edit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateIndex`] if there is no such template.
    pub fn edit_template(&mut self, index: usize, text: impl Into<String>) -> Result<bool> {
        let count = self.templates.len();
        let template = self
            .templates
            .get_mut(index)
            .ok_or(Error::TemplateIndex(index, count))?;

        let changed = template.set_formatted_text(text);
        if changed {
            self.signals.push(UiSignal::TemplatesUpdated);
            self.set_status("Template updated");
        }
        Ok(changed)
    }

    /// Restores template `index` to its original text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateIndex`] if there is no such template.
    pub fn reset_template(&mut self, index: usize) -> Result<bool> {
        let count = self.templates.len();
        let template = self
            .templates
            .get_mut(index)
            .ok_or(Error::TemplateIndex(index, count))?;

        let changed = template.reset();
        if changed {
            self.signals.push(UiSignal::TemplatesUpdated);
        }
        self.set_status("Reset to template");
        Ok(changed)
    }

    /// Appends an empty template for the user to fill in and returns its index.
    pub fn add_template(&mut self) -> usize {
        self.templates.push(TemplateSentence::new(String::new()));
        self.signals.push(UiSignal::TemplatesReplaced);
        self.set_status("Added a new template sentence.");
        self.templates.len() - 1
    }

    /// Sets the value typed for an argument field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownArgument`] if the current script declares no
    /// field called `name`.
    pub fn set_argument_value(&mut self, name: &str, value: impl Into<String>) -> Result<bool> {
        if !self.fields.iter().any(|field| field.name == name) {
            return Err(Error::UnknownArgument(name.to_string()));
        }

        let value = value.into();
        let changed = self.argument_values.get(name) != Some(&value);
        self.argument_values.insert(name.to_string(), value);
        Ok(changed)
    }

    fn start_session(
        &mut self,
        script: ScriptDescriptor,
        mode: Mode,
        arguments: Vec<String>,
    ) -> Result<()> {
        let launch = self.settings.resolve_interpreter().map(|interpreter| Launch {
            interpreter,
            script: script.file_path.clone(),
            arguments,
            environment: self.settings.interpreter.environment.clone(),
            bundled_runtime: self.settings.interpreter.bundled_runtime,
            run_timeout: self.settings.run_timeout,
            stop_grace: self.settings.stop_grace,
        });

        let id = self.next_session_id;
        let started = launch.and_then(|launch| {
            ProcessSession::start(id, script, mode, &launch, self.sender.clone())
        });

        match started {
            Ok(session) => {
                self.next_session_id += 1;
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                warn!("Could not start script: {}", e);
                self.set_state(SessionState::Idle);
                self.set_status(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    fn handle_line(&mut self, line: RawLine) {
        if self.state != SessionState::Running {
            debug!("Ignoring output while {:?}: {}", self.state, line.text);
            return;
        }

        if line.stream == StreamKind::Stderr {
            self.set_status(format!("Error: {}", line.text));
            return;
        }

        match classify(&line.text) {
            ClassifiedLine::Structured(object) => {
                debug!("Script event: {}", line.text);
                self.apply_run_event(decode(&object));
            }
            ClassifiedLine::Status(text) => self.set_status(text),
            ClassifiedLine::Malformed { error, .. } => {
                warn!("Malformed event line `{}`: {}", line.text, error);
                self.set_status(error);
            }
        }
    }

    fn handle_finished(&mut self, exit_code: Option<i32>, captured: Option<CapturedOutput>) {
        let mode = self.session.take().map(|session| {
            info!(
                "{} finished after {:?}",
                session.descriptor().file_name,
                session.elapsed()
            );
            session.mode()
        });
        self.set_state(SessionState::Idle);

        match (mode, exit_code) {
            (Some(Mode::Preview), Some(0)) => {
                let captured = captured.unwrap_or_default();
                self.apply_preview_output(&captured.stdout);
            }
            (Some(Mode::Preview), code) => {
                if let Some(captured) = captured.filter(|c| !c.stderr.is_empty()) {
                    warn!("Preview stderr:\n{}", captured.stderr.trim_end());
                }
                match code {
                    Some(code) => {
                        self.set_status(format!("Error running script: Exit code {code}"))
                    }
                    None => self.set_status("Error running script: terminated by a signal"),
                }
            }
            (_, Some(0)) => self.set_status("Script completed successfully"),
            (_, Some(code)) => {
                info!("{}", Error::ProcessExitNonZero(code));
                self.set_status(format!("Script terminated: {code}"));
            }
            (_, None) => self.set_status("Script terminated by a signal"),
        }
    }

    fn apply_preview_output(&mut self, stdout: &str) {
        match classify_buffered(stdout) {
            ClassifiedLine::Structured(object) => {
                self.apply_preview_event(decode(&object));
                let name = self
                    .script
                    .as_ref()
                    .map(|script| script.display_name.clone())
                    .unwrap_or_default();
                self.set_status(format!("Preview loaded for {name}"));
            }
            ClassifiedLine::Status(text) if text.is_empty() => {
                self.set_status("Preview produced no output");
            }
            ClassifiedLine::Status(text) => self.set_status(text),
            ClassifiedLine::Malformed { error, .. } => {
                warn!("Malformed preview output: {}", error);
                self.set_status(error);
            }
        }
    }

    fn apply_preview_event(&mut self, event: ScriptEvent) {
        if let Some(script) = self.script.as_mut() {
            if let Some(name) = event.decorated_display_name(&script.display_name) {
                if name != script.display_name {
                    script.display_name = name.clone();
                    self.signals.push(UiSignal::DisplayNameChanged(name));
                }
            }
        }

        if let Some(tags) = event.tags.clone() {
            self.tags = tags;
            self.signals.push(UiSignal::TagsReplaced);
        }

        if let Some(templates) = event.replacement_templates() {
            self.templates = templates;
            self.signals.push(UiSignal::TemplatesReplaced);
        }

        if let Some(fields) = event.fields.clone() {
            self.fields = fields;
            self.signals.push(UiSignal::FieldsReplaced);
        }

        self.apply_urls(&event);
    }

    fn apply_run_event(&mut self, event: ScriptEvent) {
        if let Some(templates) = event.replacement_templates() {
            self.templates = templates;
            self.signals.push(UiSignal::TemplatesReplaced);
            self.set_status("Template sentences updated.");
        }

        self.apply_urls(&event);

        if apply_substitutions(&event.values, &mut self.templates) > 0 {
            self.signals.push(UiSignal::TemplatesUpdated);
        }

        if let Err(e) = self.notifier.notify() {
            warn!("{}", e);
        }
    }

    fn apply_urls(&mut self, event: &ScriptEvent) {
        if let Some(url) = &event.monitor_url {
            if self.monitor_url.as_ref() != Some(url) {
                self.monitor_url = Some(url.clone());
                self.signals.push(UiSignal::MonitorUrlChanged(url.clone()));
            }
        }

        if let Some(url) = &event.found_url {
            if self.found_url.as_ref() != Some(url) {
                self.found_url = Some(url.clone());
                self.signals.push(UiSignal::FoundUrlChanged(url.clone()));
            }
        }
    }

    fn clear_collections(&mut self) {
        self.tags.clear();
        self.templates.clear();
        self.fields.clear();
        self.argument_values.clear();
        self.monitor_url = None;
        self.found_url = None;
        self.signals.push(UiSignal::TagsReplaced);
        self.signals.push(UiSignal::TemplatesReplaced);
        self.signals.push(UiSignal::FieldsReplaced);
    }

    /// Drops messages already queued by sessions that are no longer active.
    fn discard_pending(&mut self) {
        let mut discarded = 0;
        while self.receiver.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!("Discarded {} messages from stopped sessions", discarded);
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!("State {:?} -> {:?}", self.state, state);
            self.state = state;
            self.signals.push(UiSignal::StateChanged(state));
        }
    }

    fn set_status(&mut self, text: impl Into<String>) {
        let status = StatusLine::now(text);
        info!("Status: {}", status.text);
        self.status = Some(status.clone());
        self.signals.push(UiSignal::Status(status));
    }
}
