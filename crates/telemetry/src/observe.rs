//! The operation observer: start/end/error event emission
//!
//! Explicit wrapper replacing aspect-style interception: the business
//! layer calls [`observed`] around an operation and gets exactly one start
//! event and exactly one end *or* error event, all correlated by the
//! task-local [`CorrelationId`](crate::CorrelationId).
//!
//! Emission goes through `tracing` and is fire-and-forget; the wrapped
//! operation's error always propagates unchanged.

use axum::http::StatusCode;
use gantry_common::{Error, Result};
use std::future::Future;

use crate::component::{Component, ComponentFilter};
use crate::correlation;

/// Target all observer events are emitted under
pub const EVENT_TARGET: &str = "gantry::observe";

/// Which hook phases are active for an operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phases {
    #[default]
    All,
    StartOnly,
    EndOnly,
}

impl Phases {
    fn start_active(self) -> bool {
        matches!(self, Phases::All | Phases::StartOnly)
    }

    fn end_active(self) -> bool {
        matches!(self, Phases::All | Phases::EndOnly)
    }
}

/// Declarative observer configuration, one per wrapped operation
#[derive(Debug, Clone, Default)]
pub struct ObserveConfig {
    pub filter: ComponentFilter,
    pub phases: Phases,
    /// Crate/module prefix counting as "own code" in error-chain rendering
    pub base_crate: Option<String>,
    /// Highlight own-code lines in the rendered error chain
    pub highlight: bool,
}

impl ObserveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: ComponentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn phases(mut self, phases: Phases) -> Self {
        self.phases = phases;
        self
    }

    pub fn base_crate(mut self, prefix: impl Into<String>) -> Self {
        self.base_crate = Some(prefix.into());
        self
    }

    pub fn highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }
}

/// Identity of the wrapped operation and its caller
#[derive(Debug, Clone, Default)]
pub struct OperationInfo {
    pub type_name: String,
    pub op_name: String,
    pub user: Option<String>,
    pub service: Option<String>,
    pub feature_code: Option<String>,
}

impl OperationInfo {
    pub fn new(type_name: impl Into<String>, op_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            op_name: op_name.into(),
            user: None,
            service: None,
            feature_code: None,
        }
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn feature_code(mut self, code: impl Into<String>) -> Self {
        self.feature_code = Some(code.into());
        self
    }
}

/// Wrap an operation with correlated start/end/error log events.
///
/// Per invocation exactly one of the end/error events fires and the
/// operation's error is re-raised unchanged. The outermost invocation on
/// a scope clears the scope on both paths; nested invocations share its
/// identifier, and a nested failure suppresses the outer end event.
pub async fn observed<T, F, Fut>(config: &ObserveConfig, info: &OperationInfo, op: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    // The outermost wrapper on this scope owns the id lifecycle; nested
    // invocations reuse it and leave scope state in place on exit.
    let owner = correlation::current().is_none();
    let id = correlation::ensure();
    if owner {
        correlation::reset_errored();
    }

    if config.phases.start_active() {
        tracing::info!(
            target: EVENT_TARGET,
            phase = "start",
            "{}",
            start_message(config, info, id)
        );
    }

    let result = op().await;

    match &result {
        Err(err) => {
            correlation::mark_errored();
            if config.phases.end_active() {
                tracing::error!(
                    target: EVENT_TARGET,
                    phase = "error",
                    "{}",
                    error_message(config, info, id, err)
                );
            }
        }
        Ok(_) => {
            // The errored flag suppresses the end event even when an inner
            // wrapper already reported a failure on this scope.
            if config.phases.end_active() && !correlation::is_errored() {
                tracing::info!(
                    target: EVENT_TARGET,
                    phase = "end",
                    "{}",
                    end_message(config, info, id)
                );
            }
        }
    }

    if owner {
        correlation::clear();
    }
    result
}

/// Render the start-event message from the effective component set
pub fn start_message(
    config: &ObserveConfig,
    info: &OperationInfo,
    id: correlation::CorrelationId,
) -> String {
    common_fields(&config.filter, info, id).join(" ")
}

/// Render the end-event message, including elapsed time
pub fn end_message(
    config: &ObserveConfig,
    info: &OperationInfo,
    id: correlation::CorrelationId,
) -> String {
    let mut fields = common_fields(&config.filter, info, id);
    if config.filter.emits(Component::ElapsedTime) {
        fields.push(format!("elapsed_ms={}", id.elapsed_ms()));
    }
    fields.join(" ")
}

/// Render the error-event message: status, exception summary, and an
/// optional colorized error-chain block
pub fn error_message(
    config: &ObserveConfig,
    info: &OperationInfo,
    id: correlation::CorrelationId,
    err: &Error,
) -> String {
    let mut fields = common_fields(&config.filter, info, id);
    if config.filter.emits(Component::ElapsedTime) {
        fields.push(format!("elapsed_ms={}", id.elapsed_ms()));
    }
    if config.filter.emits(Component::Status) {
        fields.push(format!("status=\"{}\"", status_label(err.status_code())));
    }
    if config.filter.emits(Component::Exception) {
        fields.push(format!("error=\"{err}\""));
    }
    let mut message = fields.join(" ");
    if config.filter.emits(Component::StackTrace) {
        message.push('\n');
        message.push_str(&render_error_chain(
            err,
            config.base_crate.as_deref(),
            config.highlight,
        ));
    }
    message
}

fn common_fields(
    filter: &ComponentFilter,
    info: &OperationInfo,
    id: correlation::CorrelationId,
) -> Vec<String> {
    let mut fields = Vec::new();
    if filter.emits(Component::ClassName) {
        fields.push(format!("class={}", info.type_name));
    }
    if filter.emits(Component::FunctionName) {
        fields.push(format!("fn={}", info.op_name));
    }
    if filter.emits(Component::User) {
        if let Some(user) = &info.user {
            fields.push(format!("user={user}"));
        }
    }
    if filter.emits(Component::Service) {
        if let Some(service) = &info.service {
            fields.push(format!("service={service}"));
        }
    }
    if filter.emits(Component::FeatureCode) {
        if let Some(code) = &info.feature_code {
            fields.push(format!("feature={code}"));
        }
    }
    if filter.emits(Component::Id) {
        fields.push(format!("id={id}"));
    }
    fields
}

/// Short human form of an HTTP status, e.g. `409 Conflict`
pub fn status_label(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD_YELLOW: &str = "\x1b[1;33m";
const RESET: &str = "\x1b[0m";

/// Multi-line colorized rendering of an error and its source chain.
///
/// Lines containing the configured own-code prefix are highlighted when
/// `highlight` is set.
pub fn render_error_chain(err: &Error, base_crate: Option<&str>, highlight: bool) -> String {
    let own = |text: &str| {
        highlight
            && base_crate
                .map(|prefix| text.contains(prefix))
                .unwrap_or(false)
    };
    let paint = |text: String, default: &str| {
        if own(&text) {
            format!("{BOLD_YELLOW}{text}{RESET}")
        } else {
            format!("{default}{text}{RESET}")
        }
    };

    let mut lines = vec![paint(err.to_string(), RED)];
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        lines.push(paint(format!("  caused by: {cause}"), DIM));
        source = cause.source();
    }
    lines.join("\n")
}
