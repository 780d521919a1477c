use std::fmt;

use log::Level;

/// Diagnostic text reported by the device for a compile or link step.
///
/// Drivers terminate logs with NUL and often pad them with newlines; both are
/// stripped. An empty log carries no information (the device reported a log
/// length of at most one terminator).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoLog(String);

impl InfoLog {
    pub fn new(raw: impl Into<String>) -> Self {
        let mut text = raw.into();
        let keep = text.trim_end_matches(|c: char| c == '\0' || c.is_whitespace()).len();
        text.truncate(keep);
        Self(text)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InfoLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Level a compile/link outcome is reported at: failures at `error`, a
/// successful step with a non-empty log (driver warnings) at `warn`.
fn outcome_level(ok: bool, log: &InfoLog) -> Level {
    match (ok, log.is_empty()) {
        (false, _) => Level::Error,
        (true, false) => Level::Warn,
        (true, true) => Level::Debug,
    }
}

/// Surfaces a compile/link outcome on the logging side channel.
///
/// `target` is the caller's module path, so per-module filters such as
/// `outline_engine::shader::program=debug` select the step that ran.
pub(super) fn log_outcome(target: &str, what: &str, ok: bool, log: &InfoLog) {
    let level = outcome_level(ok, log);
    match (ok, log.is_empty()) {
        (_, true) => {
            let verdict = if ok { "succeeded" } else { "failed" };
            log::log!(target: target, level, "{what} {verdict}");
        }
        (false, false) => log::log!(target: target, level, "{what} failed:\n{log}"),
        (true, false) => log::log!(target: target, level, "{what} succeeded with diagnostics:\n{log}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminator_only_log_is_empty() {
        assert!(InfoLog::new("\0").is_empty());
        assert!(InfoLog::new("\n\0").is_empty());
        assert!(InfoLog::new("").is_empty());
    }

    #[test]
    fn trailing_padding_is_stripped() {
        let log = InfoLog::new("ERROR: 0:2: syntax error\n\0");
        assert_eq!(log.as_str(), "ERROR: 0:2: syntax error");
        assert_eq!(log.to_string(), "ERROR: 0:2: syntax error");
    }

    #[test]
    fn failures_log_at_error_and_warnings_at_warn() {
        let empty = InfoLog::default();
        let text = InfoLog::new("WARNING: 0:3: unused variable");

        assert_eq!(outcome_level(false, &empty), Level::Error);
        assert_eq!(outcome_level(false, &text), Level::Error);
        assert_eq!(outcome_level(true, &text), Level::Warn);
        assert_eq!(outcome_level(true, &empty), Level::Debug);
    }
}
