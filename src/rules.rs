//! Rule gating: sandboxed boolean evaluation of rule scripts.
//!
//! Script execution is an injected capability (`ScriptRunner`), not a
//! hard-wired interpreter: the host supplies a runner with access to its
//! live selection API, the core only validates scripts, routes them through
//! the runner and contains their failures. A failing rule never aborts a
//! resolution pass; it simply contributes `false`.

use crate::error::RuleError;
use crate::header::Header;
use crate::store::OrdinalStore;
use crate::types::Selection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Variable a rule script must assign its boolean verdict to.
pub const RESULT_VARIABLE: &str = "ret";

/// Marker runners place on the stack frames of their own injected prelude.
/// Frames at or above the marker are hidden from logged traces.
pub const INJECTION_MARKER: &str = "<hotbox/rule>";

/// Failure raised by a runner while executing a rule script.
#[derive(Debug, Clone)]
pub struct ScriptFailure {
    pub message: String,
    /// Stack frames, outermost first.
    pub trace: Vec<String>,
}

impl ScriptFailure {
    pub fn new(message: impl Into<String>) -> Self {
        ScriptFailure {
            message: message.into(),
            trace: Vec::new(),
        }
    }
}

/// Execution boundary for rule scripts.
///
/// The runner receives the raw script source (header included) and the
/// selection context, and must seed the result variable with `false` before
/// handing control to the script.
pub trait ScriptRunner {
    fn eval_rule(&self, source: &str, selection: &Selection) -> Result<bool, ScriptFailure>;
}

impl<F> ScriptRunner for F
where
    F: Fn(&str, &Selection) -> Result<bool, ScriptFailure>,
{
    fn eval_rule(&self, source: &str, selection: &Selection) -> Result<bool, ScriptFailure> {
        self(source, selection)
    }
}

/// Outcome of a rule that evaluated `true`.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    /// The rule folder whose item subtree joins the resolution pass.
    pub path: PathBuf,
    /// When set, class-based folder lookup is skipped for the whole pass.
    pub ignore_classes: bool,
}

/// Static validation: the script must textually contain an assignment to
/// the result variable. Invalid scripts are never executed.
pub fn validate(source: &str, path: &Path) -> Result<(), RuleError> {
    let compact: String = source.chars().filter(|c| *c != ' ' && *c != '\t').collect();
    if compact.contains(&format!("{}=", RESULT_VARIABLE)) {
        Ok(())
    } else {
        Err(RuleError::MissingResultVariable {
            path: path.to_path_buf(),
            variable: RESULT_VARIABLE,
        })
    }
}

/// Evaluate the gating script of one rule folder.
///
/// Returns `Some` only when the folder holds a valid script that evaluates
/// `true`. Validation and evaluation failures are logged and collapse to
/// `None`, so resolution simply skips the rule.
pub fn evaluate_rule(
    store: &OrdinalStore,
    runner: &dyn ScriptRunner,
    rule_dir: &Path,
    selection: &Selection,
) -> Option<RuleMatch> {
    let script_path = rule_dir.join(store.rule_file_name());
    if !script_path.is_file() {
        return None;
    }

    debug!(rule = %rule_dir.display(), "validating rule");

    let source = match fs::read_to_string(&script_path) {
        Ok(source) => source,
        Err(err) => {
            let err = RuleError::Io(err);
            warn!(rule = %rule_dir.display(), %err, "rule script unreadable, skipping");
            return None;
        }
    };

    if let Err(err) = validate(&source, &script_path) {
        warn!(rule = %rule_dir.display(), %err, "rule rejected by validation");
        return None;
    }

    match runner.eval_rule(&source, selection) {
        Ok(true) => {
            let ignore_classes = Header::parse(&source).ignore_classes;
            Some(RuleMatch {
                path: rule_dir.to_path_buf(),
                ignore_classes,
            })
        }
        Ok(false) => None,
        Err(failure) => {
            let visible = truncate_trace(&failure.trace, INJECTION_MARKER);
            let err = RuleError::Evaluation {
                path: script_path,
                message: failure.message,
            };
            error!(
                %err,
                trace = %visible.join("\n"),
                "rule evaluation failed, treating as false"
            );
            None
        }
    }
}

/// Keep only the frames below the runner's injection boundary, so logged
/// traces point at the rule author's code rather than the runner's prelude.
pub fn truncate_trace<'a>(trace: &'a [String], marker: &str) -> &'a [String] {
    match trace.iter().rposition(|frame| frame.contains(marker)) {
        Some(index) => &trace[index + 1..],
        None => trace,
    }
}
