//! Isolated script evaluation for in-place content transforms.

use boa_engine::{Context, Source};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Runtime hardening knobs for every evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub recursion_limit: usize,
    pub stack_size_limit: usize,
    pub loop_iteration_limit: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            recursion_limit: 64,
            stack_size_limit: 1024,
            loop_iteration_limit: 100_000,
        }
    }
}

/// Runs snippets in a fresh context that only sees `data`, `cancel()` and
/// `write(text)`.
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Evaluates `source` against `data` (an empty object when absent).
    /// Returns the concatenated `write` output, or `None` when the snippet
    /// called `cancel()`, threw, or ran into a runtime limit.
    pub fn evaluate(&self, source: &str, data: Option<&Value>) -> Option<String> {
        let empty = Value::Object(Default::default());
        let program = match wrap(source, data.unwrap_or(&empty)) {
            Ok(program) => program,
            Err(err) => {
                tracing::debug!(%err, "failed to embed script");
                return None;
            }
        };

        let mut context = Context::default();
        context
            .runtime_limits_mut()
            .set_recursion_limit(self.config.recursion_limit);
        context
            .runtime_limits_mut()
            .set_stack_size_limit(self.config.stack_size_limit);
        context
            .runtime_limits_mut()
            .set_loop_iteration_limit(self.config.loop_iteration_limit);

        let value = match context.eval(Source::from_bytes(program.as_bytes())) {
            Ok(value) => value,
            Err(error) => {
                tracing::debug!(%error, "script aborted");
                return None;
            }
        };
        if value.is_null() || value.is_undefined() {
            return None;
        }
        let text = value.to_string(&mut context).ok()?;
        Some(text.to_std_string_escaped())
    }
}

/// Builds the program in one pass so neither literal is rescanned for the
/// other's placeholder.
fn wrap(source: &str, data: &Value) -> Result<String, serde_json::Error> {
    let data_literal = serde_json::to_string(&serde_json::to_string(data)?)?;
    let source_literal = serde_json::to_string(source)?;
    Ok(format!(
        r#"
(function () {{
  var parts = [];
  var cancelled = false;
  var data = JSON.parse({data_literal});
  var cancel = function () {{ cancelled = true; }};
  var write = function (text) {{ parts.push(text); }};
  try {{
    var body = new Function("data", "cancel", "write", {source_literal});
    body.call(undefined, data, cancel, write);
  }} catch (e) {{
    cancelled = true;
  }}
  return cancelled ? null : parts.join("");
}})();
"#
    ))
}
