//! Handlebars rendering of run results.
//!
//! The default template prints the falsifying program as trace lines followed
//! by the failure, or a one-line notice for exhausted runs. Output is plain
//! text, so HTML escaping is disabled.

use handlebars::{handlebars_helper, Handlebars};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Mutex;
use testmachine_core::{ReportError, Reporter, RunResult};
use tracing::debug;

use crate::trace::{failure_line, trace_lines};

const TEMPLATE_NAME: &str = "run";

/// Default report layout.
pub const DEFAULT_TEMPLATE: &str = "\
{{#if found~}}
Falsifying program found after {{plural trials \"trial\"}} (seed {{seed}}, trial {{trial}}):
{{#each lines}}    {{this}}
{{/each~}}
{{failure}}
{{~else~}}
No counterexample found within {{plural trials \"trial\"}} (seed {{seed}}).
{{~/if}}
";

handlebars_helper!(plural: |count: u64, noun: str| {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
});

/// Compiled report template with the helpers it needs.
pub struct ReportRenderer {
    handlebars: Handlebars<'static>,
}

impl ReportRenderer {
    pub fn new() -> Result<Self, ReportError> {
        Self::with_template(DEFAULT_TEMPLATE)
    }

    /// Use a custom layout. The template sees `found`, `status`, `seed`,
    /// `trials`, `trial`, `lines`, `failure` and `stats`.
    pub fn with_template(template: &str) -> Result<Self, ReportError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("plural", Box::new(plural));
        handlebars
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| ReportError::Render(format!("template error: {}", e)))?;
        Ok(Self { handlebars })
    }

    pub fn render(&self, result: &RunResult) -> Result<String, ReportError> {
        self.handlebars
            .render(TEMPLATE_NAME, &template_data(result))
            .map(|text| text.trim_end().to_string())
            .map_err(|e| ReportError::Render(e.to_string()))
    }
}

/// Values exposed to the template.
fn template_data(result: &RunResult) -> Value {
    match &result.failure {
        Some(failure) => json!({
            "found": true,
            "status": result.status.to_string(),
            "seed": result.seed,
            "trials": result.trials,
            "trial": failure.trial,
            "lines": trace_lines(&failure.trace),
            "failure": failure_line(&failure.kind),
            "stats": result.stats,
        }),
        None => json!({
            "found": false,
            "status": result.status.to_string(),
            "seed": result.seed,
            "trials": result.trials,
            "lines": [],
            "stats": result.stats,
        }),
    }
}

/// Render a result with the default template.
pub fn render_result(result: &RunResult) -> Result<String, ReportError> {
    ReportRenderer::new()?.render(result)
}

/// Machine-readable form of a run, trace lines included.
pub fn to_json(result: &RunResult) -> Result<Value, ReportError> {
    let mut document =
        serde_json::to_value(result).map_err(|e| ReportError::Render(e.to_string()))?;
    if let (Some(failure), Some(object)) = (&result.failure, document.as_object_mut()) {
        object.insert("trace_text".to_string(), json!(trace_lines(&failure.trace)));
    }
    Ok(document)
}

/// Reporter that renders each result and writes it to a sink.
pub struct TextReporter<W: Write + Send> {
    renderer: ReportRenderer,
    sink: Mutex<W>,
}

impl<W: Write + Send> TextReporter<W> {
    pub fn new(sink: W) -> Result<Self, ReportError> {
        Ok(Self {
            renderer: ReportRenderer::new()?,
            sink: Mutex::new(sink),
        })
    }

    pub fn with_renderer(sink: W, renderer: ReportRenderer) -> Self {
        Self {
            renderer,
            sink: Mutex::new(sink),
        }
    }

    pub fn into_inner(self) -> W {
        self.sink.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl TextReporter<std::io::Stdout> {
    pub fn stdout() -> Result<Self, ReportError> {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> Reporter for TextReporter<W> {
    fn report(&self, result: &RunResult) -> Result<String, ReportError> {
        let text = self.renderer.render(result)?;
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(sink, "{}", text)?;
        sink.flush()?;
        debug!(bytes = text.len(), status = %result.status, "report written");
        Ok(text)
    }
}
