//! Human-readable error rendering using miette
//!
//! Engine errors are converted into an [`ErrorReport`], a
//! [`miette::Diagnostic`] with a stable code per error class, and rendered
//! with miette's graphical handler.

use std::fmt;
use std::io::Write;

use miette::{GraphicalReportHandler, GraphicalTheme};
use thiserror::Error as ThisError;

use crate::{Diagnostic, Error, Severity};

/// A renderable view of an [`Error`].
#[derive(Debug, ThisError, miette::Diagnostic)]
pub enum ErrorReport {
    #[error("{summary}")]
    #[diagnostic(code(olapcalc::compile))]
    Compile {
        summary: String,
        #[related]
        diagnostics: Vec<DiagnosticReport>,
    },

    #[error("{0}")]
    #[diagnostic(code(olapcalc::runtime))]
    Runtime(String),

    #[error("{0}")]
    #[diagnostic(
        code(olapcalc::defect),
        help("this is a bug in the engine, not in the expression")
    )]
    Defect(String),

    #[error("{0}")]
    #[diagnostic(code(olapcalc::api))]
    Api(String),
}

impl From<&Error> for ErrorReport {
    fn from(error: &Error) -> Self {
        match error {
            Error::Compilation { diagnostics } => ErrorReport::Compile {
                summary: error.to_string(),
                diagnostics: diagnostics.iter().map(DiagnosticReport::from).collect(),
            },
            Error::Runtime(msg) => ErrorReport::Runtime(msg.clone()),
            Error::Defect(msg) => ErrorReport::Defect(msg.clone()),
            Error::Api(msg) => ErrorReport::Api(msg.clone()),
        }
    }
}

/// One compiler diagnostic, carrying its own code, severity and help.
#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct DiagnosticReport {
    message: String,
    code: Option<String>,
    help: Option<String>,
    severity: miette::Severity,
}

impl From<&Diagnostic> for DiagnosticReport {
    fn from(diag: &Diagnostic) -> Self {
        DiagnosticReport {
            message: diag.message.clone(),
            code: diag.code.clone(),
            help: diag.help.clone(),
            severity: match diag.severity {
                Severity::Error => miette::Severity::Error,
                Severity::Warning => miette::Severity::Warning,
                Severity::Info => miette::Severity::Advice,
            },
        }
    }
}

impl miette::Diagnostic for DiagnosticReport {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.code
            .as_ref()
            .map(|code| Box::new(code) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(self.severity)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|help| Box::new(help) as Box<dyn fmt::Display>)
    }
}

/// Render an error with rich formatting to stderr
pub fn render_error(error: &Error) {
    render_error_to(error, &mut std::io::stderr()).ok();
}

/// Render an error to a specific writer
pub fn render_error_to(error: &Error, writer: &mut dyn Write) -> std::io::Result<()> {
    writer.write_all(render(error, GraphicalTheme::unicode()).as_bytes())
}

/// Render an error to a String (useful for logs, web UIs, etc.)
///
/// # Example
/// ```
/// use olapcalc::{CubeBuilder, Engine, EngineOptions, Expr, Function, render_error_to_string};
///
/// let mut builder = CubeBuilder::new("Sales");
/// builder.measure("Unit Sales");
/// let cube = builder.build();
/// let engine = Engine::new(&cube, EngineOptions::default());
///
/// let missing_argument = Expr::call(Function::Parent, vec![]);
/// if let Err(e) = engine.prepare(&missing_argument) {
///     let formatted = render_error_to_string(&e);
///     assert!(formatted.contains("olapcalc::compile"));
/// }
/// ```
pub fn render_error_to_string(error: &Error) -> String {
    render(error, GraphicalTheme::unicode())
}

/// Same as [`render_error_to_string`], without ANSI color codes.
pub fn render_error_to_string_no_color(error: &Error) -> String {
    render(error, GraphicalTheme::unicode_nocolor())
}

fn render(error: &Error, theme: GraphicalTheme) -> String {
    let report = ErrorReport::from(error);
    let mut out = String::new();
    if GraphicalReportHandler::new_themed(theme)
        .render_report(&mut out, &report)
        .is_err()
    {
        // Fall back to the plain message.
        out = format!("{}\n", report);
    }
    out
}
