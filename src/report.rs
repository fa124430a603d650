use repro_recognizer::{ClauseKind, Diagnostic, Outcome, RunReport};
use std::fmt::Write;

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

/// Human-readable pass/fail report.
pub fn render(report: &RunReport, color: bool) -> String {
    let palette = ansi::Palette::new(color);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        palette.bold(palette.paint(format!("⚙  Verifying: \"{}\"", report.assertion), ansi::CYAN)),
        palette.dim(format!("[{}]", report.label))
    );

    for (kind, title) in [(ClauseKind::Definition, "Definitions"), (ClauseKind::Predicate, "Predicates")] {
        let _ = writeln!(out, "\n{}", palette.paint(format!("━━━ {title} ━━━"), ansi::GRAY));
        let mut any = false;
        for diagnostic in report.diagnostics.iter().filter(|d| d.kind == kind) {
            any = true;
            let _ = writeln!(out, "{}", fmt_diagnostic(diagnostic, &palette));
        }
        if !any {
            let _ = writeln!(out, "{}", palette.dim("  none"));
        }
    }

    let _ = writeln!(out, "\n{}", palette.paint("━━━ Verdict ━━━", ansi::GRAY));
    let verdict = if report.verdict {
        palette.bold(palette.paint("✓ reproduced", ansi::GREEN))
    } else {
        palette.bold(palette.paint("✗ not reproduced", ansi::RED))
    };
    let _ = writeln!(out, "  {verdict}");

    let metrics = &report.metrics;
    let _ = writeln!(out, "\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    let _ = writeln!(
        out,
        "  Total: {}  │  Parse: {}  │  Populate: {}  │  Evaluate: {}  │  Snapshots: {}",
        palette.paint(format!("{:?}", metrics.total), ansi::GREEN),
        palette.dim(format!("{:?}", metrics.parse)),
        palette.paint(format!("{:?}", metrics.populate), ansi::CYAN),
        palette.dim(format!("{:?}", metrics.evaluate)),
        palette.paint(metrics.snapshot_requests.to_string(), ansi::BLUE),
    );
    out
}

fn fmt_diagnostic(diagnostic: &Diagnostic, palette: &ansi::Palette) -> String {
    let mark = match diagnostic.outcome {
        Outcome::Valid | Outcome::True => palette.paint("✓", ansi::GREEN),
        Outcome::Invalid | Outcome::False => palette.paint("✗", ansi::RED),
        Outcome::Skipped => palette.dim("·"),
    };
    let clause = palette.bold(&diagnostic.clause);
    if diagnostic.reason.is_empty() {
        return format!("  {mark} {clause} {}", palette.dim(format!("({})", diagnostic.outcome)));
    }
    format!("  {mark} {clause}\n      {}", palette.paint(&diagnostic.reason, ansi::YELLOW))
}
