use colored::*;
use std::path::Path;
use svnhook_syntax::Span;

/// A problem in a rule document, printed with its location and surrounding
/// lines.
pub struct Diagnostic {
    pub message: String,
    pub span: Option<Span>,
    pub file: Option<String>,
    pub source: Option<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
            file: None,
            source: None,
            help: None,
        }
    }

    pub fn with_span(mut self, span: Option<Span>) -> Self {
        self.span = span;
        self
    }

    pub fn with_file(mut self, file: &Path) -> Self {
        self.file = Some(file.display().to_string());
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn display(&self) {
        println!("{} {}", "error:".red().bold(), self.message.bold());

        if let (Some(file), Some(span)) = (&self.file, &self.span) {
            println!("  {} {}:{}:{}", "-->".blue().bold(), file, span.line, span.col);
        }

        if let (Some(source), Some(span)) = (&self.source, &self.span) {
            self.display_excerpt(source, span);
        }

        if let Some(help) = &self.help {
            println!("{} {}", "help:".cyan().bold(), help);
        }
        println!();
    }

    fn display_excerpt(&self, source: &str, span: &Span) {
        let lines: Vec<&str> = source.lines().collect();
        let line_idx = span.line.saturating_sub(1);
        if line_idx >= lines.len() {
            return;
        }

        let start = line_idx.saturating_sub(1);
        let end = (line_idx + 2).min(lines.len());
        let width = end.to_string().len();

        for (i, line) in lines.iter().enumerate().take(end).skip(start) {
            let number = i + 1;
            if i == line_idx {
                println!(
                    "{:>width$} {} {}",
                    number.to_string().blue().bold(),
                    "|".blue().bold(),
                    line,
                    width = width
                );
                println!(
                    "{:>width$} {} {}{}",
                    "",
                    "|".blue().bold(),
                    " ".repeat(span.col.saturating_sub(1)),
                    "^".red().bold(),
                    width = width
                );
            } else {
                println!(
                    "{:>width$} {} {}",
                    number.to_string().dimmed(),
                    "|".blue().bold(),
                    line,
                    width = width
                );
            }
        }
    }
}
