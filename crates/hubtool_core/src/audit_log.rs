use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::runtime::DATE_TOKEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    Action {
        name: String,
        id: String,
        value: Option<String>,
    },
    Comment(String),
    Warn {
        message: String,
        cause: Option<String>,
    },
    Error {
        message: String,
        cause: Option<String>,
    },
}

impl LogLine {
    pub fn render(&self) -> String {
        match self {
            Self::Action { name, id, value } => match value {
                Some(value) => format!("{name} {id}:{value}"),
                None => format!("{name} {id}"),
            },
            Self::Comment(text) => format!("// {text}"),
            Self::Warn { message, cause } => with_cause("WARN", message, cause.as_deref()),
            Self::Error { message, cause } => with_cause("ERROR", message, cause.as_deref()),
        }
    }
}

/// Ordered record of one run. Nothing is written until `write_to`.
#[derive(Debug, Clone)]
pub struct AuditLog {
    title: String,
    generated_at: DateTime<Utc>,
    lines: Vec<LogLine>,
}

impl AuditLog {
    pub fn new(title: &str) -> Self {
        Self::with_timestamp(title, Utc::now())
    }

    pub fn with_timestamp(title: &str, generated_at: DateTime<Utc>) -> Self {
        Self {
            title: title.to_string(),
            generated_at,
            lines: Vec::new(),
        }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn add_action(&mut self, name: &str, id: &str, value: Option<&str>) {
        self.lines.push(LogLine::Action {
            name: name.to_string(),
            id: id.to_string(),
            value: value.map(str::to_string),
        });
    }

    pub fn add_comment(&mut self, text: &str) {
        self.lines.push(LogLine::Comment(text.to_string()));
    }

    pub fn add_warning(&mut self, message: &str, cause: Option<&str>) {
        self.lines.push(LogLine::Warn {
            message: message.to_string(),
            cause: cause.map(str::to_string),
        });
    }

    pub fn add_error(&mut self, message: &str, cause: Option<&str>) {
        self.lines.push(LogLine::Error {
            message: message.to_string(),
            cause: cause.map(str::to_string),
        });
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "// {}\n// Generated {}\n",
            self.title,
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        for line in &self.lines {
            out.push_str(&line.render());
            out.push('\n');
        }
        out
    }

    /// Substitute the run timestamp into `template` and write the log there.
    /// Returns the path actually written.
    pub fn write_to(&self, template: &Path) -> Result<PathBuf> {
        let path = resolve_log_path(template, self.generated_at);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create log dir {}", parent.display()))?;
        }
        fs::write(&path, self.render())
            .with_context(|| format!("failed to write log {}", path.display()))?;
        Ok(path)
    }
}

/// Replace every `<DATE>` in `template` with the run time in unix milliseconds.
pub fn resolve_log_path(template: &Path, at: DateTime<Utc>) -> PathBuf {
    let raw = template.to_string_lossy();
    if !raw.contains(DATE_TOKEN) {
        return template.to_path_buf();
    }
    PathBuf::from(raw.replace(DATE_TOKEN, &at.timestamp_millis().to_string()))
}

fn with_cause(tag: &str, message: &str, cause: Option<&str>) -> String {
    match cause {
        Some(cause) => format!("{tag} {message} : {cause}"),
        None => format!("{tag} {message}"),
    }
}
