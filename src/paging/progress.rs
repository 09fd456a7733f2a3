//! Paging progress messages.
//!
//! A page message is a template containing any of [`TOTAL_ITEMS_MARKER`],
//! [`FIRST_ITEM_MARKER`] and [`LAST_ITEM_MARKER`]. After every page the
//! template is expanded and written over the current line of the progress
//! stream, so the user sees a single line that keeps updating.

use serde_json::Value;
use std::io::{self, Write};

/// Replaced with the running item total
pub const TOTAL_ITEMS_MARKER: &str = "%%total_items%%";
/// Replaced with the identifying attribute of the page's first item
pub const FIRST_ITEM_MARKER: &str = "%%first_item%%";
/// Replaced with the identifying attribute of the page's last item
pub const LAST_ITEM_MARKER: &str = "%%last_item%%";

/// Field that identifies an item in progress messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageAttribute {
    /// Top-level field name
    Field(String),
    /// Path of nested field names
    Path(Vec<String>),
}

impl MessageAttribute {
    /// Parse a dotted path; a single segment becomes [`MessageAttribute::Field`]
    pub fn parse(spec: &str) -> Self {
        let parts: Vec<String> = spec.split('.').map(str::to_string).collect();
        if parts.len() == 1 {
            Self::Field(spec.to_string())
        } else {
            Self::Path(parts)
        }
    }

    fn fields(&self) -> &[String] {
        match self {
            Self::Field(name) => std::slice::from_ref(name),
            Self::Path(path) => path,
        }
    }

    /// String form of the attribute on `item`.
    ///
    /// An absent item or field renders as an empty string for a plain field and
    /// as `{}` for a nested path.
    pub fn resolve(&self, item: Option<&Value>) -> String {
        let missing = match self {
            Self::Field(_) => "",
            Self::Path(_) => "{}",
        };
        let Some(mut current) = item else {
            return missing.to_string();
        };
        for field in self.fields() {
            match current.get(field.as_str()) {
                Some(value) => current = value,
                None => return missing.to_string(),
            }
        }
        display_value(current)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Expand a page message template.
///
/// `first` and `last` are the first and last items of the current page, not of
/// the whole aggregate. Item markers are only replaced when `attribute` is set.
pub fn expand(
    template: &str,
    total: usize,
    first: Option<&Value>,
    last: Option<&Value>,
    attribute: Option<&MessageAttribute>,
) -> String {
    let mut message = template.replace(TOTAL_ITEMS_MARKER, &total.to_string());
    if let Some(attribute) = attribute {
        let first_text = attribute.resolve(first);
        let last_text = attribute.resolve(last.or(first));
        message = message
            .replace(FIRST_ITEM_MARKER, &first_text)
            .replace(LAST_ITEM_MARKER, &last_text);
    }
    message
}

/// "Got N items" template with the given line terminator ("", "...", "\n", "...\n")
pub fn got_total_items_msg(items: &str, eol: &str) -> String {
    format!("Got {TOTAL_ITEMS_MARKER} {items}{eol}")
}

/// "Got N items: first - last" template, one line per page
pub fn got_total_items_first_last_msg(items: &str) -> String {
    format!("Got {TOTAL_ITEMS_MARKER} {items}: {FIRST_ITEM_MARKER} - {LAST_ITEM_MARKER}\n")
}

/// Line-overwriting writer for page messages
pub struct ProgressStream {
    out: Box<dyn Write + Send>,
}

impl ProgressStream {
    /// Progress stream on stderr
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    /// Progress stream on an arbitrary writer
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    /// Overwrite the current line with `message`
    pub fn show(&mut self, message: &str) -> io::Result<()> {
        self.out.write_all(b"\r")?;
        self.out.flush()?;
        self.out.write_all(message.as_bytes())?;
        self.out.flush()
    }

    /// Terminate the progress line unless the template already does
    pub fn finish(&mut self, template: &str) -> io::Result<()> {
        if !template.is_empty() && !template.ends_with('\n') {
            self.out.write_all(b"\r\n")?;
            self.out.flush()?;
        }
        Ok(())
    }
}

impl Default for ProgressStream {
    fn default() -> Self {
        Self::stderr()
    }
}
