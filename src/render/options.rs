//! Text report options.

use chrono::{DateTime, Utc};

/// Options for the text report.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Heading printed in the banner
    pub title: String,

    /// Name of the checked file, printed under the banner
    pub source: Option<String>,

    /// Generation time printed under the banner
    pub generated_at: Option<DateTime<Utc>>,

    /// Width of banner and separator lines
    pub width: usize,

    /// Print module summary lines
    pub include_summary: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the banner title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the source file name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Print the given generation time.
    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// Print the current time as generation time.
    pub fn with_timestamp(self) -> Self {
        self.with_generated_at(Utc::now())
    }

    /// Set the separator width.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(10);
        self
    }

    /// Enable or disable module summary lines.
    pub fn with_summary(mut self, include: bool) -> Self {
        self.include_summary = include;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "Paper Format Check Report".to_string(),
            source: None,
            generated_at: None,
            width: 60,
            include_summary: true,
        }
    }
}
