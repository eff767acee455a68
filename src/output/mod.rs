pub mod json;
pub mod report;
pub mod table;

use std::path::Path;

pub use report::{remaining_diff, render_report, write_report};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Markdown,
    Pretty,
}

impl ReportFormat {
    /// Picks the format from the file extension; anything unknown is a
    /// plain-text table.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => ReportFormat::Json,
            Some("md") | Some("markdown") => ReportFormat::Markdown,
            _ => ReportFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ReportFormat::from_path(Path::new("out.json")), ReportFormat::Json);
        assert_eq!(ReportFormat::from_path(Path::new("r.MD")), ReportFormat::Markdown);
        assert_eq!(ReportFormat::from_path(Path::new("report.txt")), ReportFormat::Pretty);
        assert_eq!(ReportFormat::from_path(Path::new("report")), ReportFormat::Pretty);
    }
}
