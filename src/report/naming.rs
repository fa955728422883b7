use chrono::{DateTime, Local};
use crate::naming::NamingRule;

const FILE_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// File names of the Markdown reports written next to the documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportNaming {
    tag: String,
    extensions: Vec<String>,
}

impl ReportNaming {
    pub fn new(rule: &NamingRule) -> Self {
        Self {
            tag: rule.algorithm().tag().to_ascii_uppercase(),
            extensions: rule.extensions().iter().map(|e| e.to_ascii_uppercase()).collect(),
        }
    }

    pub fn verify_report(&self, now: DateTime<Local>) -> String {
        format!("VERIFY_{}_{}.md", self.tag, now.format(FILE_TIME_FORMAT))
    }

    pub fn generation_readme(&self) -> String {
        format!("README_{}.md", self.tag)
    }

    pub fn listing_report(&self, now: DateTime<Local>) -> String {
        let label = self.extensions.first().map(String::as_str).unwrap_or("DOC");
        format!("{}_LIST_{}.md", label, now.format(FILE_TIME_FORMAT))
    }

    /// Name prefixes of timestamped reports this tool may have written.
    pub fn cleanup_prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self.extensions.iter().map(|e| format!("{}_LIST_", e)).collect();
        prefixes.push(format!("{}_LIST_", self.tag));
        prefixes.push(format!("VERIFY_{}_", self.tag));
        prefixes
    }

    pub fn cleanup_exact(&self) -> Vec<String> {
        vec![self.generation_readme()]
    }

    pub fn is_report(&self, name: &str) -> bool {
        if !name.ends_with(".md") {
            return false;
        }
        self.cleanup_exact().iter().any(|exact| exact == name)
            || self.cleanup_prefixes().iter().any(|prefix| name.starts_with(prefix.as_str()))
    }
}
