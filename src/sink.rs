//! Result sinks: where status updates and classified results land.

use crate::classifier::{ResultCategory, ResultEntry, ResultSet};
use async_trait::async_trait;
use chrono::Local;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Consumer of status updates and result sets.
///
/// One sink has at most one active invocation at a time; the
/// orchestrator enforces that. All four surfaces are terminal for the
/// invocation that triggers them.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Deliver the categorized results of a finished invocation.
    async fn dispatch_results(&self, results: ResultSet);

    /// Push a status line; an empty string clears it.
    async fn show_status(&self, message: &str);

    /// Report a spawn failure.
    async fn show_error(&self, title: &str, body: &str);

    /// Report a timed-out invocation.
    async fn show_timeout(&self, title: &str, body: &str);
}

/// Terminal sink rendering results with colors and a status spinner.
pub struct TerminalSink {
    progress: Mutex<Option<ProgressBar>>,
    json: bool,
    show_progress: bool,
}

impl TerminalSink {
    pub fn new(json: bool, show_progress: bool) -> Self {
        TerminalSink {
            progress: Mutex::new(None),
            json,
            show_progress,
        }
    }

    fn print_category(&self, results: &ResultSet, category: ResultCategory) {
        let entries = results.entries(category);
        let heading = format!("{} ({})", category.label(), entries.len());
        match category {
            ResultCategory::Error => println!("{}", heading.red().bold()),
            ResultCategory::Warning => println!("{}", heading.yellow().bold()),
            ResultCategory::Statistic => println!("{}", heading.cyan().bold()),
        }

        for entry in entries {
            match entry {
                ResultEntry::Diagnostic {
                    display_label,
                    message,
                    full_path,
                    line_number,
                } => {
                    println!(
                        "  {:<24} {}  {}",
                        display_label,
                        message,
                        format!("{}:{}", full_path.display(), line_number).dimmed()
                    );
                }
                ResultEntry::Statistic { count, text } => {
                    println!("  {:>6}  {}", count.as_str().bold(), text);
                }
            }
        }
    }
}

#[async_trait]
impl ResultSink for TerminalSink {
    async fn dispatch_results(&self, results: ResultSet) {
        if self.json {
            match serde_json::to_string_pretty(&results) {
                Ok(rendered) => println!("{rendered}"),
                Err(err) => eprintln!("{} {}", "✗".red(), err),
            }
            return;
        }

        println!(
            "{} {}",
            "Checked at".dimmed(),
            Local::now().format("%H:%M:%S").to_string().dimmed()
        );
        for category in ResultCategory::ALL {
            self.print_category(&results, category);
        }
        if results.is_empty() {
            println!("{} no findings", "✓".green());
        }
    }

    async fn show_status(&self, message: &str) {
        if !self.show_progress {
            return;
        }
        let mut progress = self.progress.lock().unwrap();
        if message.is_empty() {
            if let Some(bar) = progress.take() {
                bar.finish_and_clear();
            }
            return;
        }

        let bar = progress.get_or_insert_with(|| {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} {msg}")
                    .unwrap(),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        bar.set_message(message.to_string());
    }

    async fn show_error(&self, title: &str, body: &str) {
        eprintln!("{} {}", "✗".red().bold(), title.red().bold());
        eprintln!("{body}");
    }

    async fn show_timeout(&self, title: &str, body: &str) {
        eprintln!("{} {}", "✗".yellow().bold(), title.yellow().bold());
        eprintln!("{body}");
    }
}

/// One delivery recorded by a [`CollectingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Results(ResultSet),
    Status(String),
    Error(String, String),
    Timeout(String, String),
}

/// Sink that records every delivery in order. Used by embedders that
/// consume results programmatically, and by tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl CollectingSink {
    /// All recorded deliveries, in arrival order.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Dispatched result sets, in arrival order.
    pub fn result_sets(&self) -> Vec<ResultSet> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Results(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// Status messages, in arrival order.
    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// `(title, body)` pairs from the error surface.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Error(t, b) => Some((t, b)),
                _ => None,
            })
            .collect()
    }

    /// `(title, body)` pairs from the timeout surface.
    pub fn timeouts(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Timeout(t, b) => Some((t, b)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: SinkEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ResultSink for CollectingSink {
    async fn dispatch_results(&self, results: ResultSet) {
        self.record(SinkEvent::Results(results));
    }

    async fn show_status(&self, message: &str) {
        self.record(SinkEvent::Status(message.to_string()));
    }

    async fn show_error(&self, title: &str, body: &str) {
        self.record(SinkEvent::Error(title.to_string(), body.to_string()));
    }

    async fn show_timeout(&self, title: &str, body: &str) {
        self.record(SinkEvent::Timeout(title.to_string(), body.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collecting_sink_preserves_order() {
        let sink = CollectingSink::default();
        sink.show_status("working").await;
        sink.show_status("").await;
        sink.dispatch_results(ResultSet::default()).await;

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], SinkEvent::Status("working".to_string()));
        assert_eq!(events[1], SinkEvent::Status(String::new()));
        assert!(matches!(events[2], SinkEvent::Results(_)));
    }

    #[tokio::test]
    async fn test_collecting_sink_splits_surfaces() {
        let sink = CollectingSink::default();
        sink.show_error("a", "b").await;
        sink.show_timeout("c", "d").await;

        assert_eq!(sink.errors(), vec![("a".to_string(), "b".to_string())]);
        assert_eq!(sink.timeouts(), vec![("c".to_string(), "d".to_string())]);
        assert!(sink.result_sets().is_empty());
    }
}
