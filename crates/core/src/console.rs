//! Console reporting and color management
//!
//! Task banners, command echo and consistent per-task colors for terminal
//! output. Inside GitHub Actions colors are disabled and each task is wrapped
//! in a collapsible log group.

use colored::*;

use crate::task::Task;

/// How progress is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Colored banners for interactive terminals
    Pretty,
    /// Uncolored banners
    Plain,
    /// Uncolored banners wrapped in `::group::` markers
    GitHubActions,
}

impl LogFormat {
    pub fn detect(ci: bool) -> Self {
        if ci {
            LogFormat::GitHubActions
        } else {
            LogFormat::Pretty
        }
    }

    pub fn colored(&self) -> bool {
        matches!(self, LogFormat::Pretty)
    }
}

const TASK_PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::Blue,
    Color::BrightCyan,
    Color::BrightMagenta,
    Color::BrightBlue,
];

/// Stable label color for a task name
///
/// Red, yellow and green stay reserved for failure, warnings and success.
pub fn get_task_color(task_name: &str) -> Color {
    // FNV-1a
    let hash = task_name.bytes().fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
        (acc ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    });
    TASK_PALETTE[(hash % TASK_PALETTE.len() as u64) as usize]
}

#[derive(Debug, Clone, Copy)]
pub struct Console {
    format: LogFormat,
}

impl Console {
    pub fn new(format: LogFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn task_executing(&self, task: &Task) {
        if self.format == LogFormat::GitHubActions {
            println!("::group::{}", task.name());
        }
        println!("{}", self.banner(task, "executing"));
    }

    pub fn task_executed(&self, task: &Task) {
        println!("{}", self.banner(task, "executed"));
        if self.format == LogFormat::GitHubActions {
            println!("::endgroup::");
        }
    }

    /// Close an open log group after a task failed
    pub fn task_failed(&self, task_name: &str) {
        if self.format == LogFormat::GitHubActions {
            println!("::endgroup::");
            println!("::error::Task '{}' failed", task_name);
        }
    }

    pub fn command(&self, command_line: &str) {
        println!("{}", self.paint("Executing command:", |t| t.bold()));
        println!("    {}", self.paint(command_line, |t| t.cyan()));
        println!();
    }

    pub fn output_line(&self, line: &str, is_stderr: bool) {
        if is_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    pub fn note(&self, message: &str) {
        println!("{} {}", self.paint("›", |t| t.bright_black()), message);
    }

    pub fn blank_line(&self) {
        println!();
    }

    fn paint(&self, text: &str, style: impl FnOnce(&str) -> ColoredString) -> String {
        if self.format.colored() {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn banner(&self, task: &Task, state: &str) -> String {
        let label = format!("Task [{}]", task.name());
        let color = get_task_color(task.name());
        let label = self.paint(&label, |t| t.color(color).bold());
        format!("===== {} {} {} ======", label, task.description(), state)
    }
}
