use crate::backup_manager::BackupMetadata;
use crate::dedup::Deduplication;
use colored::*;
use similar::{ChangeTag, TextDiff};
use std::io::IsTerminal;
use std::path::Path;

pub struct DiffFormatter;

impl DiffFormatter {
    /// Auto-detect if we should use colors
    fn should_use_color() -> bool {
        // https://no-color.org/
        if std::env::var("NO_COLOR").is_ok() {
            return false;
        }

        std::io::stdout().is_terminal()
    }

    pub fn format_dry_run_header(path: &Path, dry_run: bool) -> String {
        let label = if dry_run { "Dry run" } else { "Preview" };
        if Self::should_use_color() {
            format!("{} {}\n", format!("🔍 {}:", label).bold().green(), path.display().to_string().white().bold())
        } else {
            format!("{}: {}\n", label, path.display())
        }
    }

    /// Line diff of `before` -> `after` with `context_size` unchanged lines
    /// around each removal, followed by a summary.
    pub fn format_diff_with_context(path: &Path, before: &str, after: &str, context_size: usize) -> String {
        Self::render_diff(path, before, after, context_size, Self::should_use_color())
    }

    fn render_diff(path: &Path, before: &str, after: &str, context_size: usize, use_color: bool) -> String {
        let mut output = String::new();
        let file_path = path.display().to_string();

        if use_color {
            output.push_str(&format!("{}\n", file_path.bold().cyan()));
        } else {
            output.push_str(&format!("{}\n", file_path));
        }

        let diff = TextDiff::from_lines(before, after);
        let mut deleted = 0usize;
        let mut added = 0usize;

        for (group_idx, group) in diff.grouped_ops(context_size).iter().enumerate() {
            if group_idx > 0 {
                if use_color {
                    output.push_str(&format!("{}\n", "...".dimmed()));
                } else {
                    output.push_str("...\n");
                }
            }

            for op in group {
                for change in diff.iter_changes(op) {
                    let content = change.value().trim_end_matches(['\r', '\n']);
                    let (line_num, indicator) = match change.tag() {
                        ChangeTag::Equal => (change.old_index().map_or(0, |i| i + 1), "="),
                        ChangeTag::Delete => {
                            deleted += 1;
                            (change.old_index().map_or(0, |i| i + 1), "-")
                        }
                        ChangeTag::Insert => {
                            added += 1;
                            (change.new_index().map_or(0, |i| i + 1), "+")
                        }
                    };

                    if use_color {
                        let line = match change.tag() {
                            ChangeTag::Equal => format!("L{}: {} {}\n", line_num, indicator.dimmed(), content.dimmed()),
                            ChangeTag::Delete => format!("L{}: {} {}\n", line_num, indicator.red().bold(), content.red()),
                            ChangeTag::Insert => format!("L{}: {} {}\n", line_num, indicator.green().bold(), content.green().bold()),
                        };
                        output.push_str(&line);
                    } else {
                        output.push_str(&format!("L{}: {} {}\n", line_num, indicator, content));
                    }
                }
            }
        }

        // A splice mid-line shows up as one delete plus one insert
        output.push_str(&format!(
            "\nTotal: {} line{} removed",
            deleted,
            if deleted == 1 { "" } else { "s" }
        ));
        if added > 0 {
            output.push_str(&format!(", {} rewritten", added));
        }
        output.push('\n');

        output
    }

    /// One-line summary of what was removed
    pub fn format_summary(path: &Path, result: &Deduplication) -> String {
        let spans = result.removed.len();
        format!(
            "Removed {} duplicated section{} ({} line{}, {} bytes) from {}",
            spans,
            if spans == 1 { "" } else { "s" },
            result.removed_lines(),
            if result.removed_lines() == 1 { "" } else { "s" },
            result.removed_bytes(),
            path.display()
        )
    }

    /// Format the backup history
    pub fn format_history(backups: Vec<BackupMetadata>) -> String {
        let use_color = Self::should_use_color();
        let mut output = String::new();

        if backups.is_empty() {
            output.push_str("No backups found.\n");
            return output;
        }

        if use_color {
            output.push_str(&format!("{}\n\n", "Operation history:".bold()));
        } else {
            output.push_str("Operation history:\n\n");
        }

        for backup in backups {
            let timestamp = backup.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
            if use_color {
                output.push_str(&format!("{} {}\n", timestamp.dimmed(), backup.id.yellow()));
            } else {
                output.push_str(&format!("{} {}\n", timestamp, backup.id));
            }
            output.push_str(&format!("  Operation: {}\n", backup.operation));
            for file in &backup.files {
                output.push_str(&format!("  File: {}\n", file.original_path.display()));
            }
            output.push('\n');
        }

        output
    }
}
