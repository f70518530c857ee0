use anyhow::{Context, Result};
use mdtrim::backup_manager::BackupManager;
use mdtrim::cli::{parse_args, Args, RunOptions};
use mdtrim::config::{self, Config};
use mdtrim::dedup::{self, Pattern, Scope};
use mdtrim::diff_formatter::DiffFormatter;
use mdtrim::document::Document;
use mdtrim::{error_helpers, logger};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let args = parse_args();

    match args {
        Args::Run(opts) => {
            let config = config::load_config()?;
            config::validate_config(&config)?;
            logger::init_debug_logging(opts.debug || config.logging.debug)?;
            run(&opts, &config)?;
        }
        Args::Rollback { id, backup_dir } => {
            let config = config::load_config()?;
            rollback(id, &backup_manager_for(backup_dir.as_deref(), &config)?)?;
        }
        Args::History { backup_dir } => {
            let config = config::load_config()?;
            show_history(&backup_manager_for(backup_dir.as_deref(), &config)?)?;
        }
        Args::Status { backup_dir } => {
            let config = config::load_config()?;
            show_status(&backup_manager_for(backup_dir.as_deref(), &config)?)?;
        }
        Args::Config { path, reset, .. } => {
            manage_config(path, reset)?;
        }
    }

    Ok(())
}

/// Command-line values win over the config file
fn resolve_pattern(opts: &RunOptions, config: &Config) -> Result<Pattern> {
    let anchor = opts.anchor.as_deref().unwrap_or(&config.pattern.anchor);
    let marker = opts.marker.as_deref().unwrap_or(&config.pattern.marker);

    let compiled = if opts.regex || config.pattern.regex {
        Pattern::regex(anchor, marker)
    } else {
        Pattern::literal(anchor, marker)
    };
    let pattern = compiled.map_err(|e| error_helpers::explain(e, "compiling pattern"))?;

    let scope = if opts.all || config.pattern.all {
        Scope::All
    } else {
        Scope::First
    };

    Ok(pattern.with_scope(scope))
}

fn resolve_target(opts: &RunOptions, config: &Config) -> PathBuf {
    opts.file
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.target.path))
}

fn backup_manager_for(backup_dir: Option<&Path>, config: &Config) -> Result<BackupManager> {
    let manager = match backup_dir.or(config.backup.backup_dir.as_deref().map(Path::new)) {
        Some(dir) => BackupManager::with_directory(dir)?,
        None => BackupManager::new()?,
    };
    Ok(manager.with_max_backups(config.backup.max_backups))
}

fn run(opts: &RunOptions, config: &Config) -> Result<()> {
    let pattern = resolve_pattern(opts, config)?;
    let target = resolve_target(opts, config);
    let context = opts.context.unwrap_or(config.output.context_lines);

    tracing::info!(path = %target.display(), pattern = %pattern.describe(), "starting run");

    let document = Document::load(&target).map_err(|e| error_helpers::explain(e, "reading"))?;
    let result = dedup::deduplicate(document.content(), &pattern);

    if !result.is_changed() {
        println!("No duplicated section found in {}.", target.display());
        println!("Cleaned successfully!");
        return Ok(());
    }

    if opts.dry_run || opts.interactive {
        print!("{}", DiffFormatter::format_dry_run_header(&target, opts.dry_run));
        print!(
            "{}",
            DiffFormatter::format_diff_with_context(&target, document.content(), &result.content, context)
        );
    }

    if opts.interactive && !opts.dry_run {
        print!("Apply changes? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        let input = input.trim().to_lowercase();
        if input != "y" && input != "yes" {
            println!("Changes not applied.");
            return Ok(());
        }
    }

    if opts.dry_run {
        return Ok(());
    }

    let backup_id = if opts.no_backup || !config.backup.enabled {
        None
    } else {
        let mut backup_manager = backup_manager_for(opts.backup_dir.as_deref(), config)?;
        let id = backup_manager
            .create_backup(&pattern.describe(), std::slice::from_ref(&target))
            .context("Failed to back up file; nothing was written")?;
        Some(id)
    };

    let summary = DiffFormatter::format_summary(&target, &result);
    document
        .with_content(result.content)
        .save()
        .map_err(|e| error_helpers::explain(e, "writing"))?;

    println!("{}", summary);
    println!("Cleaned successfully!");

    if let Some(id) = backup_id {
        println!("\nBackup ID: {}", id);
        println!("Rollback with: mdtrim rollback {}", id);
    }

    Ok(())
}

fn rollback(id: Option<String>, backup_manager: &BackupManager) -> Result<()> {
    let backup_id = match id {
        Some(id) => id,
        None => match backup_manager.get_last_backup_id()? {
            Some(id) => {
                println!("Rolling back last operation: {}\n", id);
                id
            }
            None => {
                anyhow::bail!("No backups found to rollback");
            }
        },
    };

    backup_manager.restore_backup(&backup_id)?;
    println!("\n✅ Rollback complete");

    Ok(())
}

fn show_history(backup_manager: &BackupManager) -> Result<()> {
    let backups = backup_manager.list_backups()?;
    println!("{}", DiffFormatter::format_history(backups));
    Ok(())
}

fn show_status(backup_manager: &BackupManager) -> Result<()> {
    let backups = backup_manager.list_backups()?;

    println!("Current backup status:\n");
    println!("Backup directory: {}", backup_manager.backups_dir().display());
    println!("Total backups: {}\n", backups.len());

    if let Some(last) = backups.last() {
        println!("Last operation:");
        println!("  ID: {}", last.id);
        println!("  Time: {}", last.timestamp.format("%Y-%m-%d %H:%M:%S"));
        println!("  Operation: {}", last.operation);
    }

    Ok(())
}

/// Bare `mdtrim config` behaves like `--show`
fn manage_config(path: bool, reset: bool) -> Result<()> {
    let config_path = config::config_file_path()?;

    if reset {
        config::save_default_config()?;
        println!("Configuration reset: {}", config_path.display());
        return Ok(());
    }

    if path {
        println!("Config file: {}", config_path.display());
        println!("Log file:    {}", logger::get_current_log_path().display());
        return Ok(());
    }

    let config = config::load_config()?;
    config::validate_config(&config)?;
    let rendered = toml::to_string_pretty(&config).context("Failed to serialize config")?;
    println!("# {}\n", config_path.display());
    print!("{}", rendered);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_pattern_prefers_cli_values() {
        let opts = RunOptions {
            anchor: Some("A\n".into()),
            all: true,
            ..RunOptions::default()
        };
        let pattern = resolve_pattern(&opts, &Config::default()).unwrap();

        assert_eq!(pattern.anchor(), "A\n");
        assert_eq!(pattern.marker(), config::DEFAULT_MARKER);
        assert_eq!(pattern.scope(), Scope::All);
        assert!(!pattern.is_regex());
    }

    #[test]
    fn test_resolve_pattern_regex_from_config() {
        let mut config = Config::default();
        config.pattern.regex = true;
        config.pattern.anchor = r"## v\d+\n".into();
        config.pattern.marker = "## Usage".into();

        let pattern = resolve_pattern(&RunOptions::default(), &config).unwrap();
        assert!(pattern.is_regex());
        assert_eq!(pattern.scope(), Scope::First);
    }

    #[test]
    fn test_resolve_pattern_reports_bad_regex() {
        let opts = RunOptions {
            anchor: Some("(".into()),
            regex: true,
            ..RunOptions::default()
        };
        assert!(resolve_pattern(&opts, &Config::default()).is_err());
    }

    #[test]
    fn test_resolve_target_falls_back_to_config() {
        let config = Config::default();
        assert_eq!(resolve_target(&RunOptions::default(), &config), PathBuf::from("README.md"));

        let opts = RunOptions {
            file: Some(PathBuf::from("docs/guide.md")),
            ..RunOptions::default()
        };
        assert_eq!(resolve_target(&opts, &config), PathBuf::from("docs/guide.md"));
    }

    #[test]
    fn test_run_cleans_file_and_backs_up() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let target = temp_dir.path().join("README.md");
        std::fs::write(&target, "X\nDUPDUPDUP\nY\n---\nY\n").unwrap();

        let opts = RunOptions {
            file: Some(target.clone()),
            anchor: Some("X\n".into()),
            marker: Some("Y\n".into()),
            backup_dir: Some(temp_dir.path().join("backups")),
            ..RunOptions::default()
        };
        run(&opts, &Config::default()).unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "X\nY\n---\nY\n");

        let manager = BackupManager::with_directory(temp_dir.path().join("backups")).unwrap();
        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(
            std::fs::read_to_string(&backups[0].files[0].backup_path).unwrap(),
            "X\nDUPDUPDUP\nY\n---\nY\n"
        );
    }

    #[test]
    fn test_run_dry_run_leaves_file_untouched() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let target = temp_dir.path().join("README.md");
        std::fs::write(&target, "A\nold\nM\n").unwrap();

        let opts = RunOptions {
            file: Some(target.clone()),
            anchor: Some("A\n".into()),
            marker: Some("M\n".into()),
            dry_run: true,
            backup_dir: Some(temp_dir.path().join("backups")),
            ..RunOptions::default()
        };
        run(&opts, &Config::default()).unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "A\nold\nM\n");
        assert!(!temp_dir.path().join("backups").exists());
    }

    #[test]
    fn test_run_without_match_leaves_file_identical() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let target = temp_dir.path().join("README.md");
        let original = "# Title\r\n\nNo duplicated flowchart here.\n";
        std::fs::write(&target, original).unwrap();

        let opts = RunOptions {
            file: Some(target.clone()),
            backup_dir: Some(temp_dir.path().join("backups")),
            ..RunOptions::default()
        };
        run(&opts, &Config::default()).unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), original.as_bytes());
        assert!(!temp_dir.path().join("backups").exists());
    }

    #[test]
    fn test_run_missing_file_fails() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let opts = RunOptions {
            file: Some(temp_dir.path().join("missing.md")),
            no_backup: true,
            ..RunOptions::default()
        };

        let err = run(&opts, &Config::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("File not found"));
    }
}
