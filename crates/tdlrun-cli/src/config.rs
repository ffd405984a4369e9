//! Turns parsed arguments into runner settings and a run request.
//!
//! Precedence is handled by clap: flags override environment variables
//! (including those loaded from `.env`), which override defaults.

use std::path::Path;

use tdlrun_core::{RunRequest, RunnerSettings, validate_settings};

use crate::error::CliError;
use crate::parser::Cli;

/// Build and validate runner settings from the command line.
pub fn runner_settings(cli: &Cli) -> Result<RunnerSettings, CliError> {
    let mut settings = RunnerSettings::default()
        .with_command_timeout_secs(cli.timeout)
        .with_termination_grace_secs(cli.grace);
    if let Some(path) = &cli.tdl {
        settings = settings.with_executable(path);
    }
    validate_settings(&settings)?;
    Ok(settings)
}

/// Build the run request, prefixing every task with `executable`.
pub fn build_request(cli: &Cli, executable: &Path) -> Result<RunRequest, CliError> {
    let task_args = match &cli.batch {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
            let tasks = parse_batch(&text)?;
            if tasks.is_empty() {
                return Err(CliError::Arguments(format!(
                    "batch file {} has no tasks",
                    path.display()
                )));
            }
            tasks
        }
        None if cli.args.is_empty() && cli.replay.is_none() => {
            return Err(CliError::Arguments(
                "no tdl arguments given (try `tdlrun -- --help`)".to_string(),
            ));
        }
        None => vec![cli.args.clone()],
    };

    let program = executable.to_string_lossy().into_owned();
    let tasks: Vec<Vec<String>> = task_args
        .into_iter()
        .map(|args| std::iter::once(program.clone()).chain(args).collect())
        .collect();

    let mut request = RunRequest::batch(tasks);
    if cli.collect {
        request = request.collecting_output();
    }
    Ok(request)
}

/// One argument list per non-blank line; `#` starts a comment line.
///
/// Lines are split with shell quoting rules, so `--filter "Views > 10"`
/// stays one argument.
fn parse_batch(text: &str) -> Result<Vec<Vec<String>>, CliError> {
    let mut tasks = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let args = shell_words::split(line)
            .map_err(|e| CliError::Arguments(format!("batch line {}: {e}", index + 1)))?;
        tasks.push(args);
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_settings_from_flags() {
        let cli = Cli::parse_from(["tdlrun", "--timeout", "60", "--tdl", "/opt/tdl", "chat", "ls"]);
        let settings = runner_settings(&cli).unwrap();
        assert_eq!(settings.command_timeout_secs, 60);
        assert_eq!(settings.executable.as_deref(), Some(Path::new("/opt/tdl")));
    }

    #[test]
    fn test_invalid_settings_are_config_errors() {
        let cli = Cli::parse_from(["tdlrun", "--grace", "0", "chat", "ls"]);
        let err = runner_settings(&cli).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn test_request_prefixes_executable() {
        let cli = Cli::parse_from(["tdlrun", "--collect", "chat", "ls"]);
        let request = build_request(&cli, Path::new("/opt/tdl")).unwrap();
        assert_eq!(request.tasks, vec![vec!["/opt/tdl", "chat", "ls"]]);
        assert!(request.collect_output);
    }

    #[test]
    fn test_missing_arguments_rejected() {
        let cli = Cli::parse_from(["tdlrun"]);
        let err = build_request(&cli, Path::new("tdl")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_batch_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# first the export").unwrap();
        writeln!(file, "chat export -c 123 -o out.json").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "dl -f out.json --skip-same").unwrap();

        let path = file.path().to_string_lossy().into_owned();
        let cli = Cli::parse_from(["tdlrun", "--batch", path.as_str()]);
        let request = build_request(&cli, Path::new("tdl")).unwrap();
        assert_eq!(request.tasks.len(), 2);
        assert_eq!(request.tasks[1], vec!["tdl", "dl", "-f", "out.json", "--skip-same"]);
    }

    #[test]
    fn test_batch_line_keeps_quoted_arguments() {
        let tasks = parse_batch("dl -f out.json --filter \"Views > 10\"\n").unwrap();
        assert_eq!(
            tasks,
            vec![vec!["dl", "-f", "out.json", "--filter", "Views > 10"]]
        );

        let tasks = parse_batch("dl -d '/data/My Downloads'\n").unwrap();
        assert_eq!(tasks[0], vec!["dl", "-d", "/data/My Downloads"]);
    }

    #[test]
    fn test_batch_unbalanced_quote_names_line() {
        let err = parse_batch("# export\nchat export -c 1\ndl --filter \"Views > 10\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("batch line 3"));
    }
}
