use anyhow::{anyhow, Context, Result};
use pingwatch_model::Target;
use std::fs;
use std::path::Path;

/// One target per line; blank lines and `#` comments are skipped.
pub fn parse_targets(contents: &str) -> Vec<Target> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Target::from)
        .collect()
}

/// File targets first, then the ones given on the command line.
pub fn collect_targets(file: Option<&Path>, extra: Vec<String>) -> Result<Vec<Target>> {
    let mut targets = Vec::new();

    if let Some(path) = file {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read targets file {}", path.display()))?;
        let from_file = parse_targets(&contents);
        if from_file.is_empty() {
            return Err(anyhow!("no targets found in file {}", path.display()));
        }
        targets.extend(from_file);
    }

    targets.extend(
        extra
            .into_iter()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(Target::from),
    );

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blanks() {
        let text = "# core routers\n10.0.0.1\n\n  10.0.0.2  \n#10.0.0.3\n";
        let targets = parse_targets(text);
        assert_eq!(targets, vec![Target::from("10.0.0.1"), Target::from("10.0.0.2")]);
    }

    #[test]
    fn file_targets_come_first() {
        let path = std::env::temp_dir().join(format!("pingwatch-targets-{}.txt", std::process::id()));
        fs::write(&path, "a\nb\n").unwrap();

        let targets = collect_targets(Some(&path), vec!["c".to_string()]).unwrap();
        let _ = fs::remove_file(&path);

        let names: Vec<&str> = targets.iter().map(Target::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("pingwatch-empty-{}.txt", std::process::id()));
        fs::write(&path, "# nothing here\n").unwrap();

        let err = collect_targets(Some(&path), Vec::new()).unwrap_err();
        let _ = fs::remove_file(&path);

        assert!(err.to_string().contains("no targets found"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = collect_targets(Some(Path::new("/nonexistent/pingwatch.txt")), Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("failed to read targets file"));
    }
}
