use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serializes `value` next to `path` and moves it into place once it is on
/// disk, so a reader never sees a half-written report.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    let staging = staging_path(path);
    if let Err(err) = stage(&staging, value) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }
    fs::rename(&staging, path)
        .map_err(|err| {
            let _ = fs::remove_file(&staging);
            err
        })
        .with_context(|| format!("failed to move report into {}", path.display()))?;

    sync_dir(dir);
    Ok(())
}

fn stage<T: Serialize>(staging: &Path, value: &T) -> Result<()> {
    let file = File::create(staging)
        .with_context(|| format!("failed to create {}", staging.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("failed to serialize report to {}", staging.display()))?;
    writer.write_all(b"\n")?;
    let file = writer
        .into_inner()
        .map_err(|err| err.into_error())
        .with_context(|| format!("failed to flush {}", staging.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to sync {}", staging.display()))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "report.json".into());
    name.push(format!(".tmp-{}", std::process::id()));
    path.with_file_name(name)
}

/// Persists the rename itself. Directories cannot be opened for syncing on
/// Windows, so this is a no-op there.
fn sync_dir(dir: &Path) {
    if cfg!(windows) {
        return;
    }
    if let Err(err) = File::open(dir).and_then(|handle| handle.sync_all()) {
        debug!(dir = %dir.display(), error = %err, "directory sync skipped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pingwatch_model::{FinalReport, StatsTable, Target};

    fn report() -> FinalReport {
        let targets = vec![Target::from("10.0.0.1")];
        let mut stats = StatsTable::new(&targets);
        stats.record(&Target::from("10.0.0.1"), true);
        stats.to_report("start".to_string(), "end".to_string())
    }

    #[test]
    fn report_is_written_whole() {
        let dir = std::env::temp_dir().join(format!("pingwatch-report-{}", std::process::id()));
        let path = dir.join("nested").join("report.json");

        write_json(&path, &report()).unwrap();
        let written: FinalReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let names: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        let _ = fs::remove_dir_all(&dir);

        assert_eq!(written, report());
        assert_eq!(names, vec![std::ffi::OsString::from("report.json")]);
    }

    #[test]
    fn existing_report_is_replaced() {
        let dir = std::env::temp_dir().join(format!("pingwatch-replace-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("report.json");
        fs::write(&path, "stale").unwrap();

        write_json(&path, &report()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let _ = fs::remove_dir_all(&dir);

        assert!(text.starts_with('{'));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn staging_file_sits_beside_the_target() {
        let staging = staging_path(Path::new("out/stats.json"));
        assert_eq!(staging.parent(), Some(Path::new("out")));
        assert_eq!(
            staging.file_name().unwrap().to_string_lossy(),
            format!("stats.json.tmp-{}", std::process::id())
        );
    }
}
