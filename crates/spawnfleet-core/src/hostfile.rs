//! ホスト一覧ファイル
//!
//! 1行1ホストのプレーンテキスト。探索コマンドだけが書き込み、
//! 他のすべてのコマンドが読み込む。

use crate::error::{FleetError, Result};
use crate::model::Host;
use std::path::Path;
use tracing::{debug, info};

/// ホスト一覧をファイル形式の文字列にする（各行末に改行）
pub fn render_host_list(hosts: &[Host]) -> String {
    hosts.iter().map(|h| format!("{}\n", h)).collect()
}

/// ホスト一覧を読み込む
///
/// 空行は無視する。ホストが1台もない場合はエラー。
pub fn read_host_file(path: &Path) -> Result<Vec<Host>> {
    let content = std::fs::read_to_string(path).map_err(|e| FleetError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let hosts: Vec<Host> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Host::from)
        .collect();

    if hosts.is_empty() {
        return Err(FleetError::EmptyHostList(path.to_path_buf()));
    }

    debug!(path = %path.display(), count = hosts.len(), "Read host list");
    Ok(hosts)
}

/// ホスト一覧を書き込む（既存の内容は上書き）
pub fn write_host_file(path: &Path, hosts: &[Host]) -> Result<()> {
    std::fs::write(path, render_host_list(hosts)).map_err(|e| FleetError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    info!(path = %path.display(), count = hosts.len(), "Wrote host list");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.txt");
        let hosts = vec![Host::new("10.0.0.1"), Host::new("10.0.0.2")];

        write_host_file(&path, &hosts).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "10.0.0.1\n10.0.0.2\n"
        );
        assert_eq!(read_host_file(&path).unwrap(), hosts);
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.txt");
        std::fs::write(&path, "old-a\nold-b\nold-c\n").unwrap();

        write_host_file(&path, &[Host::new("new")]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn test_read_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.txt");
        std::fs::write(&path, "\n10.0.0.1\n\n  10.0.0.2  \n").unwrap();

        let hosts = read_host_file(&path).unwrap();
        assert_eq!(hosts, vec![Host::new("10.0.0.1"), Host::new("10.0.0.2")]);
    }

    #[test]
    fn test_read_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.txt");
        std::fs::write(&path, "\n").unwrap();

        let err = read_host_file(&path).unwrap_err();
        assert!(matches!(err, FleetError::EmptyHostList(_)));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_host_file(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, FleetError::IoError { .. }));
    }
}
