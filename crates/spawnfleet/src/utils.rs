use colored::Colorize;
use spawnfleet_config::ProjectPaths;
use spawnfleet_core::Host;
use spawnfleet_fanout::{LogDirs, Toolchain};
use std::path::Path;

/// 外部ツールの場所を決める
pub fn toolchain(tool_dir: Option<&Path>) -> Toolchain {
    match tool_dir {
        Some(dir) => Toolchain::in_dir(dir),
        None => Toolchain::default(),
    }
}

/// hosts.txt を読み込んで表示
pub fn load_hosts(paths: &ProjectPaths) -> anyhow::Result<Vec<Host>> {
    let hosts = spawnfleet_core::read_host_file(&paths.hosts_file())?;
    println!(
        "{} {}",
        "📄 ホスト一覧:".bold(),
        format!("{} ({} 台)", paths.hosts_file().display(), hosts.len()).cyan()
    );
    Ok(hosts)
}

/// `--save-logs` 指定時だけログディレクトリを用意する
pub fn log_dirs(
    paths: &ProjectPaths,
    operation: &str,
    save_logs: bool,
) -> anyhow::Result<Option<LogDirs>> {
    if !save_logs {
        return Ok(None);
    }
    let dirs = LogDirs::prepare(paths.root(), operation)?;
    println!("ログ出力先: {}", paths.log_dir(operation).display().to_string().cyan());
    Ok(Some(dirs))
}

/// 同期元のパスを末尾スラッシュ付きで返す（rsync でディレクトリの中身を送るため）
pub fn with_trailing_slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    format!("{}/", s.trim_end_matches('/'))
}

/// パスの最後の要素
pub fn base_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("パス '{}' からファイル名を取得できません", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_trailing_slash() {
        assert_eq!(with_trailing_slash(Path::new("/srv/proj")), "/srv/proj/");
        assert_eq!(with_trailing_slash(Path::new("/srv/proj/")), "/srv/proj/");
        assert_eq!(with_trailing_slash(Path::new("/srv/proj//")), "/srv/proj/");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name(Path::new("/srv/proj/")).unwrap(), "proj");
        assert_eq!(base_name(Path::new("scripts/install.sh")).unwrap(), "install.sh");
        assert!(base_name(Path::new("/")).is_err());
    }

    #[test]
    fn test_toolchain_dir() {
        let tools = toolchain(Some(Path::new("/opt/pssh/bin")));
        assert_eq!(tools.ssh, Path::new("/opt/pssh/bin/ssh"));
        assert_eq!(toolchain(None).ssh, Path::new("ssh"));
    }

    #[test]
    fn test_log_dirs_only_when_saving() {
        let root = tempfile::tempdir().unwrap();
        let paths = ProjectPaths::new(root.path());

        assert!(log_dirs(&paths, "container", false).unwrap().is_none());
        assert!(!root.path().join("container").exists());

        let dirs = log_dirs(&paths, "container", true).unwrap().unwrap();
        assert!(dirs.out.is_dir());
        assert!(dirs.err.is_dir());
    }
}
