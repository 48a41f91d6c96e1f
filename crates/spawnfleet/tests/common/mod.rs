#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;

/// config.yaml と偽の外部ツールを置いた一時プロジェクト
pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("tools")).unwrap();
        Self { root }
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn tool_dir(&self) -> PathBuf {
        self.root.path().join("tools")
    }

    pub fn write_config(&self, content: &str) {
        self.write_file("config.yaml", content);
    }

    pub fn write_hosts(&self, hosts: &[&str]) {
        let content: String = hosts.iter().map(|h| format!("{}\n", h)).collect();
        self.write_file("hosts.txt", &content);
    }

    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn read_file(&self, relative: &str) -> String {
        fs::read_to_string(self.root.path().join(relative)).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.root.path().join(relative).exists()
    }

    /// tools/ にシェルスクリプトを置く
    pub fn install_tool(&self, name: &str, script: &str) {
        let path = self.tool_dir().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// ツールが記録した引数（呼び出しごとに1行）
    pub fn tool_calls(&self, name: &str) -> Vec<String> {
        fs::read_to_string(self.tool_dir().join(format!("{}.args", name)))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// プロジェクトと偽ツールを指した sfleet コマンド
    #[allow(deprecated)]
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("sfleet").unwrap();
        cmd.current_dir(self.root.path())
            .env("SPAWNFLEET_PROJECT_ROOT", self.root.path())
            .env("SPAWNFLEET_TOOL_DIR", self.tool_dir())
            .env("NO_COLOR", "1");
        cmd
    }
}

/// 引数を記録するだけのツール
pub const RECORD_ARGS: &str = r#"echo "$@" >> "$0.args""#;
