//! 設定定義
//!
//! `config.yaml` と展開済み `template.yaml` をマージした結果を表す。
//! 起動時に一度だけ構築し、各コマンドへ参照で渡す。

use super::FleetSpec;
use crate::error::{FleetError, Result};
use serde::{Deserialize, Serialize};
use spawnfleet_config::ProjectPaths;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// コンテナ操作で使うスクリプトの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Install,
    Exec,
    Clean,
}

impl ScriptKind {
    pub fn key(&self) -> &'static str {
        match self {
            ScriptKind::Install => "install_script",
            ScriptKind::Exec => "exec_script",
            ScriptKind::Clean => "clean_script",
        }
    }
}

/// 同期対象フォルダ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncFolder {
    Project,
    Data,
}

impl SyncFolder {
    pub fn key(&self) -> &'static str {
        match self {
            SyncFolder::Project => "project_path",
            SyncFolder::Data => "data_path",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// リモートのユーザー名（コンテナ名 `{user}_spawn` にも使う）
    pub user: String,
    #[serde(default)]
    pub install_script: Option<PathBuf>,
    #[serde(default)]
    pub exec_script: Option<PathBuf>,
    #[serde(default)]
    pub clean_script: Option<PathBuf>,
    /// コンテナを起動するコマンド（`up` で使用）
    #[serde(default)]
    pub docker_start: Option<String>,
    #[serde(default)]
    pub rsync_flags: String,
    /// GPU種別（`fleet.tiers` のキー）
    #[serde(default = "default_gpus")]
    pub gpus: u32,
    #[serde(default = "default_num_nodes")]
    pub num_nodes: usize,
    /// 必要な空きディスク容量 (GB)
    #[serde(default)]
    pub min_disk: f64,
    #[serde(default)]
    pub project_path: Option<PathBuf>,
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    /// 省略時は `/home/{user}`
    #[serde(default)]
    pub remote_home: Option<String>,
    #[serde(default = "default_docker_drive")]
    pub docker_drive: String,
    #[serde(default = "default_done_file")]
    pub done_file: String,
    #[serde(default = "default_sync_poll_secs")]
    pub sync_poll_secs: u64,
    /// 非ブロッキング起動後の待ち時間（秒）
    #[serde(default = "default_launch_grace_secs")]
    pub launch_grace_secs: u64,
    #[serde(default)]
    pub fleet: FleetSpec,
    /// スクリプトのテンプレート展開用に残す未知のキー
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_gpus() -> u32 {
    40
}

fn default_num_nodes() -> usize {
    1
}

fn default_docker_drive() -> String {
    "/var/lib/docker".to_string()
}

fn default_done_file() -> String {
    "done.txt".to_string()
}

fn default_sync_poll_secs() -> u64 {
    10
}

fn default_launch_grace_secs() -> u64 {
    5
}

impl FleetConfig {
    /// 最小構成の設定を作成（他の値はデフォルト）
    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            install_script: None,
            exec_script: None,
            clean_script: None,
            docker_start: None,
            rsync_flags: String::new(),
            gpus: default_gpus(),
            num_nodes: default_num_nodes(),
            min_disk: 0.0,
            project_path: None,
            data_path: None,
            remote_home: None,
            docker_drive: default_docker_drive(),
            done_file: default_done_file(),
            sync_poll_secs: default_sync_poll_secs(),
            launch_grace_secs: default_launch_grace_secs(),
            fleet: FleetSpec::default(),
            extra: BTreeMap::new(),
        }
    }

    pub fn remote_home(&self) -> String {
        match &self.remote_home {
            Some(home) => home.trim_end_matches('/').to_string(),
            None => format!("/home/{}", self.user),
        }
    }

    /// リモートのホームディレクトリ直下のパス
    pub fn remote_path(&self, name: &str) -> String {
        format!("{}/{}", self.remote_home(), name)
    }

    /// サンドボックスコンテナ名
    pub fn container_name(&self) -> String {
        format!("{}_spawn", self.user)
    }

    pub fn script(&self, kind: ScriptKind) -> Result<&Path> {
        let path = match kind {
            ScriptKind::Install => &self.install_script,
            ScriptKind::Exec => &self.exec_script,
            ScriptKind::Clean => &self.clean_script,
        };
        path.as_deref().ok_or(FleetError::MissingKey(kind.key()))
    }

    pub fn sync_source(&self, folder: SyncFolder) -> Result<&Path> {
        let path = match folder {
            SyncFolder::Project => &self.project_path,
            SyncFolder::Data => &self.data_path,
        };
        path.as_deref().ok_or(FleetError::MissingKey(folder.key()))
    }

    pub fn docker_start(&self) -> Result<&str> {
        self.docker_start
            .as_deref()
            .ok_or(FleetError::MissingKey("docker_start"))
    }

    /// 相対パスをプロジェクトルート基準に解決
    pub(crate) fn resolve_paths(&mut self, paths: &ProjectPaths) {
        let resolve = |p: &mut Option<PathBuf>| {
            if let Some(path) = p {
                *path = paths.resolve(&*path);
            }
        };
        resolve(&mut self.install_script);
        resolve(&mut self.exec_script);
        resolve(&mut self.clean_script);
        resolve(&mut self.project_path);
        resolve(&mut self.data_path);
    }
}
