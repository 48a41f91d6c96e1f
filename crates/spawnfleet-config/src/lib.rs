pub mod error;

pub use error::*;

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// ベース設定ファイル名
pub const CONFIG_FILE: &str = "config.yaml";
/// ベース設定で展開されるテンプレート設定ファイル名
pub const TEMPLATE_FILE: &str = "template.yaml";
/// 探索で確保したホスト一覧ファイル名
pub const HOSTS_FILE: &str = "hosts.txt";
/// プロジェクトルートを直接指定する環境変数
pub const PROJECT_ROOT_ENV: &str = "SPAWNFLEET_PROJECT_ROOT";

/// プロジェクトルート（config.yaml を含むディレクトリ）を探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 SPAWNFLEET_PROJECT_ROOT
/// 2. カレントディレクトリから上に向かって config.yaml を探す
/// 3. ~/.config/spawnfleet/config.yaml (グローバル設定)
#[tracing::instrument]
pub fn find_project_root() -> Result<PathBuf> {
    // 1. 環境変数
    if let Ok(root) = std::env::var(PROJECT_ROOT_ENV) {
        let path = PathBuf::from(&root);
        debug!(env_root = %root, "Checking SPAWNFLEET_PROJECT_ROOT");
        if path.join(CONFIG_FILE).exists() {
            info!(project_root = %path.display(), "Found project root from environment variable");
            return Ok(path);
        }
        warn!(env_root = %root, "SPAWNFLEET_PROJECT_ROOT has no config.yaml, falling back to search");
    }

    // 2. カレントディレクトリから上に向かって探す
    let start_dir = std::env::current_dir()?;
    let mut current = start_dir.clone();
    loop {
        debug!(checking = %current.display(), "Looking for config.yaml");
        if current.join(CONFIG_FILE).exists() {
            info!(project_root = %current.display(), "Found project root");
            return Ok(current);
        }
        if !current.pop() {
            break;
        }
    }

    // 3. グローバル設定
    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("spawnfleet");
        if global.join(CONFIG_FILE).exists() {
            info!(project_root = %global.display(), "Using global config directory");
            return Ok(global);
        }
    }

    warn!(start_dir = %start_dir.display(), "Project root not found");
    Err(ConfigError::ProjectRootNotFound(start_dir))
}

/// プロジェクトルート配下のファイル配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// ルートを探索して作成
    pub fn discover() -> Result<Self> {
        find_project_root().map(Self::new)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn template_file(&self) -> PathBuf {
        self.root.join(TEMPLATE_FILE)
    }

    pub fn hosts_file(&self) -> PathBuf {
        self.root.join(HOSTS_FILE)
    }

    /// 操作ごとのログディレクトリ（`<root>/<op>`）
    pub fn log_dir(&self, operation: &str) -> PathBuf {
        self.root.join(operation)
    }

    /// プロジェクトルート相対のパスを解決（絶対パスはそのまま）
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
