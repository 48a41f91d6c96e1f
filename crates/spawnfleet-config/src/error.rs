use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "プロジェクトルートが見つかりません\n探索開始位置: {0}\n\
        ヒント: config.yaml を含むディレクトリで実行するか、\
        SPAWNFLEET_PROJECT_ROOT 環境変数で直接指定してください"
    )]
    ProjectRootNotFound(PathBuf),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
