use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FanOutError {
    #[error("ホスト一覧の一時ファイルを作成できません: {0}")]
    HostFile(#[source] std::io::Error),

    #[error(
        "{program} を起動できません: {source}\n\nヒント:\n  • parallel-ssh (pssh) がインストールされているか確認してください"
    )]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ログディレクトリエラー: {path}\n理由: {message}")]
    LogDir { path: PathBuf, message: String },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FanOutError>;
