use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("YAMLパースエラー: {file}\n理由: {message}")]
    YamlParse { file: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("設定キー '{0}' が指定されていません")]
    MissingKey(&'static str),

    #[error("テンプレートエラー: {file}\n理由: {message}")]
    TemplateError { file: PathBuf, message: String },

    #[error("テンプレート展開エラー: {0}")]
    TemplateRenderError(String),

    #[error("不正なGPUグループ: {tier}\n利用可能なグループ: {available}")]
    UnknownGpuTier { tier: u32, available: String },

    #[error("ホスト一覧が空です: {0}\nヒント: 先に sfleet hosts でホストを確保してください")]
    EmptyHostList(PathBuf),

    #[error("ホスト {host} のディスク容量の単位が不正です: '{value}'（G または T のみ対応）")]
    UnknownDiskUnit { host: String, value: String },

    #[error("利用可能なホストが不足しています: {available} 台 (要求 {requested} 台)")]
    InsufficientHosts { available: usize, requested: usize },

    #[error(transparent)]
    Config(#[from] spawnfleet_config::ConfigError),
}

pub type Result<T> = std::result::Result<T, FleetError>;
