//! モデル定義
//!
//! ホスト、ホストグループ（GPU種別ごと）、設定のデータモデルを定義します。

mod config;
mod fleet;
mod host;

// Re-exports
pub use config::*;
pub use fleet::*;
pub use host::*;
