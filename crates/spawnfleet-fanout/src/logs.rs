//! ホストごとのログ配置
//!
//! 操作ごとに `<root>/<op>/out` と `<root>/<op>/err` を作り、pssh がその中に
//! ホスト名のファイルを書き出す。

use crate::error::{FanOutError, Result};
use spawnfleet_core::Host;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirs {
    pub out: PathBuf,
    pub err: PathBuf,
}

impl LogDirs {
    /// ログディレクトリを作成（既存なら何もしない）
    pub fn prepare(root: &Path, operation: &str) -> Result<Self> {
        let base = root.join(operation);
        let dirs = Self {
            out: base.join("out"),
            err: base.join("err"),
        };
        for dir in [&dirs.out, &dirs.err] {
            std::fs::create_dir_all(dir).map_err(|e| FanOutError::LogDir {
                path: dir.clone(),
                message: e.to_string(),
            })?;
        }
        debug!(out = %dirs.out.display(), err = %dirs.err.display(), "Prepared log directories");
        Ok(dirs)
    }

    /// 操作のログディレクトリを丸ごと削除
    ///
    /// 存在しない場合は何もせず false を返す。
    pub fn cleanup(root: &Path, operation: &str) -> Result<bool> {
        let base = root.join(operation);
        match std::fs::remove_dir_all(&base) {
            Ok(()) => {
                info!(path = %base.display(), "Removed log directory");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %base.display(), "No log directory to remove");
                Ok(false)
            }
            Err(e) => Err(FanOutError::LogDir {
                path: base,
                message: e.to_string(),
            }),
        }
    }

    pub fn stdout_path(&self, host: &Host) -> PathBuf {
        self.out.join(host.as_str())
    }

    pub fn stderr_path(&self, host: &Host) -> PathBuf {
        self.err.join(host.as_str())
    }

    /// ホストの標準出力ログを読む（ファイルがなければ空文字列）
    pub fn read_stdout(&self, host: &Host) -> Result<String> {
        read_or_empty(&self.stdout_path(host))
    }

    pub fn read_stderr(&self, host: &Host) -> Result<String> {
        read_or_empty(&self.stderr_path(host))
    }
}

/// 壊れたバイト列は置換文字に置き換えて読む
fn read_or_empty(path: &Path) -> Result<String> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}
