//! 外部ツールの定義
//!
//! 並列実行そのものは pssh 系のツールに任せる。ここでは呼び出すプログラムを
//! 決めるだけ。

use std::fmt;
use std::path::{Path, PathBuf};

/// pssh パッケージの並列実行ツール
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelTool {
    Ssh,
    Scp,
    Rsync,
}

impl ParallelTool {
    pub fn default_program(&self) -> &'static str {
        match self {
            ParallelTool::Ssh => "parallel-ssh",
            ParallelTool::Scp => "parallel-scp",
            ParallelTool::Rsync => "parallel-rsync",
        }
    }
}

impl fmt::Display for ParallelTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_program())
    }
}

/// 実際に起動するプログラムのパス
///
/// 通常は PATH 上の同名コマンド。テストでは差し替える。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub parallel_ssh: PathBuf,
    pub parallel_scp: PathBuf,
    pub parallel_rsync: PathBuf,
    pub ssh: PathBuf,
    pub scp: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            parallel_ssh: PathBuf::from("parallel-ssh"),
            parallel_scp: PathBuf::from("parallel-scp"),
            parallel_rsync: PathBuf::from("parallel-rsync"),
            ssh: PathBuf::from("ssh"),
            scp: PathBuf::from("scp"),
        }
    }
}

impl Toolchain {
    /// 指定ディレクトリ内の同名プログラムを使う
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            parallel_ssh: dir.join("parallel-ssh"),
            parallel_scp: dir.join("parallel-scp"),
            parallel_rsync: dir.join("parallel-rsync"),
            ssh: dir.join("ssh"),
            scp: dir.join("scp"),
        }
    }

    pub fn program(&self, tool: ParallelTool) -> &Path {
        match tool {
            ParallelTool::Ssh => &self.parallel_ssh,
            ParallelTool::Scp => &self.parallel_scp,
            ParallelTool::Rsync => &self.parallel_rsync,
        }
    }
}
