//! 非ブロッキング実行のハンドルとタイムアウト付き待機
//!
//! 起動済みのファンアウトを所有し、一定間隔で完了を待つ。タイムアウトしても
//! 子プロセスは止めない（中断手段はない）。

use crate::tool::ParallelTool;
use std::future::Future;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::process::Child;
use tracing::{debug, warn};

/// 1回の待機の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// 全ホストで成功して終了
    Completed,
    /// 待機時間内に終了しなかった（実行は継続中）
    TimedOut,
    /// 非0で終了、または終了状態を取得できなかった
    Failed(Option<i32>),
}

impl WaitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WaitOutcome::Completed)
    }
}

/// 実行中のファンアウト
///
/// ホスト一覧の一時ファイルはハンドルが破棄されるまで残る。
#[derive(Debug)]
pub struct CommandHandle {
    child: Child,
    tool: ParallelTool,
    started: Instant,
    _host_file: NamedTempFile,
}

impl CommandHandle {
    pub(crate) fn new(
        child: Child,
        tool: ParallelTool,
        started: Instant,
        host_file: NamedTempFile,
    ) -> Self {
        Self {
            child,
            tool,
            started,
            _host_file: host_file,
        }
    }

    /// 起動からの経過時間（起動直後の猶予時間を含む）
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// 最大 `timeout` だけ終了を待つ
    pub async fn wait_timeout(&mut self, timeout: Duration) -> WaitOutcome {
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Err(_) => WaitOutcome::TimedOut,
            Ok(Ok(status)) if status.success() => {
                debug!(tool = %self.tool, "Fan-out completed");
                WaitOutcome::Completed
            }
            Ok(Ok(status)) => {
                warn!(tool = %self.tool, code = ?status.code(), "Fan-out failed");
                WaitOutcome::Failed(status.code())
            }
            Ok(Err(e)) => {
                warn!(tool = %self.tool, error = %e, "Could not read fan-out exit status");
                WaitOutcome::Failed(None)
            }
        }
    }

    /// 終了するまで `interval` ごとに待機し、タイムアウトのたびに
    /// `on_timeout(経過時間)` を実行する
    ///
    /// 戻り値は `Completed` または `Failed` のみ。
    pub async fn wait_with_progress<F, Fut>(
        mut self,
        interval: Duration,
        mut on_timeout: F,
    ) -> WaitOutcome
    where
        F: FnMut(Duration) -> Fut,
        Fut: Future<Output = ()>,
    {
        loop {
            match self.wait_timeout(interval).await {
                WaitOutcome::TimedOut => on_timeout(self.elapsed()).await,
                outcome => return outcome,
            }
        }
    }
}
