//! リモート操作のヘルパー
//!
//! ファイル配布（parallel-scp / parallel-rsync）と、リモートパスの存在確認・
//! 削除待ちをファンアウトの上に組み立てる。

use crate::error::Result;
use crate::fanout::FanOut;
use crate::handle::CommandHandle;
use crate::tool::ParallelTool;
use indicatif::{ProgressBar, ProgressStyle};
use spawnfleet_core::Host;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

impl FanOut {
    /// ローカルファイルを全ホストへコピー（ブロッキング）
    #[must_use]
    pub async fn scp(&self, src: &Path, dst: &str) -> bool {
        self.run(ParallelTool::Scp, &format!("{} {}", src.display(), dst))
            .await
    }

    /// ディレクトリを全ホストへ同期（非ブロッキング）
    ///
    /// 全ホストへ同時に転送するため `--par` はホスト数にする。
    pub async fn rsync(&self, src: &str, dst: &str, flags: &str) -> Result<CommandHandle> {
        let cmd = format!("{} --par {} {} {}", flags, self.hosts().len(), src, dst);
        self.launch(ParallelTool::Rsync, &cmd).await
    }

    /// 全ホストにパスが存在すればtrue
    #[must_use]
    pub async fn remote_exists(&self, path: &str) -> bool {
        self.run(ParallelTool::Ssh, &format!("test -e {}", path)).await
    }

    /// 全ホストでパスが存在しなければtrue
    #[must_use]
    pub async fn remote_absent(&self, path: &str) -> bool {
        self.run(ParallelTool::Ssh, &format!("test ! -e {}", path))
            .await
    }

    /// 1台のホストからファイルを取得する（scp）
    #[must_use]
    pub async fn copy_from_host(&self, host: &Host, remote: &str, local_dir: &Path) -> bool {
        let from = format!("{}:{}", host, remote);
        let to = format!("{}/", local_dir.display());
        self.scp_once(&from, &to).await
    }

    /// 1台のホストへファイルを送る（scp）
    #[must_use]
    pub async fn copy_to_host(&self, host: &Host, local: &Path, remote: &str) -> bool {
        let from = local.display().to_string();
        let to = format!("{}:{}", host, remote);
        self.scp_once(&from, &to).await
    }

    async fn scp_once(&self, from: &str, to: &str) -> bool {
        let program = &self.toolchain().scp;
        debug!(program = %program.display(), from, to, "Running scp");
        match Command::new(program)
            .arg(from)
            .arg(to)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
        {
            Ok(output) if output.status.success() => true,
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!(from, to, code = ?output.status.code(), stderr = %stderr.trim(), "scp failed");
                false
            }
            Err(e) => {
                warn!(from, to, error = %e, "Could not run scp");
                false
            }
        }
    }

    /// 全ホストでパスを削除し、消えるまで待つ
    ///
    /// `timeout` を過ぎても残っている場合はfalse。
    pub async fn remote_clean(&self, path: &str, interval: Duration, timeout: Duration) -> bool {
        if !self.run(ParallelTool::Ssh, &format!("rm -rf {}", path)).await {
            warn!(path, "rm -rf reported failure on some hosts, waiting anyway");
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Deleting {}", path));

        let started = Instant::now();
        loop {
            if self.remote_absent(path).await {
                spinner.finish_with_message(format!("{} has been successfully deleted", path));
                info!(path, elapsed = ?started.elapsed(), "Remote path deleted on all hosts");
                return true;
            }
            if started.elapsed() >= timeout {
                spinner.abandon_with_message(format!("Timed out deleting {}", path));
                warn!(path, ?timeout, "Remote path still present");
                return false;
            }
            spinner.tick();
            tokio::time::sleep(interval).await;
        }
    }
}
