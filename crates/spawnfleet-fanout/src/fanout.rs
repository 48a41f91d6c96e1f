//! コマンドのファンアウト
//!
//! ホスト一覧を一時ファイルに書き出し、pssh 系ツールで全ホストに同じコマンドを
//! 実行する。ブロッキング実行は全体の成否だけを返し、ホスト単位の結果は
//! ログディレクトリで確認する。

use crate::error::{FanOutError, Result};
use crate::handle::CommandHandle;
use crate::logs::LogDirs;
use crate::tool::{ParallelTool, Toolchain};
use spawnfleet_core::{Host, render_host_list};
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// 起動後、子プロセスがホスト一覧を読み終えるまで待つ時間
pub const DEFAULT_LAUNCH_GRACE: Duration = Duration::from_secs(5);

/// 全ホストへのコマンド実行
#[derive(Debug, Clone)]
pub struct FanOut {
    hosts: Vec<Host>,
    logs: Option<LogDirs>,
    toolchain: Toolchain,
    grace: Duration,
}

impl FanOut {
    pub fn new(hosts: Vec<Host>) -> Self {
        Self {
            hosts,
            logs: None,
            toolchain: Toolchain::default(),
            grace: DEFAULT_LAUNCH_GRACE,
        }
    }

    /// ホストごとの stdout/stderr をログディレクトリに保存する
    pub fn with_logs(mut self, logs: Option<LogDirs>) -> Self {
        self.logs = logs;
        self
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// 同じホスト・ツール設定でログ出力先だけを変えたコピー
    pub fn logging_to(&self, logs: Option<LogDirs>) -> Self {
        self.clone().with_logs(logs)
    }

    /// pssh 系ツールへ渡す引数
    ///
    /// `-h <hostfile> [-o <out>] [-e <err>]` の後にコマンドを空白で分割して並べる。
    /// リモート側では pssh が再び空白で連結して実行する。
    pub fn build_args(&self, host_file: &Path, cmd: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-h".into(), host_file.into()];
        if let Some(logs) = &self.logs {
            args.push("-o".into());
            args.push(logs.out.clone().into());
            args.push("-e".into());
            args.push(logs.err.clone().into());
        }
        args.extend(cmd.split_whitespace().map(OsString::from));
        args
    }

    fn write_host_file(&self) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new().map_err(FanOutError::HostFile)?;
        file.write_all(render_host_list(&self.hosts).as_bytes())
            .map_err(FanOutError::HostFile)?;
        file.flush().map_err(FanOutError::HostFile)?;
        Ok(file)
    }

    /// 全ホストで実行し、完了まで待つ
    ///
    /// ツールの終了コードが0ならtrue。失敗してもエラーは返さず、出力を表示して
    /// falseを返す。
    #[must_use]
    #[tracing::instrument(skip(self), fields(hosts = self.hosts.len()))]
    pub async fn run(&self, tool: ParallelTool, cmd: &str) -> bool {
        let host_file = match self.write_host_file() {
            Ok(file) => file,
            Err(e) => {
                println!("{}::{} {}", e, tool, cmd.trim());
                return false;
            }
        };

        let program = self.toolchain.program(tool);
        let args = self.build_args(host_file.path(), cmd);
        debug!(program = %program.display(), ?args, "Running fan-out");

        let output = match Command::new(program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                let e = FanOutError::Spawn {
                    program: program.display().to_string(),
                    source: e,
                };
                println!("{}::{} {}", e, tool, cmd.trim());
                return false;
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        println!("{}::{} {}", stdout.trim(), tool, cmd.trim());

        if output.status.success() {
            true
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                tool = %tool,
                code = ?output.status.code(),
                stderr = %stderr.trim(),
                "Fan-out returned non-zero exit status"
            );
            false
        }
    }

    /// 全ホストで起動し、完了を待たずにハンドルを返す
    ///
    /// 子プロセスがホスト一覧を読めるよう、猶予時間だけ待ってから戻る。
    #[tracing::instrument(skip(self), fields(hosts = self.hosts.len()))]
    pub async fn launch(&self, tool: ParallelTool, cmd: &str) -> Result<CommandHandle> {
        let host_file = self.write_host_file()?;
        let program = self.toolchain.program(tool);
        let args = self.build_args(host_file.path(), cmd);
        debug!(program = %program.display(), ?args, "Launching fan-out");

        let started = Instant::now();
        let child = Command::new(program)
            .args(&args)
            .spawn()
            .map_err(|e| FanOutError::Spawn {
                program: program.display().to_string(),
                source: e,
            })?;
        info!(tool = %tool, pid = ?child.id(), "Fan-out launched");

        tokio::time::sleep(self.grace).await;
        Ok(CommandHandle::new(child, tool, started, host_file))
    }

    /// ホストごとに順番に ssh で実行する
    ///
    /// `make_cmd` にはホストの番号（0始まり）が渡される。ノードランクの
    /// 割り当てなどに使う。
    pub async fn run_enumerated<F>(&self, make_cmd: F) -> Vec<(Host, bool)>
    where
        F: Fn(usize) -> String,
    {
        let mut results = Vec::with_capacity(self.hosts.len());

        for (index, host) in self.hosts.iter().enumerate() {
            let cmd = make_cmd(index);
            let output = Command::new(&self.toolchain.ssh)
                .arg(host.as_str())
                .args(cmd.split_whitespace())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .await;

            let ok = match output {
                Ok(output) => {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    println!("{}::{}", stdout.trim(), cmd.trim());
                    output.status.success()
                }
                Err(e) => {
                    println!("{}::{}", e, cmd.trim());
                    false
                }
            };
            if !ok {
                warn!(host = %host, index, "Enumerated command failed");
            }
            results.push((host.clone(), ok));
        }

        results
    }
}

/// ローカルでシェルコマンドを実行して標準出力を返す
pub async fn run_local(cmd: &str) -> Result<String> {
    let output = Command::new("sh").arg("-c").arg(cmd).output().await?;
    if !output.status.success() {
        warn!(cmd, code = ?output.status.code(), "Local command failed");
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
