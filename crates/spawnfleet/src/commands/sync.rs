use super::Context;
use crate::utils;
use colored::Colorize;
use spawnfleet_core::{Host, SyncFolder};
use spawnfleet_fanout::{ParallelTool, WaitOutcome, run_local};
use std::time::{Duration, Instant};

/// リモートの削除待ちの確認間隔
const CLEAN_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// リモートの削除待ちの上限
const CLEAN_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub async fn handle(
    ctx: &Context,
    hosts: Vec<Host>,
    folder: SyncFolder,
    cleanup: bool,
    save_logs: bool,
) -> anyhow::Result<()> {
    let source = ctx.config.sync_source(folder)?;
    if !source.exists() {
        anyhow::bail!(
            "同期元が存在しません: {}\nヒント: config.yaml の {} を確認してください",
            source.display(),
            folder.key()
        );
    }
    let src = utils::with_trailing_slash(source);
    let remote_dst = ctx.config.remote_path(&utils::base_name(source)?);

    println!("{}", "同期を開始します...".yellow());
    println!("  {} → {}", src.cyan(), remote_dst.cyan());

    let logs = utils::log_dirs(&ctx.paths, "sync", save_logs)?;
    let fanout = ctx.fanout(hosts);

    if cleanup {
        println!();
        println!("{}", format!("■ {} を削除中...", remote_dst).bold());
        let started = Instant::now();
        if !fanout
            .remote_clean(&remote_dst, CLEAN_POLL_INTERVAL, CLEAN_TIMEOUT)
            .await
        {
            anyhow::bail!(
                "リモートの {} が削除されませんでした（{} 秒で打ち切り）",
                remote_dst,
                CLEAN_TIMEOUT.as_secs()
            );
        }
        println!("  削除にかかった時間: {:.2} 秒", started.elapsed().as_secs_f64());
    }

    println!();
    let _ = fanout
        .run(ParallelTool::Ssh, &format!("mkdir -p {}", remote_dst))
        .await;
    if !fanout.remote_exists(&remote_dst).await {
        anyhow::bail!("リモートに {} を作成できませんでした", remote_dst);
    }

    if !fanout
        .run(ParallelTool::Ssh, "sudo apt install -y rsync")
        .await
    {
        println!("  ⚠ rsync のインストールに失敗したノードがあります");
    }

    println!();
    let local_size = run_local(&format!("du -h {} | tail -n 1", src)).await?;
    println!("同期元のサイズ: {}", local_size.cyan());

    let started = Instant::now();
    let handle = fanout
        .logging_to(logs)
        .rsync(&src, &remote_dst, &ctx.config.rsync_flags)
        .await?;

    let progress_cmd = format!("--inline-stdout du -h {} | tail -n 1", remote_dst);
    let progress_cmd = progress_cmd.as_str();
    let fanout = &fanout;
    let outcome = handle
        .wait_with_progress(
            Duration::from_secs(ctx.config.sync_poll_secs),
            move |elapsed| async move {
                println!("経過時間 = {:.2} 秒", elapsed.as_secs_f64());
                let _ = fanout.run(ParallelTool::Ssh, progress_cmd).await;
            },
        )
        .await;

    println!();
    match outcome {
        WaitOutcome::Completed => println!("{}", "✓ 同期が完了しました".green().bold()),
        _ => println!(
            "{}",
            "⚠ 一部のノードで同期に失敗しました（--save-logs で詳細を確認できます）".yellow()
        ),
    }
    println!(
        "--- コピーにかかった時間: {:.4} 秒 ---",
        started.elapsed().as_secs_f64()
    );

    Ok(())
}
