use super::Context;
use colored::Colorize;
use spawnfleet_core::{Host, MarkerSet};

pub async fn handle(ctx: &Context, hosts: Vec<Host>) -> anyhow::Result<()> {
    println!("{}", "完了マーカーを集約中...".yellow());

    let remote = ctx.config.remote_path(&ctx.config.done_file);
    let fanout = ctx.fanout(hosts);
    let download = tempfile::tempdir_in(ctx.paths.root())?;
    let downloaded = download.path().join(&ctx.config.done_file);

    let mut markers = MarkerSet::new();
    for host in fanout.hosts() {
        // 前のホストのファイルを読まないように消しておく
        let _ = std::fs::remove_file(&downloaded);

        if !fanout.copy_from_host(host, &remote, download.path()).await {
            println!("  ⚠ {} から取得できませんでした", host.as_str().yellow());
            continue;
        }
        match std::fs::read_to_string(&downloaded) {
            Ok(content) => {
                let added = markers.absorb(&content);
                println!("  • {} (+{})", host.as_str().cyan(), added);
            }
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "Could not read downloaded marker file");
                println!("  ⚠ {} のファイルを読めませんでした", host.as_str().yellow());
            }
        }
    }

    let local = ctx.paths.root().join(&ctx.config.done_file);
    std::fs::write(&local, markers.render())?;
    println!();
    println!("{}", format!("# done = {}", markers.len()).green().bold());
    println!("  {}", local.display().to_string().cyan());
    if markers.is_empty() {
        println!("  ⚠ 完了マーカーが1件も集まりませんでした");
    }

    println!();
    println!("{}", "集約結果を配布中...".yellow());
    for host in fanout.hosts() {
        if fanout.copy_to_host(host, &local, &remote).await {
            println!("  ✓ {}", host.as_str().cyan());
        } else {
            println!("  ⚠ {} への配布に失敗しました", host.as_str().yellow());
        }
    }

    Ok(())
}
