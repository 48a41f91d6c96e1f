use super::Context;
use colored::Colorize;
use spawnfleet_core::{GPU_QUERY, Host, ProbeStatus, classify_host, disk_query, select_hosts};
use spawnfleet_fanout::{LogDirs, ParallelTool};

const GPU_LOG: &str = "gpu";
const DISK_LOG: &str = "disk";

/// 探索条件（設定値にフラグを上書きしたもの）
#[derive(Debug, Clone, Copy)]
pub struct HostRequest {
    pub num_nodes: usize,
    pub min_disk: f64,
    pub tier: u32,
}

pub async fn handle(ctx: &Context, request: HostRequest, save_logs: bool) -> anyhow::Result<()> {
    let group = ctx.config.fleet.group(request.tier)?;
    if group.is_empty() {
        anyhow::bail!(
            "GPUグループ {} に探索対象のノードがありません\nヒント: config.yaml の fleet.exclude と tiers を確認してください",
            request.tier
        );
    }
    println!("{}", "空いているノードを探索中...".yellow());
    println!(
        "GPUグループ: {} ({} 台) / 必要台数: {} / 必要ディスク: {}G",
        request.tier.to_string().cyan(),
        group.len(),
        request.num_nodes.to_string().cyan(),
        request.min_disk
    );

    let root = ctx.paths.root();
    LogDirs::cleanup(root, GPU_LOG)?;
    LogDirs::cleanup(root, DISK_LOG)?;
    let gpu_logs = LogDirs::prepare(root, GPU_LOG)?;
    let disk_logs = LogDirs::prepare(root, DISK_LOG)?;

    // 一部のホストが落ちていても続行する。判定はホストごとのログで行う
    let fanout = ctx.fanout(group.hosts().to_vec());
    let _ = fanout
        .logging_to(Some(gpu_logs.clone()))
        .run(ParallelTool::Ssh, GPU_QUERY)
        .await;
    let _ = fanout
        .logging_to(Some(disk_logs.clone()))
        .run(ParallelTool::Ssh, &disk_query(&ctx.config.docker_drive))
        .await;

    let results = collect_results(group.hosts(), &gpu_logs, &disk_logs, request.min_disk)?;

    println!();
    for (host, status) in &results {
        let label = match status {
            ProbeStatus::Available => status.to_string().green(),
            ProbeStatus::Busy { .. } => status.to_string().yellow(),
            _ => status.to_string().red(),
        };
        println!("  {} {}", host.as_str().cyan(), label);
        // 到達できなかったホストは ssh のエラーを添える（読めなければ省略）
        if *status == ProbeStatus::Unreachable {
            let stderr = gpu_logs.read_stderr(host).unwrap_or_default();
            if let Some(reason) = first_line(&stderr) {
                println!("      {}", reason.dimmed());
            }
        }
    }

    let available: Vec<&Host> = results
        .iter()
        .filter(|(_, status)| status.is_available())
        .map(|(host, _)| host)
        .collect();
    println!();
    println!("{}", format!("利用可能なノード ({} 台):", available.len()).bold());
    for host in &available {
        println!("  • {}", host.as_str().green());
    }

    let selected = match select_hosts(&results, request.num_nodes) {
        Ok(selected) => selected,
        Err(e) => {
            println!();
            println!("{}", "✗ 必要な台数を確保できませんでした".red().bold());
            println!("  hosts.txt は更新していません");
            return Err(e.into());
        }
    };

    let hosts_file = ctx.paths.hosts_file();
    spawnfleet_core::write_host_file(&hosts_file, &selected)?;
    println!();
    println!(
        "{}",
        format!("✓ {} 台を確保しました", selected.len()).green().bold()
    );
    println!("  {}", hosts_file.display().to_string().cyan());

    if !save_logs {
        LogDirs::cleanup(root, GPU_LOG)?;
        LogDirs::cleanup(root, DISK_LOG)?;
    }

    Ok(())
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

/// ホストごとのログから判定結果を集める（グループ内の順序を保つ）
pub fn collect_results(
    hosts: &[Host],
    gpu_logs: &LogDirs,
    disk_logs: &LogDirs,
    min_disk: f64,
) -> anyhow::Result<Vec<(Host, ProbeStatus)>> {
    let mut results = Vec::with_capacity(hosts.len());
    for host in hosts {
        let gpu = gpu_logs.read_stdout(host)?;
        let disk = disk_logs.read_stdout(host)?;
        let status = classify_host(host, &gpu, &disk, min_disk)?;
        results.push((host.clone(), status));
    }
    Ok(results)
}
