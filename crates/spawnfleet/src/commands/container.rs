use super::Context;
use crate::utils;
use colored::Colorize;
use spawnfleet_core::{FleetConfig, Host, ScriptKind, TemplateProcessor};
use spawnfleet_fanout::{FanOut, ParallelTool};
use std::io::Write;

/// コンテナ操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Exec { enumerate: bool },
    Down,
}

impl Action {
    fn script(&self) -> ScriptKind {
        match self {
            Action::Up => ScriptKind::Install,
            Action::Exec { .. } => ScriptKind::Exec,
            Action::Down => ScriptKind::Clean,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Action::Up => "コンテナを起動中...",
            Action::Exec { .. } => "スクリプトを実行中...",
            Action::Down => "コンテナを削除中...",
        }
    }
}

pub async fn handle(
    ctx: &Context,
    hosts: Vec<Host>,
    action: Action,
    inline: bool,
    save_logs: bool,
) -> anyhow::Result<()> {
    println!("{}", action.label().yellow());
    println!("コンテナ: {}", ctx.config.container_name().cyan());

    // 起動コマンドがなければスクリプトを配る前に止める
    if action == Action::Up {
        ctx.config.docker_start()?;
    }

    let logs = utils::log_dirs(&ctx.paths, "container", save_logs)?;
    let fanout = ctx.fanout(hosts).with_logs(logs);

    let dst = push_script(ctx, &fanout, action.script()).await?;

    let all_ok = match action {
        Action::Exec { enumerate: true } => {
            let world = fanout.hosts().len();
            let results = fanout
                .run_enumerated(|rank| enumerated_exec_command(&ctx.config, &dst, rank, world))
                .await;
            let failed: Vec<&Host> = results
                .iter()
                .filter(|(_, ok)| !ok)
                .map(|(host, _)| host)
                .collect();
            for host in &failed {
                println!("  ⚠ {} で失敗しました", host.as_str().yellow());
            }
            failed.is_empty()
        }
        _ => {
            let mut all_ok = true;
            for cmd in remote_commands(&ctx.config, action, &dst, inline)? {
                println!();
                println!("{}", format!("■ {}", cmd.trim()).bold());
                if !fanout.run(ParallelTool::Ssh, &cmd).await {
                    all_ok = false;
                }
            }
            all_ok
        }
    };

    println!();
    if all_ok {
        println!("{}", "✓ 完了しました".green().bold());
    } else {
        println!(
            "{}",
            "⚠ 一部のノードで失敗しました（--save-logs で詳細を確認できます）".yellow()
        );
    }

    Ok(())
}

/// スクリプトを設定値で展開して全ノードのホームへ配布し、配布先のパスを返す
async fn push_script(ctx: &Context, fanout: &FanOut, kind: ScriptKind) -> anyhow::Result<String> {
    let src = ctx.config.script(kind)?;
    let rendered = TemplateProcessor::from_config(&ctx.config)?.render_file(src)?;
    let dst = ctx.config.remote_path(&utils::base_name(src)?);

    let mut staged = tempfile::NamedTempFile::new()?;
    staged.write_all(rendered.as_bytes())?;
    staged.flush()?;

    println!("スクリプト: {} → {}", src.display().to_string().cyan(), dst.cyan());
    if !fanout.scp(staged.path(), &dst).await {
        println!("  ⚠ 配布に失敗したノードがあります");
    }
    Ok(dst)
}

fn inline_flag(inline: bool) -> &'static str {
    if inline { "-i" } else { "" }
}

/// pssh で順に実行するコマンド
pub fn remote_commands(
    config: &FleetConfig,
    action: Action,
    dst: &str,
    inline: bool,
) -> anyhow::Result<Vec<String>> {
    let flag = inline_flag(inline);
    let container = config.container_name();

    let commands = match action {
        Action::Up => vec![
            format!(
                "{} -t 0 {} && sudo chmod +x {}",
                flag,
                config.docker_start()?,
                dst
            ),
            format!("{} -t 0 sudo docker exec {} {}", flag, container, dst),
        ],
        Action::Exec { .. } => vec![format!(
            "{} -t 0 sudo chmod +x {} && sudo docker exec {} {}",
            flag, dst, container, dst
        )],
        Action::Down => vec![format!(
            "{} -t 0 sudo chmod +x {} && {} && sudo docker stop {} && sudo docker rm {}",
            flag, dst, dst, container, container
        )],
    };
    Ok(commands)
}

/// `--enum` 実行時の ssh コマンド（ランクとノード数を末尾に付ける）
pub fn enumerated_exec_command(
    config: &FleetConfig,
    dst: &str,
    rank: usize,
    world: usize,
) -> String {
    format!(
        "sudo chmod +x {} && sudo docker exec {} {} {} {}",
        dst,
        config.container_name(),
        dst,
        rank,
        world
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FleetConfig {
        let mut config = FleetConfig::for_user("alice");
        config.docker_start = Some("sudo docker run -d --name alice_spawn img".to_string());
        config
    }

    #[test]
    fn test_up_commands() {
        let cmds = remote_commands(&config(), Action::Up, "/home/alice/install.sh", true).unwrap();
        assert_eq!(
            cmds,
            vec![
                "-i -t 0 sudo docker run -d --name alice_spawn img && sudo chmod +x /home/alice/install.sh",
                "-i -t 0 sudo docker exec alice_spawn /home/alice/install.sh",
            ]
        );
    }

    #[test]
    fn test_up_requires_docker_start() {
        let config = FleetConfig::for_user("alice");
        assert!(remote_commands(&config, Action::Up, "/home/alice/install.sh", false).is_err());
    }

    #[test]
    fn test_exec_command_without_inline() {
        let cmds = remote_commands(
            &config(),
            Action::Exec { enumerate: false },
            "/home/alice/run.sh",
            false,
        )
        .unwrap();
        assert_eq!(cmds.len(), 1);
        assert_eq!(
            cmds[0].trim(),
            "-t 0 sudo chmod +x /home/alice/run.sh && sudo docker exec alice_spawn /home/alice/run.sh"
        );
    }

    #[test]
    fn test_down_command_removes_container() {
        let cmds = remote_commands(&config(), Action::Down, "/home/alice/clean.sh", false).unwrap();
        assert!(cmds[0].contains("&& /home/alice/clean.sh &&"));
        assert!(cmds[0].ends_with("sudo docker stop alice_spawn && sudo docker rm alice_spawn"));
    }

    #[test]
    fn test_enumerated_exec_command() {
        assert_eq!(
            enumerated_exec_command(&config(), "/home/alice/run.sh", 2, 4),
            "sudo chmod +x /home/alice/run.sh && sudo docker exec alice_spawn /home/alice/run.sh 2 4"
        );
    }
}
