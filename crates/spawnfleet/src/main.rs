mod commands;
mod utils;

use clap::{Args, Parser, Subcommand, ValueEnum};
use spawnfleet_core::SyncFolder;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sfleet")]
#[command(about = "GPUクラスタの空きノードを確保し、サンドボックスを一斉に動かす", long_about = None)]
struct Cli {
    /// parallel-ssh などの外部ツールを置いたディレクトリ（省略時は PATH から探す）
    #[arg(long, global = true, env = "SPAWNFLEET_TOOL_DIR")]
    tool_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 空いているノードを探して hosts.txt に保存
    Hosts {
        /// 確保するノード数（設定の num_nodes を上書き）
        #[arg(long, alias = "num_nodes")]
        num_nodes: Option<usize>,
        /// 必要な空きディスク容量 GB（設定の min_disk を上書き）
        #[arg(long, alias = "min_disk")]
        min_disk: Option<f64>,
        /// GPUグループ (10, 40, 80)（設定の gpus を上書き）
        #[arg(long, alias = "gpu_type")]
        gpu_type: Option<u32>,
        /// 探索時のログを残す
        #[arg(long, alias = "save_logs")]
        save_logs: bool,
    },
    /// サンドボックスコンテナを起動し、インストールスクリプトを実行
    Up {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// 実行スクリプトをコンテナ内で実行
    Exec {
        #[command(flatten)]
        output: OutputArgs,
        /// ノードごとに順番に実行し、ランクとノード数を引数で渡す
        #[arg(long = "enum")]
        enumerate: bool,
    },
    /// 後片付けスクリプトを実行し、コンテナを削除
    Down {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// プロジェクトまたはデータを全ノードへ同期
    Sync {
        /// 同期するフォルダ
        #[arg(value_enum)]
        folder: FolderArg,
        /// 同期前にリモートの同期先を削除する
        #[arg(long)]
        cleanup: bool,
        /// rsync のログを残す
        #[arg(long, alias = "save_logs")]
        save_logs: bool,
    },
    /// 全ノードの完了マーカーを集約して再配布
    Agg,
    /// バージョン情報を表示
    Version,
}

#[derive(Args, Clone, Copy)]
struct OutputArgs {
    /// 各ノードの出力をその場で表示する (pssh -i)
    #[arg(long)]
    inline: bool,
    /// ノードごとの出力を container/ に保存する
    #[arg(long, alias = "save_logs")]
    save_logs: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FolderArg {
    Project,
    Data,
}

impl From<FolderArg> for SyncFolder {
    fn from(arg: FolderArg) -> Self {
        match arg {
            FolderArg::Project => SyncFolder::Project,
            FolderArg::Data => SyncFolder::Data,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 標準出力はコマンドの結果表示に使うので、ログはstderrへ
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("spawnfleet {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let paths = spawnfleet_config::ProjectPaths::discover()?;
    let config = spawnfleet_core::load_config(&paths)?;
    let toolchain = utils::toolchain(cli.tool_dir.as_deref());
    let ctx = commands::Context {
        paths,
        config,
        toolchain,
    };

    match cli.command {
        Commands::Hosts {
            num_nodes,
            min_disk,
            gpu_type,
            save_logs,
        } => {
            let request = commands::hosts::HostRequest {
                num_nodes: num_nodes.unwrap_or(ctx.config.num_nodes),
                min_disk: min_disk.unwrap_or(ctx.config.min_disk),
                tier: gpu_type.unwrap_or(ctx.config.gpus),
            };
            commands::hosts::handle(&ctx, request, save_logs).await?;
        }
        Commands::Up { output } => {
            let hosts = utils::load_hosts(&ctx.paths)?;
            commands::container::handle(
                &ctx,
                hosts,
                commands::container::Action::Up,
                output.inline,
                output.save_logs,
            )
            .await?;
        }
        Commands::Exec { output, enumerate } => {
            let hosts = utils::load_hosts(&ctx.paths)?;
            commands::container::handle(
                &ctx,
                hosts,
                commands::container::Action::Exec { enumerate },
                output.inline,
                output.save_logs,
            )
            .await?;
        }
        Commands::Down { output } => {
            let hosts = utils::load_hosts(&ctx.paths)?;
            commands::container::handle(
                &ctx,
                hosts,
                commands::container::Action::Down,
                output.inline,
                output.save_logs,
            )
            .await?;
        }
        Commands::Sync {
            folder,
            cleanup,
            save_logs,
        } => {
            let hosts = utils::load_hosts(&ctx.paths)?;
            commands::sync::handle(&ctx, hosts, folder.into(), cleanup, save_logs).await?;
        }
        Commands::Agg => {
            let hosts = utils::load_hosts(&ctx.paths)?;
            commands::agg::handle(&ctx, hosts).await?;
        }
        // 設定の読み込み前に処理済み
        Commands::Version => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_logs_accepts_underscore_alias() {
        let cli =
            Cli::try_parse_from(["sfleet", "hosts", "--num_nodes", "4", "--save_logs"]).unwrap();
        match cli.command {
            Commands::Hosts {
                num_nodes,
                save_logs,
                ..
            } => {
                assert_eq!(num_nodes, Some(4));
                assert!(save_logs);
            }
            _ => panic!("expected hosts"),
        }
    }

    #[test]
    fn test_exec_enum_flag() {
        let cli = Cli::try_parse_from(["sfleet", "exec", "--enum", "--inline"]).unwrap();
        match cli.command {
            Commands::Exec { output, enumerate } => {
                assert!(enumerate);
                assert!(output.inline);
                assert!(!output.save_logs);
            }
            _ => panic!("expected exec"),
        }
    }

    #[test]
    fn test_sync_requires_known_folder() {
        assert!(Cli::try_parse_from(["sfleet", "sync", "models"]).is_err());
        assert!(Cli::try_parse_from(["sfleet", "sync"]).is_err());

        let cli = Cli::try_parse_from(["sfleet", "sync", "data", "--cleanup"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sync {
                folder: FolderArg::Data,
                cleanup: true,
                save_logs: false
            }
        ));
    }

    #[test]
    fn test_tool_dir_from_env() {
        let cli = temp_env::with_var("SPAWNFLEET_TOOL_DIR", Some("/opt/pssh/bin"), || {
            Cli::try_parse_from(["sfleet", "agg"]).unwrap()
        });
        assert_eq!(cli.tool_dir, Some(PathBuf::from("/opt/pssh/bin")));
    }
}
