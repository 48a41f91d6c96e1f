pub mod agg;
pub mod container;
pub mod hosts;
pub mod sync;

use spawnfleet_config::ProjectPaths;
use spawnfleet_core::{FleetConfig, Host};
use spawnfleet_fanout::{FanOut, Toolchain};
use std::time::Duration;

/// 各コマンドが共有する実行コンテキスト
pub struct Context {
    pub paths: ProjectPaths,
    pub config: FleetConfig,
    pub toolchain: Toolchain,
}

impl Context {
    /// 設定済みのツールと猶予時間でファンアウトを作る
    pub fn fanout(&self, hosts: Vec<Host>) -> FanOut {
        FanOut::new(hosts)
            .with_toolchain(self.toolchain.clone())
            .with_grace(Duration::from_secs(self.config.launch_grace_secs))
    }
}
