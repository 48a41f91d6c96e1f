//! テスト用の偽 pssh ツール

use crate::tool::Toolchain;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

/// 一時ディレクトリに置いたシェルスクリプトで外部ツールを置き換える
///
/// 各スクリプトは `-h <hostfile>` を受け取るとホスト一覧を `<name>.hosts` に、
/// 残りの引数を `<name>.args` に記録してから本体を実行する。
pub struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn toolchain(&self) -> Toolchain {
        Toolchain::in_dir(self.dir.path())
    }

    pub fn install(&self, name: &str, body: &str) {
        let script = format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"-h\" ]; then cp \"$2\" \"$0.hosts\"; shift 2; fi\n\
             echo \"$@\" >> \"$0.args\"\n\
             {}\n",
            body
        );
        let path = self.dir.path().join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}

/// 記録された引数（呼び出しごとに1行）
pub fn recorded_args(tools: &FakeTools, name: &str) -> String {
    std::fs::read_to_string(tools.dir().join(format!("{}.args", name)))
        .unwrap_or_default()
        .trim_end()
        .to_string()
}

pub fn recorded_hosts(tools: &FakeTools, name: &str) -> String {
    std::fs::read_to_string(tools.dir().join(format!("{}.hosts", name))).unwrap_or_default()
}
