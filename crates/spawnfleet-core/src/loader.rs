//! 設定ローダー
//!
//! `config.yaml` を読み込み、その値で `template.yaml` を展開してから
//! トップレベルキー単位でマージする（テンプレート側が優先）。

use crate::error::{FleetError, Result};
use crate::model::FleetConfig;
use crate::template::TemplateProcessor;
use spawnfleet_config::ProjectPaths;
use std::path::Path;
use tracing::{debug, info, instrument};

/// プロジェクトルートから設定をロード
#[instrument(skip(paths), fields(root = %paths.root().display()))]
pub fn load_config(paths: &ProjectPaths) -> Result<FleetConfig> {
    // 1. ベース設定
    debug!("Step 1: Reading base config");
    let base_path = paths.config_file();
    let base_content = read_file(&base_path)?;
    let base = parse_yaml(&base_path, &base_content)?;

    // 2. template.yaml をベース設定で展開してマージ
    let template_path = paths.template_file();
    let merged = if template_path.exists() {
        debug!("Step 2: Rendering template.yaml against base config");
        let mut processor = TemplateProcessor::from_yaml(&base);
        let rendered = processor.render_file(&template_path)?;
        let overlay = parse_yaml(&template_path, &rendered)?;
        merge_top_level(base, overlay)
    } else {
        debug!("No template.yaml, using base config only");
        base
    };

    // 3. 型付き設定へ変換
    let mut config: FleetConfig =
        serde_yaml::from_value(merged).map_err(|e| FleetError::YamlParse {
            file: base_path.clone(),
            message: e.to_string(),
        })?;
    config.resolve_paths(paths);

    info!(
        user = %config.user,
        gpus = config.gpus,
        num_nodes = config.num_nodes,
        "Config loaded successfully"
    );
    Ok(config)
}

/// 2つのYAMLマッピングをトップレベルキー単位でマージ
///
/// `overlay` が空ドキュメント（null）の場合は `base` をそのまま返す。
pub fn merge_top_level(base: serde_yaml::Value, overlay: serde_yaml::Value) -> serde_yaml::Value {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(mut base), serde_yaml::Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                base.insert(key, value);
            }
            serde_yaml::Value::Mapping(base)
        }
        (base, serde_yaml::Value::Null) => base,
        (_, overlay) => overlay,
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| FleetError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn parse_yaml(path: &Path, content: &str) -> Result<serde_yaml::Value> {
    serde_yaml::from_str(content).map_err(|e| FleetError::YamlParse {
        file: path.to_path_buf(),
        message: e.to_string(),
    })
}
