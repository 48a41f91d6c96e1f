//! テンプレート展開機能
//!
//! Teraを使用して `template.yaml` とホストへ配布するスクリプトを展開します。

use crate::error::{FleetError, Result};
use crate::model::FleetConfig;
use std::path::Path;
use tera::{Context, Tera};
use tracing::debug;

/// テンプレートプロセッサ
pub struct TemplateProcessor {
    tera: Tera,
    context: Context,
}

impl TemplateProcessor {
    /// 新しいテンプレートプロセッサを作成
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
            context: Context::new(),
        }
    }

    /// YAMLマッピングのトップレベルキーを変数として追加
    pub fn from_yaml(document: &serde_yaml::Value) -> Self {
        let mut processor = Self::new();
        if let serde_json::Value::Object(map) = yaml_to_json(document) {
            for (key, value) in map {
                processor.add_variable(key, value);
            }
        }
        processor
    }

    /// マージ済み設定の全キーを変数として追加
    pub fn from_config(config: &FleetConfig) -> Result<Self> {
        let document = serde_yaml::to_value(config)
            .map_err(|e| FleetError::InvalidConfig(e.to_string()))?;
        Ok(Self::from_yaml(&document))
    }

    /// 変数を追加
    pub fn add_variable(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.context.insert(key.into(), &value);
    }

    /// 文字列をテンプレートとして展開
    pub fn render_str(&mut self, template: &str) -> Result<String> {
        self.tera
            .render_str(template, &self.context)
            .map_err(|e| FleetError::TemplateRenderError(extract_tera_error_detail(&e)))
    }

    /// ファイルを読み込んでテンプレート展開
    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    pub fn render_file(&mut self, path: &Path) -> Result<String> {
        let content = std::fs::read_to_string(path).map_err(|e| FleetError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(bytes = content.len(), "Rendering template file");

        self.render_str(&content).map_err(|e| match e {
            FleetError::TemplateRenderError(message) => FleetError::TemplateError {
                file: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }
}

impl Default for TemplateProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// YAML値をテンプレートコンテキスト用のJSON値に変換
///
/// JSONのキーは文字列のみなので、数値や真偽値のキーは文字列化する。
pub fn yaml_to_json(value: &serde_yaml::Value) -> serde_json::Value {
    use serde_yaml::Value as Y;
    match value {
        Y::Null => serde_json::Value::Null,
        Y::Bool(b) => serde_json::Value::Bool(*b),
        Y::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_json::Value::from(i)
            } else if let Some(u) = n.as_u64() {
                serde_json::Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
        }
        Y::String(s) => serde_json::Value::String(s.clone()),
        Y::Sequence(seq) => serde_json::Value::Array(seq.iter().map(yaml_to_json).collect()),
        Y::Mapping(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (yaml_key_to_string(k), yaml_to_json(v)))
                .collect(),
        ),
        Y::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

fn yaml_key_to_string(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Teraのエラーチェーンから原因を連結したメッセージを作る
fn extract_tera_error_detail(error: &tera::Error) -> String {
    let mut detail = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        detail.push_str(&format!("\n  原因: {}", cause));
        source = std::error::Error::source(cause);
    }
    detail
}
