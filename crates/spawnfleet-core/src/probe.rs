//! ホストの空き状況判定
//!
//! 各ホストで実行した `nvidia-smi` と `df -h` の出力（ホストごとのログ）を
//! パースし、GPUとディスクの両方が空いているホストだけを選ぶ。

use crate::error::{FleetError, Result};
use crate::model::Host;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// GPUのメモリ使用率がこの値未満なら空きとみなす
pub const GPU_IDLE_THRESHOLD: f64 = 0.02;

/// 各ホストで実行するGPUメモリ照会コマンド
pub const GPU_QUERY: &str =
    "nvidia-smi --query-gpu=memory.total,memory.used --format=csv | tail -n+2";

/// 各ホストで実行する空きディスク照会コマンド
pub fn disk_query(drive: &str) -> String {
    format!(
        "df -h | grep {} | head -1 | cut -d' ' -f2- | sed 's/^[[:space:]]*//g'",
        drive
    )
}

/// 1枚のGPUのメモリ状況 (MiB)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpuMemory {
    pub total: f64,
    pub used: f64,
}

impl GpuMemory {
    pub fn utilization(&self) -> f64 {
        self.used / self.total
    }
}

/// 1ホスト分の出力のパース失敗
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("不正な出力: {0}")]
    Malformed(String),

    /// G/T 以外の単位。設定誤りとして致命的に扱う
    #[error("不明なディスク容量の単位: '{0}'")]
    UnknownUnit(String),
}

/// ホストごとの判定結果
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeStatus {
    /// GPU・ディスクとも条件を満たす
    Available,
    /// 出力は読めたが条件を満たさない
    Busy { gpu_idle: bool, disk_free_gb: f64 },
    /// 出力が空または存在しない（照会失敗・到達不能）
    Unreachable,
    /// 出力をパースできない
    Unparsable(String),
}

impl ProbeStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, ProbeStatus::Available)
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Available => write!(f, "available"),
            ProbeStatus::Busy {
                gpu_idle,
                disk_free_gb,
            } => write!(f, "busy (gpu idle: {}, disk free: {}G)", gpu_idle, disk_free_gb),
            ProbeStatus::Unreachable => write!(f, "unreachable"),
            ProbeStatus::Unparsable(reason) => write!(f, "unparsable ({})", reason),
        }
    }
}

/// `nvidia-smi` のCSV行（`"40960 MiB, 3 MiB"`）をパース
pub fn parse_gpu_rows(output: &str) -> std::result::Result<Vec<GpuMemory>, ProbeError> {
    let mut gpus = Vec::new();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let fields: Vec<&str> = line.split(',').collect();
        let [total, used] = fields.as_slice() else {
            return Err(ProbeError::Malformed(format!("GPU行の列数が不正: '{}'", line)));
        };
        let total = parse_leading_number(total)?;
        let used = parse_leading_number(used)?;
        if total <= 0.0 {
            return Err(ProbeError::Malformed(format!("GPUメモリ総量が0: '{}'", line)));
        }
        gpus.push(GpuMemory { total, used });
    }

    if gpus.is_empty() {
        return Err(ProbeError::Malformed("GPU行がありません".to_string()));
    }
    Ok(gpus)
}

fn parse_leading_number(field: &str) -> std::result::Result<f64, ProbeError> {
    let token = field
        .split_whitespace()
        .next()
        .ok_or_else(|| ProbeError::Malformed("空のフィールド".to_string()))?;
    parse_quantity(token, token)
}

/// 有限かつ非負の数値だけを受け付ける（`nan` や `inf` も f64 としては読めてしまう）
fn parse_quantity(number: &str, field: &str) -> std::result::Result<f64, ProbeError> {
    match number.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(ProbeError::Malformed(format!("数値ではありません: '{}'", field))),
    }
}

/// 全GPUの使用率の最大値が閾値未満ならtrue（1枚でも使用中ならfalse）
pub fn gpu_idle(gpus: &[GpuMemory]) -> bool {
    gpus.iter()
        .map(GpuMemory::utilization)
        .fold(0.0_f64, f64::max)
        < GPU_IDLE_THRESHOLD
}

/// `df -h` の1行（size used avail use% mount）から空き容量をGB単位で取得
///
/// `G` はそのまま、`T` は1000倍。それ以外の単位は `UnknownUnit`。
pub fn parse_disk_free(output: &str) -> std::result::Result<f64, ProbeError> {
    let line = output.lines().next().unwrap_or_default();
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [_, _, free, _, _] = fields.as_slice() else {
        return Err(ProbeError::Malformed(format!("df行の列数が不正: '{}'", line)));
    };

    let (number, scale) = if let Some(n) = free.strip_suffix('G') {
        (n, 1.0)
    } else if let Some(n) = free.strip_suffix('T') {
        (n, 1e3)
    } else {
        return Err(ProbeError::UnknownUnit(free.to_string()));
    };

    parse_quantity(number, free).map(|v| v * scale)
}

/// 1ホスト分の出力から判定結果を求める
///
/// 不明なディスク単位だけは `FleetError::UnknownDiskUnit` として呼び出し元へ返す。
pub fn classify_host(
    host: &Host,
    gpu_output: &str,
    disk_output: &str,
    min_disk: f64,
) -> Result<ProbeStatus> {
    if gpu_output.trim().is_empty() || disk_output.trim().is_empty() {
        debug!(host = %host, "Empty probe output");
        return Ok(ProbeStatus::Unreachable);
    }

    let gpus = match parse_gpu_rows(gpu_output) {
        Ok(gpus) => gpus,
        Err(e) => return Ok(unparsable(host, e)),
    };
    let disk_free_gb = match parse_disk_free(disk_output) {
        Ok(free) => free,
        Err(ProbeError::UnknownUnit(value)) => {
            return Err(FleetError::UnknownDiskUnit {
                host: host.to_string(),
                value,
            });
        }
        Err(e) => return Ok(unparsable(host, e)),
    };

    let idle = gpu_idle(&gpus);
    if idle && disk_free_gb > min_disk {
        Ok(ProbeStatus::Available)
    } else {
        Ok(ProbeStatus::Busy {
            gpu_idle: idle,
            disk_free_gb,
        })
    }
}

fn unparsable(host: &Host, error: ProbeError) -> ProbeStatus {
    warn!(host = %host, error = %error, "Could not parse probe output");
    ProbeStatus::Unparsable(error.to_string())
}

/// 判定結果から要求台数のホストを選ぶ
///
/// 利用可能なホストが要求台数に満たない場合は `InsufficientHosts`。
/// 選択順はグループ内の順序に従う。
pub fn select_hosts(results: &[(Host, ProbeStatus)], requested: usize) -> Result<Vec<Host>> {
    let available: Vec<Host> = results
        .iter()
        .filter(|(_, status)| status.is_available())
        .map(|(host, _)| host.clone())
        .collect();

    if available.len() < requested {
        return Err(FleetError::InsufficientHosts {
            available: available.len(),
            requested,
        });
    }

    Ok(available.into_iter().take(requested).collect())
}
