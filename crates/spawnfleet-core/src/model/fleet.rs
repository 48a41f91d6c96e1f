//! フリート（サブネット・GPU種別・除外ホスト）定義

use super::Host;
use crate::error::{FleetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// 第4オクテットの閉区間（YAMLでは `[開始, 終了]`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 2]", into = "[u8; 2]")]
pub struct OctetRange {
    pub start: u8,
    pub end: u8,
}

impl OctetRange {
    pub const fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }
}

impl From<[u8; 2]> for OctetRange {
    fn from([start, end]: [u8; 2]) -> Self {
        Self { start, end }
    }
}

impl From<OctetRange> for [u8; 2] {
    fn from(range: OctetRange) -> Self {
        [range.start, range.end]
    }
}

/// フリート全体の定義（`fleet` キー）
///
/// GPU種別（10, 40, 80 など）ごとにアドレス範囲を持ち、`exclude` に
/// 含まれるオクテットは全グループから除かれる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetSpec {
    pub subnet: String,
    pub exclude: Vec<u8>,
    pub tiers: BTreeMap<u32, Vec<OctetRange>>,
}

impl Default for FleetSpec {
    fn default() -> Self {
        let mut tiers = BTreeMap::new();
        tiers.insert(
            10,
            vec![OctetRange::new(81, 89), OctetRange::new(111, 119)],
        );
        tiers.insert(40, vec![OctetRange::new(151, 166)]);
        tiers.insert(80, vec![OctetRange::new(122, 136)]);

        Self {
            subnet: "172.25.48.".to_string(),
            exclude: vec![154, 126, 82, 83, 84],
            tiers,
        }
    }
}

impl FleetSpec {
    /// GPU種別に対応するホストグループを計算
    pub fn group(&self, tier: u32) -> Result<HostGroup> {
        let ranges = self
            .tiers
            .get(&tier)
            .ok_or_else(|| FleetError::UnknownGpuTier {
                tier,
                available: self
                    .tiers
                    .keys()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
        Ok(HostGroup::from_ranges(&self.subnet, ranges, &self.exclude))
    }
}

/// ホストグループ: `(アドレス範囲) − (除外セット)`
///
/// 範囲の昇順を保ち、重複は取り除く。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostGroup {
    hosts: Vec<Host>,
}

impl HostGroup {
    pub fn from_ranges(subnet: &str, ranges: &[OctetRange], exclude: &[u8]) -> Self {
        let excluded: HashSet<u8> = exclude.iter().copied().collect();
        let mut seen = HashSet::new();
        let mut hosts = Vec::new();

        for range in ranges {
            for octet in range.start..=range.end {
                if excluded.contains(&octet) || !seen.insert(octet) {
                    continue;
                }
                hosts.push(Host::new(format!("{}{}", subnet, octet)));
            }
        }

        Self { hosts }
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn contains(&self, host: &Host) -> bool {
        self.hosts.contains(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_40_excludes_bad_hosts() {
        let spec = FleetSpec::default();
        let group = spec.group(40).unwrap();

        let expected: Vec<Host> = (151..=153)
            .chain(155..=166)
            .map(|o| Host::new(format!("172.25.48.{}", o)))
            .collect();
        assert_eq!(group.hosts(), expected.as_slice());
        assert!(!group.contains(&Host::new("172.25.48.154")));
    }

    #[test]
    fn test_tier_10_spans_two_ranges() {
        let group = FleetSpec::default().group(10).unwrap();

        // 81..=89 から 82,83,84 を除いた6台 + 111..=119 の9台
        assert_eq!(group.len(), 15);
        assert_eq!(group.hosts()[0].as_str(), "172.25.48.81");
        assert_eq!(group.hosts()[1].as_str(), "172.25.48.85");
        assert_eq!(group.hosts().last().unwrap().as_str(), "172.25.48.119");
    }

    #[test]
    fn test_tier_80_excludes_126() {
        let group = FleetSpec::default().group(80).unwrap();
        assert_eq!(group.len(), 14);
        assert!(!group.contains(&Host::new("172.25.48.126")));
    }

    #[test]
    fn test_unknown_tier() {
        let err = FleetSpec::default().group(20).unwrap_err();
        match err {
            FleetError::UnknownGpuTier { tier, available } => {
                assert_eq!(tier, 20);
                assert_eq!(available, "10, 40, 80");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_overlapping_ranges_deduplicated() {
        let group = HostGroup::from_ranges(
            "10.0.0.",
            &[OctetRange::new(1, 3), OctetRange::new(2, 4)],
            &[],
        );
        let hosts: Vec<&str> = group.hosts().iter().map(Host::as_str).collect();
        assert_eq!(hosts, ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4"]);
    }

    #[test]
    fn test_fleet_spec_from_yaml() {
        let yaml = r#"
subnet: "10.1.0."
exclude: [3]
tiers:
  24: [[1, 4]]
"#;
        let spec: FleetSpec = serde_yaml::from_str(yaml).unwrap();
        let group = spec.group(24).unwrap();
        let hosts: Vec<&str> = group.hosts().iter().map(Host::as_str).collect();
        assert_eq!(hosts, ["10.1.0.1", "10.1.0.2", "10.1.0.4"]);
    }
}
