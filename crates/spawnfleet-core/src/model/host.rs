//! ホスト定義

use serde::{Deserialize, Serialize};
use std::fmt;

/// フリート内の1ノード（ネットワークアドレス）
///
/// ホストごとのログファイル名としても使われる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Host(String);

impl Host {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Host {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for Host {
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl AsRef<str> for Host {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_display() {
        let host = Host::new("172.25.48.151");
        assert_eq!(host.to_string(), "172.25.48.151");
        assert_eq!(host.as_str(), "172.25.48.151");
    }
}
