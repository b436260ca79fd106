/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::{fmt, time::Duration};

use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DavConfig {
    pub encoding: Charset,
    #[serde(deserialize_with = "deserialize_seconds")]
    pub request_timeout: Duration,
}

/// Output charset of multistatus documents.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Charset(pub &'static Encoding);

#[derive(Debug, thiserror::Error)]
#[error("Invalid DAV configuration: {0}")]
pub struct ConfigError(#[from] toml::de::Error);

impl Default for DavConfig {
    fn default() -> Self {
        DavConfig {
            encoding: Charset::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl DavConfig {
    pub fn parse(config: &str) -> Result<Self, ConfigError> {
        toml::from_str(config).map_err(ConfigError)
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = Charset(encoding);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Charset {
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.0
    }

    /// Whether text survives the output encoding unchanged.
    pub fn is_utf8(&self) -> bool {
        self.0.output_encoding() == UTF_8
    }
}

impl Default for Charset {
    fn default() -> Self {
        Charset(UTF_8)
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Charset").field(&self.0.name()).finish()
    }
}

impl<'de> Deserialize<'de> for Charset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Encoding::for_label(label.trim().as_bytes())
            .map(Charset)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown encoding {label:?}")))
    }
}

fn deserialize_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}
