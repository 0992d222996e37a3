use crate::config::IdentityConfig;
use anyhow::{Context, Result};
use regex::Regex;
use tracing::trace;

/// One labeled URL-pattern matcher; the capture group holds the item id.
#[derive(Debug, Clone)]
struct IdPattern {
    label: String,
    regex: Regex,
}

/// Derives a stable identifier from an item URL: the first matching pattern
/// wins, otherwise a deterministic rolling hash of the whole URL. Pure --
/// the same URL always resolves to the same id.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    patterns: Vec<IdPattern>,
}

/// Query parameters and path shapes seen across the monitored portals.
/// Per-source patterns from the config are tried before these.
const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    ("pblancId", r"pblancId=([A-Za-z0-9_-]+)"),
    ("pbancSn", r"pbancSn=(\d+)"),
    ("bbsSn", r"bbsSn=(\d+)"),
    ("seq", r"[?&]seq=(\d+)"),
    ("idx", r"[?&]idx=(\d+)"),
    ("no", r"[?&](?:no|num)=(\d+)"),
    ("path_segment", r"/(\d{4,})/?(?:[?#].*)?$"),
];

impl IdentityResolver {
    pub fn with_defaults() -> Self {
        let patterns = DEFAULT_PATTERNS
            .iter()
            .map(|(label, pattern)| IdPattern {
                label: (*label).to_string(),
                regex: Regex::new(pattern).expect("default identity pattern must compile"),
            })
            .collect();
        Self { patterns }
    }

    pub fn for_source(identity: &IdentityConfig) -> Result<Self> {
        let mut patterns = Vec::with_capacity(identity.patterns.len() + DEFAULT_PATTERNS.len());
        for (index, pattern) in identity.patterns.iter().enumerate() {
            patterns.push(IdPattern {
                label: format!("source_pattern_{index}"),
                regex: Regex::new(pattern)
                    .with_context(|| format!("invalid identity pattern {pattern}"))?,
            });
        }
        patterns.extend(Self::with_defaults().patterns);
        Ok(Self { patterns })
    }

    pub fn resolve(&self, url: &str) -> String {
        for pattern in &self.patterns {
            if let Some(caps) = pattern.regex.captures(url)
                && let Some(id) = caps.get(1)
                && !id.as_str().is_empty()
            {
                trace!(label = %pattern.label, id = id.as_str(), "id pattern matched");
                return id.as_str().to_string();
            }
        }

        // Unanticipated URL shape: every item still gets a stable id.
        let hashed = base36(fnv1a64(url.as_bytes()));
        trace!(%url, id = %hashed, "no id pattern matched; using url hash");
        hashed
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn base36(mut value: u64) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 output is ascii")
}
