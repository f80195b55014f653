/*============================================================
  Synavera Project: Syn-Syu
  Module: synsyu_watch::version
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Decide whether the published release is newer than the
    running build, honouring the stable and testing channels.

  Security / Safety Notes:
    Pure computation over strings; no I/O performed here.

  Dependencies:
    semver for precedence ordering, serde for the manifest.

  Operational Scope:
    Invoked once per completed fetch by the update checker.

  Revision History:
    2026-10-19 COD  Ported channel-aware comparison to semver.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Textual verdict always computed as a fallback
    - Semantic verdict preferred whenever both sides parse
============================================================*/

use std::cmp::Ordering;
use std::fmt;

use semver::Version;
use serde::Deserialize;

use crate::error::{Result, SynsyuError};

/// Channel values advertised by the remote `latest.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteVersionInfo {
    pub stable: String,
    pub testing: String,
}

impl RemoteVersionInfo {
    /// Decode a manifest body. Unknown fields are ignored.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|err| SynsyuError::Parse(err.to_string()))
    }

    /// Value advertised for the given channel.
    pub fn for_channel(&self, channel: Channel) -> &str {
        match channel {
            Channel::Stable => &self.stable,
            Channel::Testing => &self.testing,
        }
    }
}

/// Release track a running build follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stable,
    Testing,
}

impl Channel {
    /// A hyphen in the running version marks a pre-release build.
    pub fn of(running: &str) -> Self {
        if running.contains('-') {
            Channel::Testing
        } else {
            Channel::Stable
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Stable => write!(f, "stable"),
            Channel::Testing => write!(f, "testing"),
        }
    }
}

/// Outcome of comparing the running build against the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub channel: Channel,
    pub latest_version: String,
    /// Verdict from string matching alone.
    pub textual_update: bool,
    /// Verdict from semver precedence, when both sides parsed.
    pub semantic_update: Option<bool>,
    /// Why the semantic path was skipped.
    pub fallback_reason: Option<String>,
    pub has_update: bool,
}

impl Comparison {
    /// True when both paths produced a verdict and they disagree.
    pub fn diverged(&self) -> bool {
        self.semantic_update
            .is_some_and(|semantic| semantic != self.textual_update)
    }
}

/// Compare `running` against the channel-appropriate remote value.
pub fn compare(running: &str, remote: &RemoteVersionInfo) -> Comparison {
    let channel = Channel::of(running);
    let latest = remote.for_channel(channel);

    let textual_update = match channel {
        // Prefix match tolerates local build suffixes on testing builds.
        Channel::Testing => !running.starts_with(latest),
        Channel::Stable => latest != running,
    };

    let (semantic_update, fallback_reason) = match (parse_version(running), parse_version(latest))
    {
        (Ok(current), Ok(published)) => (
            Some(current.cmp_precedence(&published) == Ordering::Less),
            None,
        ),
        (Err(err), _) | (_, Err(err)) => (None, Some(err.to_string())),
    };

    Comparison {
        channel,
        latest_version: latest.to_string(),
        textual_update,
        semantic_update,
        fallback_reason,
        has_update: semantic_update.unwrap_or(textual_update),
    }
}

/// Parsed release version: a semver triple plus any numeric segments
/// beyond patch (`1.2.3.4`), which semver itself cannot hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
    pub version: Version,
    pub extra: Vec<u64>,
}

impl ReleaseVersion {
    /// Semver precedence extended over the extra segments. Build metadata
    /// never affects ordering.
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        let (left, right) = (&self.version, &other.version);
        left.major
            .cmp(&right.major)
            .then(left.minor.cmp(&right.minor))
            .then(left.patch.cmp(&right.patch))
            .then_with(|| cmp_segments(&self.extra, &other.extra))
            .then_with(|| left.pre.cmp(&right.pre))
    }
}

/// Parse a version string leniently: a leading `v` is dropped, leading
/// zeros are accepted, missing minor/patch components are treated as zero
/// and numeric segments past patch are kept for ordering.
pub fn parse_version(raw: &str) -> Result<ReleaseVersion> {
    let invalid = |reason: String| SynsyuError::VersionParse {
        input: raw.to_string(),
        reason,
    };

    let trimmed = raw.trim();
    let candidate = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let split = candidate.find(['-', '+']).unwrap_or(candidate.len());
    let (core, rest) = candidate.split_at(split);

    let mut segments = Vec::new();
    for part in core.split('.') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(format!("`{part}` is not a numeric segment")));
        }
        let value = part
            .parse::<u64>()
            .map_err(|err| invalid(format!("segment `{part}`: {err}")))?;
        segments.push(value);
    }
    if segments.len() < 3 {
        segments.resize(3, 0);
    }
    let extra = segments.split_off(3);

    let normalized = format!("{}.{}.{}{rest}", segments[0], segments[1], segments[2]);
    let version = Version::parse(&normalized).map_err(|err| invalid(err.to_string()))?;
    Ok(ReleaseVersion { version, extra })
}

fn cmp_segments(left: &[u64], right: &[u64]) -> Ordering {
    let len = left.len().max(right.len());
    (0..len)
        .map(|idx| {
            let l = left.get(idx).copied().unwrap_or(0);
            let r = right.get(idx).copied().unwrap_or(0);
            l.cmp(&r)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(stable: &str, testing: &str) -> RemoteVersionInfo {
        RemoteVersionInfo {
            stable: stable.into(),
            testing: testing.into(),
        }
    }

    #[test]
    fn stable_build_sees_newer_stable_release() {
        let cmp = compare("9.5.1", &remote("9.5.2", "9.5.3-beta"));
        assert!(cmp.has_update);
        assert_eq!(cmp.latest_version, "9.5.2");
        assert_eq!(cmp.channel, Channel::Stable);
    }

    #[test]
    fn testing_build_matching_testing_release_is_current() {
        let cmp = compare("9.5.2-beta.1", &remote("9.5.2", "9.5.2-beta.1"));
        assert!(!cmp.has_update);
        assert_eq!(cmp.latest_version, "9.5.2-beta.1");
        assert_eq!(cmp.channel, Channel::Testing);
    }

    #[test]
    fn equal_stable_versions_mean_no_update() {
        for version in ["1.0.0", "2.3.4", "10.0.1"] {
            let cmp = compare(version, &remote(version, "99.0.0-beta"));
            assert!(!cmp.has_update, "{version} should be current");
        }
    }

    #[test]
    fn testing_build_never_consults_stable() {
        let cmp = compare("1.0.0-beta.2", &remote("5.0.0", "1.0.0-beta.1"));
        assert_eq!(cmp.latest_version, "1.0.0-beta.1");
        assert!(!cmp.has_update);
    }

    #[test]
    fn running_ahead_of_stable_is_not_an_update() {
        let cmp = compare("2.0.0", &remote("1.9.9", ""));
        assert!(cmp.textual_update);
        assert_eq!(cmp.semantic_update, Some(false));
        assert!(!cmp.has_update);
        assert!(cmp.diverged());
    }

    #[test]
    fn build_metadata_is_ignored_by_precedence() {
        let cmp = compare("1.2.0", &remote("1.2.0+build5", ""));
        assert!(cmp.textual_update);
        assert_eq!(cmp.semantic_update, Some(false));
        assert!(!cmp.has_update);
    }

    #[test]
    fn unparseable_versions_fall_back_to_string_equality() {
        let cmp = compare("custom", &remote("custom-2", ""));
        assert_eq!(cmp.semantic_update, None);
        assert!(cmp.fallback_reason.is_some());
        assert!(cmp.has_update);

        let same = compare("custom", &remote("custom", ""));
        assert!(!same.has_update);
    }

    #[test]
    fn unparseable_testing_build_uses_prefix_match() {
        let cmp = compare("custom-build", &remote("", "custom"));
        assert_eq!(cmp.channel, Channel::Testing);
        assert_eq!(cmp.semantic_update, None);
        assert!(!cmp.has_update);

        let stale = compare("custom-build", &remote("", "custom-build-2"));
        assert!(stale.has_update);
    }

    #[test]
    fn testing_prefix_tolerates_local_suffix() {
        let cmp = compare("3.1.0-rc.1.local", &remote("3.0.0", "3.1.0-rc.1"));
        assert!(!cmp.textual_update);
        // Semver orders the longer pre-release after the shorter one.
        assert_eq!(cmp.semantic_update, Some(false));
        assert!(!cmp.has_update);
    }

    #[test]
    fn newer_prerelease_is_detected() {
        let cmp = compare("3.1.0-rc.1", &remote("3.0.0", "3.1.0-rc.2"));
        assert!(cmp.has_update);
        assert!(!cmp.diverged());
    }

    #[test]
    fn empty_remote_stable_falls_back_to_inequality() {
        let cmp = compare("1.0.0", &RemoteVersionInfo::default());
        assert_eq!(cmp.latest_version, "");
        assert_eq!(cmp.semantic_update, None);
        assert!(cmp.has_update);
    }

    #[test]
    fn lenient_parse_accepts_prefix_and_short_forms() {
        assert_eq!(parse_version("v1.2.3").unwrap().version, Version::new(1, 2, 3));
        assert_eq!(parse_version("1.2").unwrap().version, Version::new(1, 2, 0));
        assert_eq!(parse_version("7").unwrap().version, Version::new(7, 0, 0));
        assert_eq!(parse_version("01.02.003").unwrap().version, Version::new(1, 2, 3));
        let pre = parse_version("1.2-beta.1").unwrap();
        assert_eq!(pre.version.pre.as_str(), "beta.1");
        assert!(pre.extra.is_empty());
        assert!(parse_version("").is_err());
        assert!(parse_version("1..2").is_err());
        assert!(matches!(
            parse_version("custom-build"),
            Err(SynsyuError::VersionParse { .. })
        ));
    }

    #[test]
    fn four_part_versions_compare_semantically() {
        let parsed = parse_version("1.2.3.4").unwrap();
        assert_eq!(parsed.version, Version::new(1, 2, 3));
        assert_eq!(parsed.extra, vec![4]);

        let ahead = compare("1.2.3.5", &remote("1.2.3.4", ""));
        assert_eq!(ahead.semantic_update, Some(false));
        assert!(!ahead.has_update);

        let behind = compare("1.2.3.4", &remote("1.2.3.5", ""));
        assert!(behind.has_update);

        // Trailing zero segments do not make a version newer.
        let padded = compare("1.2.3", &remote("1.2.3.0", ""));
        assert_eq!(padded.semantic_update, Some(false));
    }

    #[test]
    fn manifest_ignores_unknown_and_missing_fields() {
        let info = RemoteVersionInfo::from_slice(br#"{"stable":"1.0.0","channel":"x"}"#).unwrap();
        assert_eq!(info.stable, "1.0.0");
        assert_eq!(info.testing, "");
    }

    #[test]
    fn malformed_manifest_is_a_parse_error() {
        let err = RemoteVersionInfo::from_slice(b"not json").unwrap_err();
        assert!(matches!(err, SynsyuError::Parse(_)));
    }
}
