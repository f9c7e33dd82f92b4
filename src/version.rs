//! Version Comparison
//!
//! Semantic-version precedence for update decisions. Remote endpoints are
//! not always strict about semver ("1.2", "1.2.3.4", "2.0-beta"), so
//! comparison is lenient: short versions are padded with zeroes and handed
//! to the `semver` crate, while longer dotted forms fall back to numeric
//! segment-by-segment comparison with the same pre-release rules.

use semver::{Prerelease, Version};
use std::cmp::Ordering;

/// Parse a possibly-short version string into a full semver version.
///
/// "1" becomes "1.0.0", "1.2" becomes "1.2.0", "1.2-beta.1" becomes
/// "1.2.0-beta.1". Returns `None` for anything semver still rejects,
/// including versions with more than three segments (see [`compare`]).
pub fn parse_lenient(input: &str) -> Option<Version> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(version) = Version::parse(input) {
        return Some(version);
    }

    // Split off pre-release/build suffix before counting dots
    let split_at = input.find(['-', '+']).unwrap_or(input.len());
    let (core, suffix) = input.split_at(split_at);

    let dots = core.matches('.').count();
    let padded = match dots {
        0 => format!("{}.0.0{}", core, suffix),
        1 => format!("{}.0{}", core, suffix),
        _ => return None,
    };

    Version::parse(&padded).ok()
}

/// Parse an arbitrarily long dotted version into numeric segments plus an
/// optional pre-release tag. All segments must be numeric.
fn parse_extended(input: &str) -> Option<(Vec<u64>, Prerelease)> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let split_at = input.find(['-', '+']).unwrap_or(input.len());
    let (core, suffix) = input.split_at(split_at);

    let pre = match suffix.strip_prefix('-') {
        Some(rest) => {
            let rest = rest.split('+').next().unwrap_or("");
            Prerelease::new(rest).ok()?
        }
        None => Prerelease::EMPTY,
    };

    let segments: Vec<u64> = core
        .split('.')
        .map(|segment| segment.parse().ok())
        .collect::<Option<_>>()?;
    Some((segments, pre))
}

/// Compare two version strings under semantic-version precedence.
///
/// Both semver-shaped ("1.2.0-beta.1") and longer dotted forms ("1.2.3.4",
/// common for CMS plugins) are accepted; missing trailing segments count as
/// zero and pre-release sorts below release. Returns `None` when either
/// side is unreadable.
pub fn compare(a: &str, b: &str) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (parse_lenient(a), parse_lenient(b)) {
        return Some(a.cmp(&b));
    }

    let (a_core, a_pre) = parse_extended(a)?;
    let (b_core, b_pre) = parse_extended(b)?;

    for i in 0..a_core.len().max(b_core.len()) {
        let x = a_core.get(i).copied().unwrap_or(0);
        let y = b_core.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => {}
            other => return Some(other),
        }
    }

    Some(match (a_pre.is_empty(), b_pre.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a_pre.cmp(&b_pre),
    })
}

/// True iff `candidate` is strictly newer than `current`.
///
/// Unparseable versions never count as newer: an unreadable remote version
/// must not light up the update badge.
pub fn is_newer(candidate: &str, current: &str) -> bool {
    matches!(compare(candidate, current), Some(Ordering::Greater))
}
