//! Release family detection for the locally built version

use once_cell::sync::Lazy;
use regex::Regex;

pub const FAMILY_2_0: &str = "2.0.x";
pub const FAMILY_2_1: &str = "2.1.x";
pub const FAMILY_2_2: &str = "2.2.x";
pub const FAMILY_3_0: &str = "3.0.x";
pub const FAMILY_3_X: &str = "3.x";
pub const FAMILY_TRUNK: &str = "trunk";
pub const FAMILY_UNKNOWN: &str = "unknown";

static VERSION_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^v?(\d+(?:\.\d+)*)").expect("static version pattern is valid")
});

/// Numeric components of the leading dotted version (`3.0.5-SNAPSHOT` -> `[3, 0, 5]`)
fn numeric_components(version: &str) -> Option<Vec<u64>> {
    let caps = VERSION_PREFIX.captures(version.trim())?;
    caps[1].split('.').map(|part| part.parse::<u64>().ok()).collect()
}

/// Map a version string onto the release family it belongs to
///
/// `2.0`, `2.1`, `2.2` and `3.0` lines keep their own family; anything
/// newer than `3.0` is the tick-tock `3.x` family.
pub fn version_family(version: &str) -> String {
    let Some(parts) = numeric_components(version) else {
        return FAMILY_UNKNOWN.to_string();
    };

    let family = match parts.as_slice() {
        [2, 0, ..] => FAMILY_2_0,
        [2, 1, ..] => FAMILY_2_1,
        [2, 2, ..] => FAMILY_2_2,
        [3, 0, ..] => FAMILY_3_0,
        _ if parts.as_slice() > [3u64, 0].as_slice() => FAMILY_3_X,
        _ => FAMILY_UNKNOWN,
    };
    family.to_string()
}
