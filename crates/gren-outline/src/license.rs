//! OSI-approved SPDX license identifiers accepted in package manifests.

/// Identifiers the registry accepts, matched exactly.
const KNOWN_LICENSES: &[&str] = &[
    "AFL-3.0",
    "AGPL-3.0",
    "Apache-2.0",
    "Artistic-2.0",
    "BSD-2-Clause",
    "BSD-3-Clause",
    "BSD-3-Clause-Clear",
    "BSL-1.0",
    "CC0-1.0",
    "EPL-1.0",
    "EPL-2.0",
    "EUPL-1.1",
    "GPL-2.0",
    "GPL-3.0",
    "ISC",
    "LGPL-2.1",
    "LGPL-3.0",
    "MIT",
    "MPL-2.0",
    "OSL-3.0",
    "PostgreSQL",
    "Unlicense",
    "Zlib",
];

/// Is `candidate` a license identifier the registry accepts?
///
/// Matching is case-sensitive, as SPDX identifiers are.
#[must_use]
pub fn is_known_license(candidate: &str) -> bool {
    KNOWN_LICENSES.binary_search(&candidate).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_sorted_for_binary_search() {
        let mut sorted = KNOWN_LICENSES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, KNOWN_LICENSES);
    }

    #[test]
    fn exact_match_only() {
        assert!(is_known_license("BSD-3-Clause"));
        assert!(is_known_license("MIT"));
        assert!(!is_known_license("mit"));
        assert!(!is_known_license("BSD"));
        assert!(!is_known_license(""));
    }
}
