//! The per-package artifact store persisted to `artifacts.dat`.

use crate::codec::{CodecError, Decode, Encode, Reader, Writer};
use crate::interface::DependencyInterface;
use crate::objects::GlobalGraph;
use gren_core::{PackageName, Raw, Version};
use std::collections::{BTreeMap, BTreeSet};

/// The exact direct-dependency versions a package was built against.
///
/// The same package version can be built under different fingerprints when
/// different projects resolve its dependencies differently; each valid
/// fingerprint maps to the same artifacts.
pub type Fingerprint = BTreeMap<PackageName, Version>;

/// Everything a dependency package contributes to a build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Artifacts {
    /// Exposed modules only; non-exposed modules are omitted entirely.
    pub interfaces: BTreeMap<Raw, DependencyInterface>,
    /// The package's linked object graph.
    pub objects: GlobalGraph,
}

/// On-disk cache of a package's artifacts with the fingerprints they satisfy.
///
/// The fingerprint set is append-only within a run; artifacts are replaced
/// wholesale when a build under a new fingerprint produces them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArtifactCache {
    /// Fingerprints these artifacts are valid for.
    pub fingerprints: BTreeSet<Fingerprint>,
    /// The artifacts themselves.
    pub artifacts: Artifacts,
}

impl ArtifactCache {
    /// A cache holding one fingerprint and its artifacts.
    #[must_use]
    pub fn new(fingerprint: Fingerprint, artifacts: Artifacts) -> Self {
        Self {
            fingerprints: BTreeSet::from([fingerprint]),
            artifacts,
        }
    }

    /// Artifacts to reuse when `fingerprint` is already covered.
    #[must_use]
    pub fn matching(&self, fingerprint: &Fingerprint) -> Option<&Artifacts> {
        self.fingerprints
            .contains(fingerprint)
            .then_some(&self.artifacts)
    }

    /// Record that `fingerprint` is also satisfied by the stored artifacts.
    pub fn insert_fingerprint(&mut self, fingerprint: Fingerprint) {
        self.fingerprints.insert(fingerprint);
    }
}

impl Encode for Artifacts {
    fn encode(&self, writer: &mut Writer) {
        self.interfaces.encode(writer);
        self.objects.encode(writer);
    }
}

impl Decode for Artifacts {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            interfaces: BTreeMap::decode(reader)?,
            objects: GlobalGraph::decode(reader)?,
        })
    }
}

impl Encode for ArtifactCache {
    fn encode(&self, writer: &mut Writer) {
        self.fingerprints.encode(writer);
        self.artifacts.encode(writer);
    }
}

impl Decode for ArtifactCache {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            fingerprints: BTreeSet::decode(reader)?,
            artifacts: Artifacts::decode(reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{from_bytes, to_bytes};
    use crate::interface::Interface;
    use pretty_assertions::assert_eq;

    fn fingerprint(entries: &[(&str, Version)]) -> Fingerprint {
        entries
            .iter()
            .map(|(name, version)| (name.parse().unwrap(), *version))
            .collect()
    }

    fn sample_artifacts() -> Artifacts {
        Artifacts {
            interfaces: BTreeMap::from([(
                "Basics".parse().unwrap(),
                DependencyInterface::Public(Interface::new("gren/core".parse().unwrap())),
            )]),
            objects: GlobalGraph::new(),
        }
    }

    #[test]
    fn matching_is_exact() {
        let built_against = fingerprint(&[("gren/core", Version::ONE)]);
        let cache = ArtifactCache::new(built_against.clone(), sample_artifacts());

        assert!(cache.matching(&built_against).is_some());
        assert!(cache
            .matching(&fingerprint(&[("gren/core", Version::new(1, 0, 1))]))
            .is_none());
        assert!(cache.matching(&Fingerprint::new()).is_none());
    }

    #[test]
    fn fingerprints_accumulate() {
        let mut cache = ArtifactCache::new(Fingerprint::new(), sample_artifacts());
        cache.insert_fingerprint(fingerprint(&[("gren/url", Version::new(2, 0, 0))]));
        assert_eq!(cache.fingerprints.len(), 2);
        assert!(cache.matching(&Fingerprint::new()).is_some());
    }

    #[test]
    fn cache_roundtrips() {
        let cache = ArtifactCache::new(
            fingerprint(&[("gren/core", Version::ONE), ("gren/url", Version::new(2, 0, 1))]),
            sample_artifacts(),
        );
        assert_eq!(from_bytes::<ArtifactCache>(&to_bytes(&cache)).unwrap(), cache);
    }

    #[test]
    fn corrupt_cache_is_a_decode_error_not_a_crash() {
        let mut bytes = to_bytes(&ArtifactCache::new(Fingerprint::new(), sample_artifacts()));
        let mid = bytes.len() / 2;
        bytes.truncate(mid);
        assert!(from_bytes::<ArtifactCache>(&bytes).is_err());
    }
}
