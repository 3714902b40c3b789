//! Content hashes over assembled sections.
//!
//! Each section is framed as `id 0x1F content 0x1E` before hashing so that
//! moving text across a section boundary changes the digest.

use promptward_core::SectionOutput;
use sha2::{Digest, Sha256};

const UNIT_SEP: &[u8] = b"\x1f";
const RECORD_SEP: &[u8] = b"\x1e";

fn frame(hasher: &mut Sha256, section: &SectionOutput) {
    hasher.update(section.id().as_str().as_bytes());
    hasher.update(UNIT_SEP);
    hasher.update(section.content().as_bytes());
    hasher.update(RECORD_SEP);
}

/// Order-independent hash over included stable and semistable sections,
/// sorted by section id.
pub fn stable_hash(sections: &[SectionOutput]) -> String {
    let mut cacheable: Vec<&SectionOutput> = sections
        .iter()
        .filter(|s| s.is_included() && s.cache_class().is_cacheable())
        .collect();
    cacheable.sort_by_key(|s| s.id().as_str());

    let mut hasher = Sha256::new();
    for section in cacheable {
        frame(&mut hasher, section);
    }
    hex::encode(hasher.finalize())
}

/// Order-dependent hash over every included section, as given.
pub fn volatile_hash(sections: &[SectionOutput]) -> String {
    let mut hasher = Sha256::new();
    for section in sections.iter().filter(|s| s.is_included()) {
        frame(&mut hasher, section);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptward_core::{CacheClass, SectionId};

    fn stable(id: SectionId, text: &str) -> SectionOutput {
        SectionOutput::included(id, text, CacheClass::Stable)
    }

    fn volatile(id: SectionId, text: &str) -> SectionOutput {
        SectionOutput::included(id, text, CacheClass::Volatile)
    }

    #[test]
    fn stable_hash_ignores_order_and_volatile_content() {
        let a = vec![
            stable(SectionId::Identity, "id"),
            stable(SectionId::OutputSchema, "schema"),
            volatile(SectionId::TaskContext, "book a table"),
        ];
        let b = vec![
            volatile(SectionId::TaskContext, "cancel my meeting"),
            stable(SectionId::OutputSchema, "schema"),
            stable(SectionId::Identity, "id"),
        ];
        assert_eq!(stable_hash(&a), stable_hash(&b));
        assert_ne!(volatile_hash(&a), volatile_hash(&b));
    }

    #[test]
    fn volatile_hash_is_order_dependent() {
        let a = vec![stable(SectionId::Identity, "x"), stable(SectionId::OutputSchema, "y")];
        let b = vec![stable(SectionId::OutputSchema, "y"), stable(SectionId::Identity, "x")];
        assert_ne!(volatile_hash(&a), volatile_hash(&b));
    }

    #[test]
    fn excluded_sections_do_not_contribute() {
        let with_gated = vec![
            stable(SectionId::Identity, "x"),
            SectionOutput::gated(SectionId::Tooling, CacheClass::Semistable, "no tools"),
        ];
        let without = vec![stable(SectionId::Identity, "x")];
        assert_eq!(stable_hash(&with_gated), stable_hash(&without));
        assert_eq!(volatile_hash(&with_gated), volatile_hash(&without));
    }

    #[test]
    fn framing_separates_boundaries() {
        let a = vec![stable(SectionId::Identity, "ab"), stable(SectionId::OutputSchema, "c")];
        let b = vec![stable(SectionId::Identity, "a"), stable(SectionId::OutputSchema, "bc")];
        assert_ne!(stable_hash(&a), stable_hash(&b));
    }

    #[test]
    fn digest_is_hex_sha256() {
        let h = stable_hash(&[]);
        assert_eq!(h.len(), 64);
        assert_eq!(
            h,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
