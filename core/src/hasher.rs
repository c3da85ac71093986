//! Node hashing.
//!
//! Every node kind is digested under a keyed 256-bit hash instantiated with
//! its own domain-separation tag, so structurally different nodes can never
//! collide:
//!
//!   - leaf: keyed([`LEAF_TAG`]) over the value bytes.
//!   - full: keyed([`FULL_TAG`]) over `hash(left) ‖ hash(right)`.
//!   - short: keyed([`SHORT_TAG`]) over `encode ‖ segment-bytes ‖ hash(child)`,
//!     where `encode` is the two-byte segment length of
//!     [`encode_segment_len`].
//!
//! The hash primitive itself sits behind the [`KeyedHash`] trait; operations
//! that need digests take it as a type parameter. [`Blake2b256`] is the
//! implementation the crate ships with.

use digest::{consts::U32, FixedOutput, KeyInit, Update};

use crate::trie::Node;

/// A 256-bit node digest.
pub type Digest = [u8; 32];

/// Domain-separation key for leaf nodes.
pub const LEAF_TAG: [u8; 1] = [0];
/// Domain-separation key for full (branching) nodes.
pub const FULL_TAG: [u8; 1] = [1];
/// Domain-separation key for short (path-compressed) nodes.
pub const SHORT_TAG: [u8; 1] = [2];

/// A keyed 256-bit hash.
///
/// One instance digests one node: it is created with the node kind's
/// domain-separation tag, absorbs the node's inputs, and finalizes into 32
/// bytes. Writing never fails.
pub trait KeyedHash {
    /// Create a hasher keyed with the given domain-separation tag.
    fn keyed(tag: &[u8]) -> Self;

    /// Absorb `data`.
    fn write(&mut self, data: &[u8]);

    /// Finalize into a 256-bit digest.
    fn finish(self) -> Digest;
}

/// Keyed Blake2b-256.
pub struct Blake2b256(blake2::Blake2bMac<U32>);

impl KeyedHash for Blake2b256 {
    fn keyed(tag: &[u8]) -> Self {
        // the node tags are single bytes, always within blake2b's key bounds
        Blake2b256(blake2::Blake2bMac::new_from_slice(tag).expect("valid blake2b key"))
    }

    fn write(&mut self, data: &[u8]) {
        Update::update(&mut self.0, data);
    }

    fn finish(self) -> Digest {
        self.0.finalize_fixed().into()
    }
}

/// Serialize a path-segment length into its two-byte big-endian form.
///
/// A short node's segment spans 1..=65536 bits while only two bytes are spent
/// on the length, so the encoding leans on modular wraparound: 65536 becomes
/// `0x00 0x00` and every other length its plain big-endian `u16`. A length of
/// zero never occurs in the trie, which keeps the convention unambiguous.
/// Canonical root hashes depend on it; the overflow is not a bug to fix.
pub fn encode_segment_len(count: usize) -> [u8; 2] {
    (count as u16).to_be_bytes()
}

/// Digest of a leaf holding `value`.
pub fn hash_leaf<H: KeyedHash>(value: &[u8]) -> Digest {
    let mut h = H::keyed(&LEAF_TAG);
    h.write(value);
    h.finish()
}

/// Digest of a full node with the given child digests.
pub fn hash_full<H: KeyedHash>(left: &Digest, right: &Digest) -> Digest {
    let mut h = H::keyed(&FULL_TAG);
    h.write(left);
    h.write(right);
    h.finish()
}

/// Digest of a short node with a segment of `count` bits backed by `path`
/// and the given child digest.
pub fn hash_short<H: KeyedHash>(count: usize, path: &[u8], child: &Digest) -> Digest {
    let mut h = H::keyed(&SHORT_TAG);
    h.write(&encode_segment_len(count));
    h.write(path);
    h.write(child);
    h.finish()
}

/// Digest of an arbitrary subtree.
pub fn hash_node<H: KeyedHash>(node: &Node) -> Digest {
    match node {
        Node::Leaf(leaf) => hash_leaf::<H>(&leaf.value),
        Node::Short(short) => hash_short::<H>(
            short.path.len(),
            short.path.as_raw_slice(),
            &hash_node::<H>(&short.child),
        ),
        Node::Full(full) => hash_full::<H>(
            &hash_node::<H>(&full.left),
            &hash_node::<H>(&full.right),
        ),
    }
}
