//! Proving and verifying the inclusion of single keys.
//!
//! A proof is the transcript of one root-to-leaf traversal. For every node on
//! the path it records one count: zero for a full node, the segment length
//! for a short node (a segment is never empty, so zero is unambiguous). Full
//! nodes additionally contribute the digest of the child that was *not*
//! taken. Together with the key and the digest of the matched leaf, that is
//! enough for a verifier to replay the traversal bottom-up and rebuild the
//! claimed root without seeing any values.

use alloc::vec::Vec;
use bitvec::prelude::*;

use crate::bits::owned_bits;
use crate::hasher::{hash_full, hash_leaf, hash_node, hash_short, Digest, KeyedHash};
use crate::trie::{Node, Trie, MAX_KEY_LENGTH};

/// Longest segment a single short node can carry, in bits.
const MAX_SEGMENT_BITS: usize = 8 * MAX_KEY_LENGTH;

/// An inclusion proof for a single key.
///
/// Expected to be serializable; the field order here is the canonical one.
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshDeserialize, borsh::BorshSerialize)
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    /// The proven key.
    pub key: Vec<u8>,
    /// Digest of the leaf holding the value.
    pub value_hash: Digest,
    /// One entry per node on the path from the root: zero for a full node,
    /// the segment length for a short node.
    pub short_counts: Vec<u32>,
    /// The digest of the sibling subtree at each full node, in traversal
    /// order. Holds exactly one entry per zero in `short_counts`.
    pub interim_hashes: Vec<Digest>,
}

impl Trie {
    /// Build an inclusion proof for `key` under the hasher `H`.
    ///
    /// Returns `None` when the key is not present (or has the wrong length);
    /// absence is not provable.
    pub fn prove<H: KeyedHash>(&self, key: &[u8]) -> Option<Proof> {
        if key.len() != self.key_length() {
            return None;
        }
        let bits = key.view_bits::<Msb0>();
        let mut cur = self.root()?;
        let mut index = 0;
        let mut short_counts = Vec::new();
        let mut interim_hashes = Vec::new();
        loop {
            match cur {
                Node::Full(full) => {
                    let (next, sibling) = if bits[index] {
                        (&*full.right, &*full.left)
                    } else {
                        (&*full.left, &*full.right)
                    };
                    short_counts.push(0);
                    interim_hashes.push(hash_node::<H>(sibling));
                    index += 1;
                    cur = next;
                }
                Node::Short(short) => {
                    if bits[index..index + short.path.len()] != short.path[..] {
                        return None;
                    }
                    short_counts.push(short.path.len() as u32);
                    index += short.path.len();
                    cur = &*short.child;
                }
                Node::Leaf(leaf) => {
                    return Some(Proof {
                        key: key.to_vec(),
                        value_hash: hash_leaf::<H>(&leaf.value),
                        short_counts,
                        interim_hashes,
                    });
                }
            }
        }
    }
}

impl Proof {
    /// Check the proof against a claimed root digest.
    ///
    /// The transcript is replayed from the leaf upwards: walking the counts
    /// right to left, a zero folds the matching sibling digest in on the side
    /// chosen by the key bit at that depth, and a segment length rebuilds the
    /// short node over the corresponding key bits. The proof is accepted iff
    /// the replay consumes the transcript exactly and lands on
    /// `expected_root`.
    ///
    /// Any inconsistency yields `false`; verification never panics.
    pub fn verify<H: KeyedHash>(&self, expected_root: &[u8]) -> bool {
        let key_bits = self.key.view_bits::<Msb0>();

        // total path length the transcript claims to cover
        let mut path_index = self.interim_hashes.len();
        for &count in &self.short_counts {
            if count as usize > MAX_SEGMENT_BITS {
                return false;
            }
            path_index = match path_index.checked_add(count as usize) {
                Some(total) => total,
                None => return false,
            };
        }
        if path_index > key_bits.len() {
            return false;
        }

        let mut current = self.value_hash;
        let mut hash_index = self.interim_hashes.len();

        for &count in self.short_counts.iter().rev() {
            if count == 0 {
                if hash_index == 0 || path_index == 0 {
                    return false;
                }
                hash_index -= 1;
                path_index -= 1;
                let sibling = &self.interim_hashes[hash_index];
                current = if key_bits[path_index] {
                    hash_full::<H>(sibling, &current)
                } else {
                    hash_full::<H>(&current, sibling)
                };
            } else {
                let count = count as usize;
                if count > path_index {
                    return false;
                }
                path_index -= count;
                let segment = owned_bits(&key_bits[path_index..path_index + count]);
                current = hash_short::<H>(count, segment.as_raw_slice(), &current);
            }
        }

        path_index == 0 && hash_index == 0 && expected_root == current.as_slice()
    }
}
