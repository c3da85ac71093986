//! The trie itself: node model, mutation, and lookup.
//!
//! A binary patricia-merkle trie maps keys of a fixed byte length to opaque
//! byte values. Compared to a plain binary merkle tree, every run of nodes
//! with a single descendant is compressed into one short node carrying the
//! shared bit string, which keeps the structure proportional to the number of
//! stored keys rather than to the key length.
//!
//! There are three node kinds.
//!   1. Leaf nodes, which hold a value. The key is spelled entirely by the
//!      path from the root, so leaves do not store it.
//!   2. Short nodes, which carry a compressed segment of 1..=65536 bits and
//!      exactly one descendant.
//!   3. Full nodes, which branch with a subtree on both sides.
//!
//! The empty trie has no root at all.
//!
//! Mutation maintains a canonical form: a short node never parents another
//! short node, and a full node never has a missing side. Under those rules
//! any set of key-value pairs has exactly one shape, so the same contents
//! always produce the same root digest no matter the order of insertions and
//! deletions. Splits on insert and merges on delete do the upkeep.

use alloc::boxed::Box;
use alloc::vec::Vec;
use bitvec::prelude::*;

use crate::bits::{common_prefix_len, concat_bits, owned_bits, single_bit, BitPath};
use crate::hasher::{hash_node, KeyedHash};

/// Maximum supported key length in bytes.
///
/// The limit comes from the segment-length encoding: a short node spends two
/// bytes on the number of bits it compresses, and with the wraparound
/// convention of [`crate::hasher::encode_segment_len`] those two bytes cover
/// segments of up to 65536 bits, enough for a whole key of 8192 bytes.
pub const MAX_KEY_LENGTH: usize = 8192;

/// The only failure mode of the trie: a key length it cannot work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IncompatibleKeyLength {
    /// [`Trie::new`] was given a key length outside the supported interval.
    #[error("key length {0} is outside of the supported interval [1, {MAX_KEY_LENGTH}]")]
    OutOfRange(usize),
    /// A key passed to [`Trie::put`] does not have the configured length.
    #[error("trie is configured for keys of {expected} bytes, got {actual}")]
    Mismatch {
        /// The key length the trie was created with.
        expected: usize,
        /// The length of the offending key.
        actual: usize,
    },
}

/// A subtree slot. `None` only ever inhabits the root of an empty trie.
pub(crate) type Link = Option<Box<Node>>;

/// A node of the trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A terminal holding a value.
    Leaf(Leaf),
    /// A compressed run of bits with a single descendant.
    Short(Short),
    /// A branch with a subtree on both sides.
    Full(Full),
}

/// A terminal node. The full key is determined by the path leading here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// The stored value. The trie owns this copy.
    pub value: Vec<u8>,
}

/// A path-compressed node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Short {
    /// The compressed segment, 1..=65536 bits, with zeroed trailing padding.
    pub path: BitPath,
    /// The single descendant. Never another short node.
    pub child: Box<Node>,
}

/// A branching node. Both sides are always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Full {
    /// Subtree for keys whose next bit is 0.
    pub left: Box<Node>,
    /// Subtree for keys whose next bit is 1.
    pub right: Box<Node>,
}

/// A binary patricia-merkle trie over keys of one fixed byte length.
///
/// Mutation and lookup never touch the hash primitive; digests are computed
/// on demand by [`Trie::root_hash`] and [`Trie::prove`] for a caller-chosen
/// [`KeyedHash`].
///
/// A `&mut self` mutation excludes every other operation and a `&self`
/// lookup excludes mutation, which is exactly the concurrency contract the
/// structure requires; there is no internal locking.
#[derive(Debug, Clone)]
pub struct Trie {
    key_length: usize,
    len: usize,
    root: Link,
}

impl Trie {
    /// Create an empty trie for keys of `key_length` bytes.
    pub fn new(key_length: usize) -> Result<Self, IncompatibleKeyLength> {
        if key_length < 1 || key_length > MAX_KEY_LENGTH {
            return Err(IncompatibleKeyLength::OutOfRange(key_length));
        }
        Ok(Trie {
            key_length,
            len: 0,
            root: None,
        })
    }

    /// The configured key length in bytes.
    pub fn key_length(&self) -> usize {
        self.key_length
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the trie holds no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The root node, if the trie is non-empty.
    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    /// Root digest under the hasher `H`.
    ///
    /// The empty trie hashes to the empty byte string. That sentinel is not a
    /// digest, so callers comparing against a 32-byte expected root must
    /// treat the empty case separately.
    pub fn root_hash<H: KeyedHash>(&self) -> Vec<u8> {
        match &self.root {
            None => Vec::new(),
            Some(node) => hash_node::<H>(node).to_vec(),
        }
    }

    /// Store `value` under `key`, returning whether a previous value was
    /// replaced.
    ///
    /// Both slices are copied, so callers may freely reuse their buffers. A
    /// failing `put` leaves the trie untouched.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<bool, IncompatibleKeyLength> {
        if key.len() != self.key_length {
            return Err(IncompatibleKeyLength::Mismatch {
                expected: self.key_length,
                actual: key.len(),
            });
        }

        let bits = key.view_bits::<Msb0>();
        let (root, replaced) = match self.root.take() {
            None => (Box::new(tail(bits, value)), false),
            Some(node) => put_node(node, bits, value),
        };
        self.root = Some(root);
        if !replaced {
            self.len += 1;
        }
        Ok(replaced)
    }

    /// Retrieve the value stored under `key`.
    ///
    /// A key of the wrong length is simply not found.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        if key.len() != self.key_length {
            return None;
        }
        let bits = key.view_bits::<Msb0>();
        let mut cur = self.root.as_deref()?;
        let mut index = 0;
        loop {
            match cur {
                Node::Full(full) => {
                    cur = if bits[index] { &*full.right } else { &*full.left };
                    index += 1;
                }
                Node::Short(short) => {
                    if bits[index..index + short.path.len()] != short.path[..] {
                        return None;
                    }
                    index += short.path.len();
                    cur = &*short.child;
                }
                Node::Leaf(leaf) => return Some(&leaf.value),
            }
        }
    }

    /// Remove the value stored under `key`, returning whether it was present.
    ///
    /// On success the structure is re-canonicalized: a short node that only
    /// led to the removed leaf disappears, a full node that lost a side
    /// collapses into a one-bit short node, and neighboring short nodes are
    /// merged. A key of the wrong length is simply not found.
    pub fn del(&mut self, key: &[u8]) -> bool {
        if key.len() != self.key_length {
            return false;
        }
        let Some(root) = self.root.take() else {
            return false;
        };
        let (root, found) = del_node(root, key.view_bits::<Msb0>());
        self.root = root;
        if found {
            self.len -= 1;
        }
        found
    }
}

// The subtree spelling the rest of a key: a leaf, behind a short node when
// any bits remain.
fn tail(bits: &BitSlice<u8, Msb0>, value: &[u8]) -> Node {
    let leaf = Node::Leaf(Leaf {
        value: value.to_vec(),
    });
    if bits.is_empty() {
        leaf
    } else {
        Node::Short(Short {
            path: owned_bits(bits),
            child: Box::new(leaf),
        })
    }
}

// Insert `value` into the subtree at `node`, with `bits` the not yet consumed
// suffix of the key. Returns the rewritten subtree and whether an existing
// value was overwritten.
fn put_node(node: Box<Node>, bits: &BitSlice<u8, Msb0>, value: &[u8]) -> (Box<Node>, bool) {
    match *node {
        // a leaf is only ever reached once the whole key is consumed
        Node::Leaf(_) => (
            Box::new(Node::Leaf(Leaf {
                value: value.to_vec(),
            })),
            true,
        ),
        Node::Full(Full { left, right }) => {
            if bits[0] {
                let (right, replaced) = put_node(right, &bits[1..], value);
                (Box::new(Node::Full(Full { left, right })), replaced)
            } else {
                let (left, replaced) = put_node(left, &bits[1..], value);
                (Box::new(Node::Full(Full { left, right })), replaced)
            }
        }
        Node::Short(Short { path, child }) => {
            let common = common_prefix_len(&path, bits);
            if common == path.len() {
                let (child, replaced) = put_node(child, &bits[common..], value);
                (Box::new(Node::Short(Short { path, child })), replaced)
            } else {
                (Box::new(split_short(path, child, bits, common, value)), false)
            }
        }
    }
}

// Split a short node whose segment diverges from the key after `common`
// shared bits: the shared prefix (if any) stays a short node, and below it a
// full node separates the new key from the remainder of the original segment
// with its original child.
fn split_short(
    path: BitPath,
    child: Box<Node>,
    bits: &BitSlice<u8, Msb0>,
    common: usize,
    value: &[u8],
) -> Node {
    // the diverging bit decides which side keeps the original subtree
    let old_bit = path[common];

    let remainder = path.len() - common - 1;
    let old_side = if remainder > 0 {
        Box::new(Node::Short(Short {
            path: owned_bits(&path[common + 1..]),
            child,
        }))
    } else {
        child
    };
    let new_side = Box::new(tail(&bits[common + 1..], value));

    let full = if old_bit {
        Full {
            left: new_side,
            right: old_side,
        }
    } else {
        Full {
            left: old_side,
            right: new_side,
        }
    };

    if common > 0 {
        Node::Short(Short {
            path: owned_bits(&path[..common]),
            child: Box::new(Node::Full(full)),
        })
    } else {
        Node::Full(full)
    }
}

// Remove the key spelled by `bits` from the subtree at `node`. Returns the
// rewritten subtree (`None` when nothing is left of it) and whether the key
// was found.
//
// Each unwound frame restores the canonical form locally: a short node whose
// run has nothing below it anymore dissolves, a full node that lost a side
// collapses into a one-bit short node toward the survivor, and
// `reattach_short` absorbs short children. A merged parent cannot itself
// have a short parent, so no merge ever chains further.
fn del_node(node: Box<Node>, bits: &BitSlice<u8, Msb0>) -> (Link, bool) {
    match *node {
        Node::Leaf(_) => (None, true),
        Node::Short(Short { path, child }) => {
            if common_prefix_len(&path, bits) != path.len() {
                return (Some(Box::new(Node::Short(Short { path, child }))), false);
            }
            let count = path.len();
            let (child, found) = del_node(child, &bits[count..]);
            let link = match child {
                // the run below is gone, and so is the short that spelled it
                None => None,
                Some(child) => Some(Box::new(reattach_short(path, child))),
            };
            (link, found)
        }
        Node::Full(Full { left, right }) => {
            let bit = bits[0];
            let (descend, keep, keep_bit) = if bit {
                (right, left, false)
            } else {
                (left, right, true)
            };
            let (descend, found) = del_node(descend, &bits[1..]);
            let node = match descend {
                Some(side) => {
                    let (left, right) = if bit { (keep, side) } else { (side, keep) };
                    Node::Full(Full { left, right })
                }
                // one side is gone; the branch degenerates into a one-bit
                // run toward the survivor
                None => reattach_short(single_bit(keep_bit), keep),
            };
            (Some(Box::new(node)), found)
        }
    }
}

// Attach `child` below a segment, absorbing the child's own segment when it
// is a short node so that no short node ever parents another.
fn reattach_short(path: BitPath, child: Box<Node>) -> Node {
    match *child {
        Node::Short(Short {
            path: child_path,
            child,
        }) => Node::Short(Short {
            path: concat_bits(&path, &child_path),
            child,
        }),
        other => Node::Short(Short {
            path,
            child: Box::new(other),
        }),
    }
}
