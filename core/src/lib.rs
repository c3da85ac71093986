//! A binary patricia-merkle trie mapping fixed-length keys to opaque byte
//! values.
//!
//! Nothing within this crate relies on the standard library.
//!
//! ## Schema
//!
//! Keys are byte strings of one fixed length per trie (1 to 8192 bytes),
//! read as MSB-first bits. There are three kinds of nodes: leaf nodes
//! holding a value, full nodes branching both ways, and short nodes carrying
//! a compressed run of bits with a single descendant. The empty trie has no
//! root node at all.
//!
//! Mutation keeps the structure canonical: runs with one descendant are
//! always compressed and a full node always has both sides, so the same set
//! of key-value pairs takes the same shape, and therefore the same root
//! digest, regardless of the order of operations.
//!
//! ## Hashing
//!
//! Digests are domain-separated by node kind: every node is hashed under a
//! keyed 256-bit hash instantiated with the tag of its kind, so nodes of
//! different kinds can never collide. The primitive sits behind
//! [`hasher::KeyedHash`]; keyed Blake2b-256 ships as [`hasher::Blake2b256`].
//! The root digest of an empty trie is the empty byte string.
//!
//! ## Proofs
//!
//! [`Trie::prove`] records the traversal to a key as a flat transcript of
//! per-node counts and sibling digests; [`Proof::verify`] replays it against
//! a claimed root without access to the trie. See [`proof`].

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod bits;
pub mod hasher;
pub mod proof;
pub mod trie;

pub use bits::BitPath;
pub use hasher::{Blake2b256, Digest, KeyedHash};
pub use proof::Proof;
pub use trie::{Full, IncompatibleKeyLength, Leaf, Node, Short, Trie, MAX_KEY_LENGTH};
