#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pmtrie_core::{Blake2b256, Node, Trie};

type H = Blake2b256;

const KEY_LENGTH: usize = 4;
const KEY_POOL_SIZE: u16 = 512;

/// One trie operation. Keys are referenced as indices into a fixed pool so
/// the fuzzer spends its budget on operation sequences, not key material.
#[derive(Debug, Arbitrary)]
enum Op {
    Put(u16, u8),
    Del(u16),
    Get(u16),
    Prove(u16),
}

fn pool_key(index: u16) -> [u8; KEY_LENGTH] {
    // spread pool indices over the key space so splits happen at every depth
    let spread = (index % KEY_POOL_SIZE) as u32;
    (spread.wrapping_mul(0x9E37_79B9)).to_be_bytes()
}

fuzz_target!(|ops: Vec<Op>| {
    let mut trie = Trie::new(KEY_LENGTH).unwrap();
    let mut oracle: BTreeMap<[u8; KEY_LENGTH], Vec<u8>> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Put(index, value) => {
                let key = pool_key(index);
                let value = vec![value];
                let replaced = trie.put(&key, &value).unwrap();
                assert_eq!(replaced, oracle.insert(key, value).is_some());
            }
            Op::Del(index) => {
                let key = pool_key(index);
                assert_eq!(trie.del(&key), oracle.remove(&key).is_some());
            }
            Op::Get(index) => {
                let key = pool_key(index);
                assert_eq!(trie.get(&key), oracle.get(&key).map(|v| v.as_slice()));
            }
            Op::Prove(index) => {
                let key = pool_key(index);
                match trie.prove::<H>(&key) {
                    Some(proof) => {
                        assert!(oracle.contains_key(&key));
                        assert!(proof.verify::<H>(&trie.root_hash::<H>()));
                    }
                    None => assert!(!oracle.contains_key(&key)),
                }
            }
        }
    }

    assert_eq!(trie.len(), oracle.len());
    check_structure(&trie);

    // the canonical shape: rebuilding from the surviving pairs alone must
    // reproduce the root digest
    let mut rebuilt = Trie::new(KEY_LENGTH).unwrap();
    for (key, value) in &oracle {
        rebuilt.put(key, value).unwrap();
    }
    assert_eq!(trie.root_hash::<H>(), rebuilt.root_hash::<H>());
});

fn check_structure(trie: &Trie) {
    fn walk(node: &Node, depth: usize, total_bits: usize) {
        match node {
            Node::Leaf(_) => assert_eq!(depth, total_bits),
            Node::Short(short) => {
                assert!(!short.path.is_empty());
                assert!(!matches!(&*short.child, Node::Short(_)));
                walk(&short.child, depth + short.path.len(), total_bits);
            }
            Node::Full(full) => {
                walk(&full.left, depth + 1, total_bits);
                walk(&full.right, depth + 1, total_bits);
            }
        }
    }
    if let Some(root) = trie.root() {
        walk(root, 0, 8 * trie.key_length());
    }
}
