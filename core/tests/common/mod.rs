use pmtrie_core::{Node, Trie};

/// Walk the whole structure and assert the canonical-form invariants: every
/// root-to-leaf path spells exactly the key bit length, no short node parents
/// another short node, segments are non-empty with clean padding, and the
/// leaf count matches `len()`.
#[allow(dead_code)]
pub fn check_invariants(trie: &Trie) {
    let total_bits = 8 * trie.key_length();
    match trie.root() {
        None => assert_eq!(trie.len(), 0),
        Some(root) => {
            let leaves = check_node(root, 0, total_bits);
            assert_eq!(leaves, trie.len(), "leaf count diverged from len()");
        }
    }
}

fn check_node(node: &Node, depth: usize, total_bits: usize) -> usize {
    match node {
        Node::Leaf(_) => {
            assert_eq!(depth, total_bits, "leaf at depth {depth} of {total_bits}");
            1
        }
        Node::Short(short) => {
            let count = short.path.len();
            assert!(count >= 1, "empty segment");
            assert!(depth + count <= total_bits, "segment overruns the key");
            assert!(
                !matches!(&*short.child, Node::Short(_)),
                "short node parents another short node"
            );

            // the hasher feeds the raw backing bytes, so the padding bits of
            // the final byte must be zero
            let raw = short.path.as_raw_slice();
            assert_eq!(raw.len(), (count + 7) / 8);
            if count % 8 != 0 {
                let mask = 0xFFu8 >> (count % 8);
                assert_eq!(raw[raw.len() - 1] & mask, 0, "dirty segment padding");
            }

            check_node(&short.child, depth + count, total_bits)
        }
        Node::Full(full) => {
            assert!(depth < total_bits, "branch below leaf depth");
            check_node(&full.left, depth + 1, total_bits)
                + check_node(&full.right, depth + 1, total_bits)
        }
    }
}

/// Uniformly distributed keys from a cheap seeded PRNG, so failures
/// reproduce.
#[allow(dead_code)]
pub fn pseudorandom_keys(seed: u64, n: usize, key_length: usize) -> Vec<Vec<u8>> {
    use rand::{RngCore as _, SeedableRng as _};
    let mut s = [0u8; 16];
    s[..8].copy_from_slice(&seed.to_le_bytes());
    let mut rng = rand_pcg::Lcg64Xsh32::from_seed(s);
    (0..n)
        .map(|_| {
            let mut key = vec![0u8; key_length];
            rng.fill_bytes(&mut key);
            key
        })
        .collect()
}

/// Build a trie over the given pairs, checking invariants afterwards.
#[allow(dead_code)]
pub fn build(key_length: usize, pairs: &[(Vec<u8>, Vec<u8>)]) -> Trie {
    let mut trie = Trie::new(key_length).unwrap();
    for (key, value) in pairs {
        trie.put(key, value).unwrap();
    }
    check_invariants(&trie);
    trie
}
