mod common;

use common::{build, pseudorandom_keys};
use pmtrie_core::{Blake2b256, Proof, Trie};
use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};
use rand::{Rng, SeedableRng};

type H = Blake2b256;

fn sample_trie(seed: u64, n: usize) -> (Trie, Vec<Vec<u8>>) {
    let keys = pseudorandom_keys(seed, n, 8);
    let pairs: Vec<_> = keys.iter().map(|k| (k.clone(), k[..2].to_vec())).collect();
    (build(8, &pairs), keys)
}

#[test]
fn every_present_key_is_provable() {
    let (trie, keys) = sample_trie(11, 150);
    let root = trie.root_hash::<H>();
    for key in &keys {
        let proof = trie.prove::<H>(key).unwrap();
        assert_eq!(&proof.key, key);
        assert!(proof.verify::<H>(&root));
        // a sibling digest accompanies every branch taken
        let zeros = proof.short_counts.iter().filter(|c| **c == 0).count();
        assert_eq!(zeros, proof.interim_hashes.len());
    }
}

#[test]
fn proofs_do_not_transfer_between_roots() {
    let (a, keys) = sample_trie(21, 60);
    let (b, _) = sample_trie(22, 60);
    let root_b = b.root_hash::<H>();
    for key in &keys {
        let proof = a.prove::<H>(key).unwrap();
        assert!(!proof.verify::<H>(&root_b));
    }
}

#[test]
fn absent_keys_are_not_provable() {
    let (trie, _) = sample_trie(31, 100);
    for key in pseudorandom_keys(32, 50, 8) {
        if trie.get(&key).is_none() {
            assert!(trie.prove::<H>(&key).is_none());
        }
    }
}

#[test]
fn any_single_bit_flip_breaks_a_proof() {
    let (trie, keys) = sample_trie(41, 40);
    let root = trie.root_hash::<H>();
    let mut rng = rand::rngs::StdRng::seed_from_u64(41);

    for key in &keys {
        let proof = trie.prove::<H>(key).unwrap();
        assert!(proof.verify::<H>(&root));

        let mut bad = proof.clone();
        let bit = rng.gen_range(0..256);
        bad.value_hash[bit / 8] ^= 1 << (bit % 8);
        assert!(!bad.verify::<H>(&root));

        if !proof.interim_hashes.is_empty() {
            let mut bad = proof.clone();
            let pick = rng.gen_range(0..bad.interim_hashes.len());
            let bit = rng.gen_range(0..256);
            bad.interim_hashes[pick][bit / 8] ^= 1 << (bit % 8);
            assert!(!bad.verify::<H>(&root));
        }

        let mut bad = proof.clone();
        let pick = rng.gen_range(0..bad.short_counts.len());
        bad.short_counts[pick] ^= 1 << rng.gen_range(0..8);
        assert!(!bad.verify::<H>(&root));

        let mut bad_root = root.clone();
        let bit = rng.gen_range(0..256);
        bad_root[bit / 8] ^= 1 << (bit % 8);
        assert!(!proof.verify::<H>(&bad_root));
    }
}

#[derive(Clone, Debug)]
struct Keys(Vec<u64>);

impl Arbitrary for Keys {
    fn arbitrary(g: &mut Gen) -> Self {
        let n = usize::arbitrary(g) % 40;
        Keys((0..n).map(|_| u64::arbitrary(g)).collect())
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(Keys))
    }
}

#[test]
fn proving_commutes_with_rebuilding() {
    fn prop(keys: Keys) -> TestResult {
        let mut pairs: Vec<_> = keys
            .0
            .iter()
            .map(|k| (k.to_be_bytes().to_vec(), k.to_le_bytes().to_vec()))
            .collect();
        pairs.sort();
        pairs.dedup_by(|a, b| a.0 == b.0);
        if pairs.is_empty() {
            return TestResult::discard();
        }

        let trie = build(8, &pairs);
        let root = trie.root_hash::<H>();
        let ok = pairs.iter().all(|(key, _)| {
            trie.prove::<H>(key)
                .map(|p: Proof| p.verify::<H>(&root))
                .unwrap_or(false)
        });
        TestResult::from_bool(ok)
    }

    QuickCheck::new()
        .gen(Gen::new(32))
        .quickcheck(prop as fn(Keys) -> TestResult);
}
