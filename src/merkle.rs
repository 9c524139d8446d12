//! Power-of-two padded binary tree hashing.

use lazy_static::lazy_static;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

/// The 32-byte Merkle commitment of a value.
pub type Hash256 = ethereum_types::H256;

pub const BYTES_PER_CHUNK: usize = 32;

/// A 32-byte hash backend.
///
/// Backends may be stateless or stateful; a stateful backend is owned by a
/// single call tree.
pub trait Hasher {
    fn hash(&mut self, input: &[u8]) -> [u8; 32];

    fn hash32_concat(&mut self, left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
        let mut preimage = [0u8; 2 * BYTES_PER_CHUNK];
        preimage[..BYTES_PER_CHUNK].copy_from_slice(left);
        preimage[BYTES_PER_CHUNK..].copy_from_slice(right);
        self.hash(&preimage)
    }

    /// The root of an all-zero subtree of the given height.
    ///
    /// `Z[0] = [0; 32]`, `Z[k] = hash(Z[k-1] || Z[k-1])`. The default
    /// derives the value on demand; backends with a cached table should
    /// override this.
    fn zero_hash(&mut self, height: usize) -> [u8; 32] {
        let mut node = [0u8; 32];
        for _ in 0..height {
            let prev = node;
            node = self.hash32_concat(&prev, &prev);
        }
        node
    }
}

lazy_static! {
    static ref ZERO_HASHES: RwLock<Vec<[u8; 32]>> = RwLock::new(vec![[0; 32]]);
}

/// The default SHA-256 backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn hash(&mut self, input: &[u8]) -> [u8; 32] {
        Sha256::digest(input).into()
    }

    fn zero_hash(&mut self, height: usize) -> [u8; 32] {
        {
            let table = ZERO_HASHES.read();
            if let Some(node) = table.get(height) {
                return *node;
            }
        }
        let mut table = ZERO_HASHES.write();
        while table.len() <= height {
            let last = table[table.len() - 1];
            table.push(self.hash32_concat(&last, &last));
        }
        table[height]
    }
}

fn depth_for(padded_count: u64) -> u32 {
    if padded_count <= 1 {
        0
    } else {
        64 - (padded_count - 1).leading_zeros()
    }
}

/// Merkleizes `leaf_count` leaves padded out to `padded_count`.
///
/// `padded_count` is rounded up to the next power of two by depth; leaves at
/// `leaf_count..` are zero chunks, and entirely-empty subtrees short-circuit
/// to the height-appropriate zero hash. `padded_count == 0` yields the zero
/// chunk.
pub fn merkleize(
    hasher: &mut dyn Hasher,
    leaf_count: u64,
    padded_count: u64,
    leaf: &dyn Fn(u64) -> [u8; 32],
) -> Hash256 {
    if padded_count == 0 {
        return Hash256::zero();
    }
    let depth = depth_for(padded_count);
    Hash256::from(subtree_root(hasher, leaf, leaf_count, depth, 0))
}

fn subtree_root(
    hasher: &mut dyn Hasher,
    leaf: &dyn Fn(u64) -> [u8; 32],
    leaf_count: u64,
    depth: u32,
    base: u64,
) -> [u8; 32] {
    if base >= leaf_count {
        return hasher.zero_hash(depth as usize);
    }
    if depth == 0 {
        return leaf(base);
    }
    let half = 1u64 << (depth - 1);
    let left = subtree_root(hasher, leaf, leaf_count, depth - 1, base);
    let right = subtree_root(hasher, leaf, leaf_count, depth - 1, base + half);
    hasher.hash32_concat(&left, &right)
}

/// Merkleizes pre-computed 32-byte leaves.
pub fn merkleize_chunks(hasher: &mut dyn Hasher, chunks: &[[u8; 32]], padded_count: u64) -> Hash256 {
    merkleize(hasher, chunks.len() as u64, padded_count, &|i| {
        chunks[i as usize]
    })
}

/// Merkleizes packed little-endian data, 32 bytes per chunk, the final chunk
/// zero right-padded.
pub fn merkleize_packed_bytes(hasher: &mut dyn Hasher, data: &[u8], padded_count: u64) -> Hash256 {
    let chunk_count = (data.len() as u64 + BYTES_PER_CHUNK as u64 - 1) / BYTES_PER_CHUNK as u64;
    merkleize(hasher, chunk_count, padded_count, &|i| packed_leaf(data, i))
}

/// The `i`th 32-byte window of `data`, zero padded on overhang.
pub fn packed_leaf(data: &[u8], i: u64) -> [u8; 32] {
    let start = (i as usize) * BYTES_PER_CHUNK;
    let end = start + BYTES_PER_CHUNK;
    let mut chunk = [0u8; 32];
    if end <= data.len() {
        chunk.copy_from_slice(&data[start..end]);
    } else {
        let tail = &data[start.min(data.len())..];
        chunk[..tail.len()].copy_from_slice(tail);
    }
    chunk
}
