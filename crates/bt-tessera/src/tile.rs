//! Inclusion-proof construction from level tiles
//!
//! A tile stores up to 256 hashes of one tree level (every eighth level is
//! materialized; interior nodes are recomputed by hashing). An inclusion
//! proof is the list of sibling subtree roots along the leaf's path; each
//! root is derived from the base row of the tile covering it, so a proof
//! costs O(log n) tile fetches.

use crate::fetch::TileFetcher;
use bt_merkle::{hash_children, HASH_SIZE};
use bt_transparency::{Error, Result};
use std::collections::HashMap;

/// Tree levels covered by one tile
const TILE_HEIGHT: u64 = 8;

/// Hashes in a full tile row
const TILE_WIDTH: u64 = 256;

/// The largest power of two strictly below n (n >= 2)
fn split(n: u64) -> u64 {
    1 << (63 - (n - 1).leading_zeros())
}

/// The sibling subtree ranges of a leaf's inclusion path, leaf to root
fn sibling_ranges(leaf_index: u64, tree_size: u64) -> Vec<(u64, u64)> {
    fn walk(lo: u64, hi: u64, index: u64, out: &mut Vec<(u64, u64)>) {
        if hi - lo == 1 {
            return;
        }
        let k = split(hi - lo);
        if index < lo + k {
            walk(lo, lo + k, index, out);
            out.push((lo + k, hi));
        } else {
            walk(lo + k, hi, index, out);
            out.push((lo, lo + k));
        }
    }

    let mut out = Vec::new();
    walk(0, tree_size, leaf_index, &mut out);
    out
}

/// Decompose a leaf range into perfect aligned subtrees, left to right
///
/// Heights strictly decrease, so the range root is the right-associated
/// fold of the parts.
fn perfect_decomposition(lo: u64, hi: u64) -> Vec<(u64, u64)> {
    let mut parts = Vec::new();
    let mut lo = lo;

    while lo < hi {
        let size = hi - lo;
        let fit = if size.is_power_of_two() { size } else { split(size) };
        let align = if lo == 0 { u64::MAX } else { 1u64 << lo.trailing_zeros() };
        let step = fit.min(align);

        let height = step.trailing_zeros() as u64;
        parts.push((height, lo >> height));
        lo += step;
    }

    parts
}

/// Builds inclusion proofs for one tree size from a log's tiles
pub struct ProofBuilder<'a> {
    fetcher: &'a dyn TileFetcher,
    tree_size: u64,
    tiles: HashMap<(u64, u64), Vec<[u8; HASH_SIZE]>>,
}

impl<'a> ProofBuilder<'a> {
    /// Create a builder for proofs under the given tree size
    pub fn new(fetcher: &'a dyn TileFetcher, tree_size: u64) -> Self {
        Self {
            fetcher,
            tree_size,
            tiles: HashMap::new(),
        }
    }

    /// Build the inclusion proof for a leaf
    pub async fn inclusion_proof(&mut self, leaf_index: u64) -> Result<Vec<[u8; HASH_SIZE]>> {
        if leaf_index >= self.tree_size {
            return Err(Error::Parse(format!(
                "leaf index {} >= tree size {}",
                leaf_index, self.tree_size
            )));
        }

        let mut path = Vec::new();
        for (lo, hi) in sibling_ranges(leaf_index, self.tree_size) {
            path.push(self.range_root(lo, hi).await?);
        }

        Ok(path)
    }

    /// The RFC 6962 root of a leaf range
    async fn range_root(&mut self, lo: u64, hi: u64) -> Result<[u8; HASH_SIZE]> {
        let mut roots = Vec::new();
        for (height, index) in perfect_decomposition(lo, hi) {
            roots.push(self.perfect_node(height, index).await?);
        }

        let mut root = roots.pop().ok_or_else(|| {
            Error::Parse(format!("empty leaf range [{}, {})", lo, hi))
        })?;
        for left in roots.into_iter().rev() {
            root = hash_children(&left, &root);
        }

        Ok(root)
    }

    /// The root of the perfect subtree of the given height and index
    async fn perfect_node(&mut self, height: u64, index: u64) -> Result<[u8; HASH_SIZE]> {
        // the materialized row below the node, and its slice covering it
        let base_level = (height / TILE_HEIGHT) * TILE_HEIGHT;
        let rel = height - base_level;
        let first = index << rel;
        let count = 1usize << rel;

        let tile_level = base_level / TILE_HEIGHT;
        let tile_index = first / TILE_WIDTH;
        let offset = (first % TILE_WIDTH) as usize;

        let tile = self.tile(tile_level, tile_index).await?;
        if tile.len() < offset + count {
            return Err(Error::Parse(format!(
                "tile {}/{} too narrow: {} hashes, need {}",
                tile_level,
                tile_index,
                tile.len(),
                offset + count
            )));
        }

        let mut row = tile[offset..offset + count].to_vec();
        while row.len() > 1 {
            row = row
                .chunks(2)
                .map(|pair| hash_children(&pair[0], &pair[1]))
                .collect();
        }

        Ok(row[0])
    }

    /// Fetch a tile, consulting the cache first
    async fn tile(&mut self, level: u64, index: u64) -> Result<Vec<[u8; HASH_SIZE]>> {
        if let Some(tile) = self.tiles.get(&(level, index)) {
            return Ok(tile.clone());
        }

        // complete nodes available at the tile's base row
        let base_nodes = self
            .tree_size
            .checked_shr((level * TILE_HEIGHT) as u32)
            .unwrap_or(0);
        let available = base_nodes.saturating_sub(index * TILE_WIDTH);
        if available == 0 {
            return Err(Error::Parse(format!(
                "tile {}/{} beyond tree size {}",
                level, index, self.tree_size
            )));
        }

        let width = if available >= TILE_WIDTH {
            None
        } else {
            Some(available)
        };
        let data = self.fetcher.read_tile(level, index, width).await?;

        if data.len() % HASH_SIZE != 0 {
            return Err(Error::Parse(format!(
                "tile {}/{} has truncated data ({} bytes)",
                level,
                index,
                data.len()
            )));
        }
        let tile: Vec<[u8; HASH_SIZE]> = data
            .chunks_exact(HASH_SIZE)
            .map(|chunk| {
                let mut hash = [0u8; HASH_SIZE];
                hash.copy_from_slice(chunk);
                hash
            })
            .collect();

        let expected = available.min(TILE_WIDTH) as usize;
        if tile.len() < expected {
            return Err(Error::Parse(format!(
                "tile {}/{} has {} hashes, expected {}",
                level,
                index,
                tile.len(),
                expected
            )));
        }

        self.tiles.insert((level, index), tile.clone());
        Ok(tile)
    }
}
