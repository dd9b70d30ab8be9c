//! Inclusion-proof verification as specified in RFC 6962
//!
//! The algorithm chains the leaf hash towards the root, picking the hashing
//! order from the leaf position within the (possibly incomplete) tree.

use crate::error::{Error, Result};
use crate::tree::{hash_children, HASH_SIZE};

/// Compute the root implied by an inclusion proof
///
/// `leaf_index` is 0-based; `path` holds the sibling hashes from the leaf
/// towards the root. Fails when the index is out of range or the path length
/// does not fit the tree shape.
pub fn root_from_inclusion_proof(
    leaf_hash: &[u8; HASH_SIZE],
    leaf_index: u64,
    tree_size: u64,
    path: &[[u8; HASH_SIZE]],
) -> Result<[u8; HASH_SIZE]> {
    if tree_size == 0 {
        return Err(Error::InvalidProof("tree size cannot be zero".to_string()));
    }
    if leaf_index >= tree_size {
        return Err(Error::InvalidProof(format!(
            "leaf index {} >= tree size {}",
            leaf_index, tree_size
        )));
    }

    let mut hash = *leaf_hash;
    let mut index = leaf_index;
    let mut last_node = tree_size - 1;
    let mut path = path.iter();

    while last_node > 0 {
        // A right child, and the rightmost node of an incomplete level,
        // take their sibling on the left.
        if index % 2 == 1 || index < last_node {
            let sibling = path.next().ok_or_else(|| {
                Error::InvalidProof("inclusion path too short".to_string())
            })?;
            if index % 2 == 1 {
                hash = hash_children(sibling, &hash);
            } else {
                hash = hash_children(&hash, sibling);
            }
        }
        index /= 2;
        last_node /= 2;
    }

    if path.next().is_some() {
        return Err(Error::InvalidProof("inclusion path too long".to_string()));
    }

    Ok(hash)
}

/// Verify an inclusion proof against an expected root
pub fn verify_inclusion_proof(
    leaf_hash: &[u8; HASH_SIZE],
    leaf_index: u64,
    tree_size: u64,
    path: &[[u8; HASH_SIZE]],
    expected_root: &[u8; HASH_SIZE],
) -> Result<()> {
    let computed = root_from_inclusion_proof(leaf_hash, leaf_index, tree_size, path)?;

    if computed != *expected_root {
        return Err(Error::RootMismatch {
            expected: hex::encode(expected_root),
            computed: hex::encode(computed),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::hash_leaf;

    #[test]
    fn test_single_leaf_tree() {
        let leaf = hash_leaf(b"only leaf");
        assert!(verify_inclusion_proof(&leaf, 0, 1, &[], &leaf).is_ok());
    }

    #[test]
    fn test_two_leaf_tree() {
        let hash0 = hash_leaf(b"leaf 0");
        let hash1 = hash_leaf(b"leaf 1");
        let root = hash_children(&hash0, &hash1);

        assert!(verify_inclusion_proof(&hash0, 0, 2, &[hash1], &root).is_ok());
        assert!(verify_inclusion_proof(&hash1, 1, 2, &[hash0], &root).is_ok());
    }

    #[test]
    fn test_incomplete_tree() {
        // three leaves: root = H(H(l0, l1), l2)
        let l0 = hash_leaf(b"a");
        let l1 = hash_leaf(b"b");
        let l2 = hash_leaf(b"c");
        let h01 = hash_children(&l0, &l1);
        let root = hash_children(&h01, &l2);

        assert!(verify_inclusion_proof(&l0, 0, 3, &[l1, l2], &root).is_ok());
        assert!(verify_inclusion_proof(&l2, 2, 3, &[h01], &root).is_ok());
    }

    #[test]
    fn test_index_out_of_range() {
        let leaf = hash_leaf(b"x");
        assert!(verify_inclusion_proof(&leaf, 1, 1, &[], &leaf).is_err());
        assert!(verify_inclusion_proof(&leaf, 0, 0, &[], &leaf).is_err());
    }

    #[test]
    fn test_path_length_mismatch() {
        let l0 = hash_leaf(b"a");
        let l1 = hash_leaf(b"b");
        let root = hash_children(&l0, &l1);

        // too short
        assert!(verify_inclusion_proof(&l0, 0, 2, &[], &root).is_err());
        // too long
        assert!(verify_inclusion_proof(&l0, 0, 2, &[l1, l1], &root).is_err());
    }
}
