//! Allowlist inclusion proofs.
//!
//! Leaf = keccak256(account ‖ amount_le_u128). Each proof step hashes the
//! running node with the sibling, smaller value first, so proofs do not need to
//! carry left/right flags.

use ink::env::hash::{HashOutput, Keccak256};
use ink::primitives::AccountId;

use crate::errors::Error;
use crate::Balance;

pub type Node = [u8; 32];

/// The two roots the engine verifies against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct AllowlistRoots {
    pub og: Node,
    pub airdrop: Node,
}

fn keccak(input: &[u8]) -> Node {
    let mut out = <Keccak256 as HashOutput>::Type::default();
    ink::env::hash_bytes::<Keccak256>(input, &mut out);
    out
}

pub fn leaf(account: &AccountId, amount: Balance) -> Node {
    let mut buf = [0u8; 48];
    buf[..32].copy_from_slice(account.as_ref());
    buf[32..].copy_from_slice(&amount.to_le_bytes());
    keccak(&buf)
}

/// Commutative pair hash: the numerically smaller node goes first.
pub fn hash_pair(a: &Node, b: &Node) -> Node {
    let mut buf = [0u8; 64];
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    buf[..32].copy_from_slice(lo);
    buf[32..].copy_from_slice(hi);
    keccak(&buf)
}

pub fn verify(root: &Node, account: &AccountId, amount: Balance, proof: &[Node]) -> bool {
    let computed = proof
        .iter()
        .fold(leaf(account, amount), |node, sibling| hash_pair(&node, sibling));
    computed == *root
}

/// [`verify`] mapped onto the engine's error type.
pub fn ensure_included(
    root: &Node,
    account: &AccountId,
    amount: Balance,
    proof: &[Node],
) -> Result<(), Error> {
    if verify(root, account, amount, proof) {
        Ok(())
    } else {
        Err(Error::InvalidProof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(byte: u8) -> AccountId {
        AccountId::from([byte; 32])
    }

    /// Four-leaf tree; returns (root, leaves).
    fn tree() -> (Node, [Node; 4]) {
        let leaves = [
            leaf(&acct(1), 1_000),
            leaf(&acct(2), 2_000),
            leaf(&acct(3), 3_000),
            leaf(&acct(4), 4_000),
        ];
        let left = hash_pair(&leaves[0], &leaves[1]);
        let right = hash_pair(&leaves[2], &leaves[3]);
        (hash_pair(&left, &right), leaves)
    }

    #[test]
    fn every_leaf_verifies() {
        let (root, l) = tree();
        let right = hash_pair(&l[2], &l[3]);
        let left = hash_pair(&l[0], &l[1]);

        assert!(verify(&root, &acct(1), 1_000, &[l[1], right]));
        assert!(verify(&root, &acct(2), 2_000, &[l[0], right]));
        assert!(verify(&root, &acct(3), 3_000, &[l[3], left]));
        assert!(verify(&root, &acct(4), 4_000, &[l[2], left]));
    }

    #[test]
    fn wrong_amount_or_account_fails() {
        let (root, l) = tree();
        let right = hash_pair(&l[2], &l[3]);
        assert!(!verify(&root, &acct(1), 1_001, &[l[1], right]));
        assert!(!verify(&root, &acct(9), 1_000, &[l[1], right]));
        assert_eq!(
            ensure_included(&root, &acct(1), 999, &[l[1], right]),
            Err(Error::InvalidProof)
        );
    }

    #[test]
    fn pair_hash_is_order_independent() {
        let (_, l) = tree();
        assert_eq!(hash_pair(&l[0], &l[1]), hash_pair(&l[1], &l[0]));
    }

    #[test]
    fn single_leaf_tree_needs_empty_proof() {
        let root = leaf(&acct(7), 42);
        assert!(verify(&root, &acct(7), 42, &[]));
        assert!(!verify(&root, &acct(7), 43, &[]));
    }

    #[test]
    fn truncated_proof_fails() {
        let (root, l) = tree();
        assert!(!verify(&root, &acct(1), 1_000, &[l[1]]));
    }
}
