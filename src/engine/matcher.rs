//! Suffix/prefix overlap between two sequences.
//!
//! Shared by character-level and token-level partial stop matching.

/// Returns true iff some non-empty suffix of `a` equals the prefix of `b`
/// of the same length.
pub fn sequence_overlap<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    let max_overlap = a.len().min(b.len());
    (1..=max_overlap).any(|len| a[a.len() - len..] == b[..len])
}
