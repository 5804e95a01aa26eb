//! Weighted edit distance between CTPH signature strings.
//!
//! Insertions and deletions cost 1, substitutions cost 2: replacing a
//! symbol is treated as more different than shifting one in or out, which
//! matches how chunk symbols drift when content is inserted or removed.

const INSERT_COST: u32 = 1;
const DELETE_COST: u32 = 1;
const REPLACE_COST: u32 = 2;

/// Weighted edit distance between two byte strings.
///
/// Two-row dynamic program; O(len1 × len2) time, O(len2) space. The
/// distance from any string to the empty string is that string's length.
pub fn edit_distance(s1: &[u8], s2: &[u8]) -> u32 {
    if s1.is_empty() {
        return s2.len() as u32 * INSERT_COST;
    }
    if s2.is_empty() {
        return s1.len() as u32 * DELETE_COST;
    }

    let mut prev: Vec<u32> = (0..=s2.len() as u32).map(|j| j * INSERT_COST).collect();
    let mut curr: Vec<u32> = vec![0; s2.len() + 1];

    for (i, &c1) in s1.iter().enumerate() {
        curr[0] = (i as u32 + 1) * DELETE_COST;
        for (j, &c2) in s2.iter().enumerate() {
            let subst = prev[j] + if c1 == c2 { 0 } else { REPLACE_COST };
            let insert = curr[j] + INSERT_COST;
            let delete = prev[j + 1] + DELETE_COST;
            curr[j + 1] = subst.min(insert).min(delete);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[s2.len()]
}
