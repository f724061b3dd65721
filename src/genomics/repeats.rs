/// Length of the shortest unit that tiles `bases` exactly.
///
/// The sequence length must be a multiple of the unit; an aperiodic
/// sequence returns its own length and an empty one returns 1.
pub fn find_repeated_substring(bases: &[u8]) -> usize {
    if bases.is_empty() {
        return 1;
    }
    (1..=bases.len())
        .find(|&unit_len| {
            bases.len() % unit_len == 0
                && bases
                    .chunks(unit_len)
                    .all(|chunk| chunk == &bases[..unit_len])
        })
        .unwrap_or(bases.len())
}

/// Consecutive copies of `unit` at the start of `bases`.
pub fn find_number_of_repetitions(unit: &[u8], bases: &[u8]) -> usize {
    if unit.is_empty() {
        return 0;
    }
    bases
        .chunks_exact(unit.len())
        .take_while(|chunk| *chunk == unit)
        .count()
}

/// Whether the bases `longer` has beyond `shorter` repeat at least
/// `min_matches` times at the start of `context`.
pub fn bases_are_repeated(longer: &[u8], shorter: &[u8], context: &[u8], min_matches: usize) -> bool {
    let Some(unit) = longer.get(shorter.len()..) else {
        return false;
    };
    if unit.is_empty() {
        return false;
    }
    (0..min_matches).all(|i| {
        let start = i * unit.len();
        context.get(start..start + unit.len()) == Some(unit)
    })
}

/// Longest run of `base` immediately left or right of `index` in `window`.
pub fn homopolymer_run(window: &[u8], index: usize, base: u8) -> usize {
    let base = base.to_ascii_uppercase();
    let matches = |b: &&u8| b.to_ascii_uppercase() == base;
    let left = window
        .get(..index)
        .map_or(0, |before| before.iter().rev().take_while(matches).count());
    let right = window
        .get(index + 1..)
        .map_or(0, |after| after.iter().take_while(matches).count());
    left.max(right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(b"", 1 ; "empty")]
    #[test_case(b"AAAA", 1 ; "homopolymer")]
    #[test_case(b"CACACA", 2 ; "dinucleotide")]
    #[test_case(b"CAC", 3 ; "not divisible")]
    #[test_case(b"ACGTACGA", 8 ; "aperiodic")]
    fn repeated_substring(bases: &[u8], expected: usize) {
        assert_eq!(find_repeated_substring(bases), expected);
    }

    #[test]
    fn counts_leading_repetitions() {
        assert_eq!(find_number_of_repetitions(b"CA", b"CACACAG"), 3);
        assert_eq!(find_number_of_repetitions(b"CA", b"CAC"), 1);
        assert_eq!(find_number_of_repetitions(b"CA", b"GCA"), 0);
        assert_eq!(find_number_of_repetitions(b"", b"CACA"), 0);
    }

    #[test]
    fn repeated_bases_against_context() {
        assert!(bases_are_repeated(b"ACA", b"A", b"CACACAG", 2));
        assert!(!bases_are_repeated(b"ACA", b"A", b"CAGGG", 2));
        assert!(!bases_are_repeated(b"A", b"A", b"AAAA", 1));
    }

    #[test]
    fn homopolymer_runs_either_side() {
        // index 3 is the site; three Ts to its right, one to its left
        assert_eq!(homopolymer_run(b"GATCTTTA", 3, b'T'), 3);
        assert_eq!(homopolymer_run(b"GATCTTTA", 3, b'G'), 0);
        assert_eq!(homopolymer_run(b"AAAG", 3, b'a'), 3);
    }
}
