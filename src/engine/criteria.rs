//! Stop criteria evaluation over decoded text and token IDs.
//!
//! Checks run in a fixed priority order and the first one that applies wins:
//! 1. Full text match (earliest position, then first configured)
//! 2. Partial token match
//! 3. Partial text match
//!
//! Token sequences are checked before text because some stop strings (e.g.
//! multi-token emoji) are invisible at the text level until complete.

use super::matcher::sequence_overlap;
use super::stop_processor::StopSpec;

/// Outcome of evaluating the stop criteria once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCriteria {
    /// Stop string `index` (into the `StopSpec`) starts at byte `position`.
    FullStop { index: usize, position: usize },
    /// A stop string may be forming; more tokens are needed.
    PartialMatch,
    NoMatch,
}

/// Evaluate `text` (the decoding of `token_ids`) against every stop string.
pub fn stopping_criteria(text: &str, token_ids: &[u32], spec: &StopSpec) -> StopCriteria {
    if let Some(full) = check_full_text_match(text, spec) {
        return full;
    }
    if check_partial_token_match(token_ids, spec) {
        return StopCriteria::PartialMatch;
    }
    if check_partial_text_match(text, spec) {
        return StopCriteria::PartialMatch;
    }
    StopCriteria::NoMatch
}

/// Earliest occurrence of any stop string; ties keep the first configured.
fn check_full_text_match(text: &str, spec: &StopSpec) -> Option<StopCriteria> {
    let mut earliest: Option<(usize, usize)> = None;
    for (index, stop) in spec.iter().enumerate() {
        if let Some(position) = text.find(stop.text.as_str()) {
            if earliest.map_or(true, |(_, best)| position < best) {
                earliest = Some((index, position));
            }
        }
    }
    earliest.map(|(index, position)| StopCriteria::FullStop { index, position })
}

fn check_partial_token_match(token_ids: &[u32], spec: &StopSpec) -> bool {
    spec.iter()
        .any(|stop| sequence_overlap(token_ids, &stop.tokens))
}

// UTF-8 is self-synchronizing, so a byte-level overlap can only begin on a
// character boundary of both strings.
fn check_partial_text_match(text: &str, spec: &StopSpec) -> bool {
    spec.iter()
        .any(|stop| sequence_overlap(text.as_bytes(), stop.text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stop_processor::StopString;

    fn spec(entries: &[(&str, &[u32])]) -> StopSpec {
        StopSpec::from_entries(
            entries
                .iter()
                .map(|(text, tokens)| StopString {
                    text: text.to_string(),
                    tokens: tokens.to_vec(),
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn full_match_reports_position() {
        let spec = spec(&[("END", &[1, 2])]);
        assert_eq!(
            stopping_criteria("done END now", &[9], &spec),
            StopCriteria::FullStop { index: 0, position: 5 }
        );
    }

    #[test]
    fn earliest_full_match_wins_over_configuration_order() {
        let spec = spec(&[("world", &[1]), ("hello", &[2])]);
        assert_eq!(
            stopping_criteria("hello world", &[], &spec),
            StopCriteria::FullStop { index: 1, position: 0 }
        );
    }

    #[test]
    fn tie_on_position_goes_to_first_configured() {
        let spec = spec(&[("ab", &[1]), ("abc", &[2])]);
        assert_eq!(
            stopping_criteria("xabc", &[], &spec),
            StopCriteria::FullStop { index: 0, position: 1 }
        );
    }

    #[test]
    fn full_match_preempts_partial_token_match() {
        let spec = spec(&[("!", &[4]), ("🌟", &[7, 8, 9])]);
        assert!(matches!(
            stopping_criteria("hi!", &[3, 4, 7], &spec),
            StopCriteria::FullStop { index: 0, .. }
        ));
    }

    #[test]
    fn partial_token_match_without_text_overlap() {
        let spec = spec(&[("🌟", &[7, 8, 9])]);
        assert_eq!(
            stopping_criteria("\u{FFFD}", &[7, 8], &spec),
            StopCriteria::PartialMatch
        );
    }

    #[test]
    fn partial_text_match_without_token_overlap() {
        let spec = spec(&[("</s>", &[50])]);
        assert_eq!(stopping_criteria("foo </", &[11, 12], &spec), StopCriteria::PartialMatch);
    }

    #[test]
    fn unrelated_input_is_no_match() {
        let spec = spec(&[("</s>", &[50]), ("🌟", &[7, 8, 9])]);
        assert_eq!(stopping_criteria("plain", &[7, 8, 5], &spec), StopCriteria::NoMatch);
    }

    #[test]
    fn empty_spec_is_no_match() {
        let spec = StopSpec::default();
        assert_eq!(stopping_criteria("anything", &[1, 2], &spec), StopCriteria::NoMatch);
    }
}
