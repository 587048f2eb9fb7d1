//! Fuzz target for stop criteria evaluation.
//!
//! Tests that arbitrary text, token IDs and stop strings cannot cause
//! panics, and that a reported full stop points at a real occurrence.

#![no_main]

use arbitrary::Arbitrary;
use gg_stream::engine::{stopping_criteria, StopCriteria, StopSpec, StopString};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    text: String,
    token_ids: Vec<u32>,
    stops: Vec<(String, Vec<u32>)>,
}

fuzz_target!(|input: Input| {
    let entries = input
        .stops
        .into_iter()
        .map(|(text, tokens)| StopString { text, tokens })
        .collect();
    // Empty stop strings are rejected up front
    let Ok(spec) = StopSpec::from_entries(entries) else {
        return;
    };

    if let StopCriteria::FullStop { index, position } =
        stopping_criteria(&input.text, &input.token_ids, &spec)
    {
        let stop = spec.get(index).expect("index within spec");
        assert!(input.text[position..].starts_with(stop.text.as_str()));
        for (other, entry) in spec.iter().enumerate() {
            if let Some(found) = input.text.find(entry.text.as_str()) {
                assert!(found > position || (found == position && other >= index));
            }
        }
    }
});
