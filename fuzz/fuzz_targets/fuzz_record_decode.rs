#![no_main]

use libfuzzer_sys::fuzz_target;

use agora_types::{Proposal, Tally, VoteRecord};

// Stored records come back from disk as bincode; decoding garbage must fail
// cleanly, and anything that does decode must re-encode to the same bytes.
fuzz_target!(|data: &[u8]| {
    if let Ok(proposal) = bincode::deserialize::<Proposal>(data) {
        let encoded = bincode::serialize(&proposal).expect("decoded proposal re-encodes");
        let again: Proposal = bincode::deserialize(&encoded).expect("re-encoded proposal decodes");
        assert_eq!(again, proposal);
    }

    if let Ok(record) = bincode::deserialize::<VoteRecord>(data) {
        let encoded = bincode::serialize(&record).expect("decoded vote re-encodes");
        assert_eq!(&encoded[..], &data[..encoded.len()]);
    }

    if let Ok(tally) = bincode::deserialize::<Tally>(data) {
        let encoded = bincode::serialize(&tally).expect("decoded tally re-encodes");
        assert_eq!(&encoded[..], &data[..encoded.len()]);
    }
});
