//! Property tests for the signed transaction encoding.

use proptest::prelude::*;

use tickcast_client::config::MAX_INPUT_SIZE;
use tickcast_client::crypto::{derive_subseed, signer, PublicKey, SubSeed};
use tickcast_client::identity::Identity;
use tickcast_client::transaction::{codec, sign_transaction, Transaction, TransactionBuilder};

const SEED: &str = "jvhbyzjinlyutyuhsweuxiwootqoevjqwqmdhjeohrytxjxidpbcfyg";

fn signed(subseed: &SubSeed, amount: i64, tick: u32, input_type: u16, input: Vec<u8>) -> Transaction {
    let source = signer::identity(subseed);
    let dest = Identity::from_public_key(&PublicKey::from_bytes([0x5A; 32]));
    let unsigned = TransactionBuilder::new(source.as_str(), dest.as_str())
        .amount(amount)
        .tick(tick)
        .input(input_type, input)
        .build()
        .unwrap();
    sign_transaction(unsigned, subseed).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decoded_transaction_is_identical_and_verifies(
        amount in 1i64..=i64::MAX,
        tick in any::<u32>(),
        input_type in any::<u16>(),
        input in proptest::collection::vec(any::<u8>(), 0..=MAX_INPUT_SIZE),
    ) {
        let subseed = derive_subseed(SEED).unwrap();
        let tx = signed(&subseed, amount, tick, input_type, input);

        let decoded = codec::decode_base64(&tx.to_base64()).unwrap();
        prop_assert!(decoded.verify_signature());
        prop_assert_eq!(decoded.id(), tx.id());
        prop_assert_eq!(decoded, tx);
    }

    #[test]
    fn truncated_encodings_are_rejected(
        input in proptest::collection::vec(any::<u8>(), 0..64),
        cut in 1usize..64,
    ) {
        let subseed = derive_subseed(SEED).unwrap();
        let bytes = signed(&subseed, 7, 1010, 1, input).encode();
        let keep = bytes.len().saturating_sub(cut);
        prop_assert!(codec::decode(&bytes[..keep]).is_err());
    }

    #[test]
    fn any_flipped_byte_changes_the_id_or_breaks_the_signature(
        position in 0usize..(80 + 64),
        mask in 1u8..=255,
    ) {
        let subseed = derive_subseed(SEED).unwrap();
        let tx = signed(&subseed, 7, 1010, 0, Vec::new());
        let mut bytes = tx.encode();
        bytes[position] ^= mask;

        // Flipping the input-size field changes the length and fails decode.
        if let Ok(tampered) = codec::decode(&bytes) {
            prop_assert_ne!(tampered.id(), tx.id());
            prop_assert!(!tampered.verify_signature());
        }
    }
}
