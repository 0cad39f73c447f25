// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property checks for digest normalization.

use pii_anchor_core::{normalize, AnchorError, DigestFault, DIGEST_BYTES};
use proptest::prelude::*;

fn hex_of(bytes: &[u8], upper: bool, prefixed: bool) -> String {
    let body = if upper {
        hex::encode_upper(bytes)
    } else {
        hex::encode(bytes)
    };
    if prefixed {
        format!("0x{body}")
    } else {
        body
    }
}

proptest! {
    #[test]
    fn normalized_form_is_a_fixed_point(
        bytes in proptest::collection::vec(any::<u8>(), 1..=DIGEST_BYTES),
        upper in any::<bool>(),
        prefixed in any::<bool>(),
    ) {
        let text = hex_of(&bytes, upper, prefixed);
        let once = normalize(&text).unwrap();
        let twice = normalize(&once.to_hex()).unwrap();
        prop_assert_eq!(once, twice);
        prop_assert_eq!(&once.as_bytes()[DIGEST_BYTES - bytes.len()..], bytes.as_slice());
        prop_assert!(once.as_bytes()[..DIGEST_BYTES - bytes.len()].iter().all(|b| *b == 0));
    }

    #[test]
    fn more_than_32_bytes_is_rejected(
        bytes in proptest::collection::vec(any::<u8>(), DIGEST_BYTES + 1..=DIGEST_BYTES * 2),
    ) {
        let text = hex_of(&bytes, false, true);
        let err = normalize(&text).unwrap_err();
        prop_assert_eq!(
            err,
            AnchorError::MalformedDigest {
                digest: text.clone(),
                fault: DigestFault::TooLong { bytes: bytes.len() },
            }
        );
    }

    #[test]
    fn distinct_canonical_digests_stay_distinct(
        a in proptest::array::uniform32(any::<u8>()),
        b in proptest::array::uniform32(any::<u8>()),
    ) {
        prop_assume!(a != b);
        let na = normalize(&hex::encode(a)).unwrap();
        let nb = normalize(&hex::encode(b)).unwrap();
        prop_assert_ne!(na, nb);
    }
}
