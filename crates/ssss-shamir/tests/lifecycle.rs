//! End-to-end share lifecycle tests.
//!
//! Covers:
//! 1. Split/combine round trips in text, hex and byte modes
//! 2. Subset independence and ignored extra shares
//! 3. Resplit, extend and regenerate against the original batch
//! 4. Deterministic splitting from caller-supplied entropy

use ssss_shamir::{
    combine, combine_to_bytes, extend, parse_share, regenerate, resplit, split, split_bytes,
    SecretEncoding, ShamirConfig, ShamirError, SplitOptions,
};

fn text_shares(secret: &str, threshold: usize, number_of_keys: usize) -> Vec<String> {
    let config = ShamirConfig::new(threshold, number_of_keys);
    split(secret, &config, &SplitOptions::default())
        .unwrap()
        .shares
}

/// Every `k`-element subset of `0..n`, in lexicographic order
fn subsets(n: usize, k: usize) -> Vec<Vec<usize>> {
    fn walk(
        start: usize,
        n: usize,
        k: usize,
        current: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            walk(i + 1, n, k, current, out);
            current.pop();
        }
    }
    let mut out = Vec::new();
    walk(0, n, k, &mut Vec::new(), &mut out);
    out
}

// ============================================================================
// 1. Round Trips
// ============================================================================

#[test]
fn test_prefixed_text_round_trip() {
    let config = ShamirConfig::new(4, 6).with_prefix("tkn");
    let output = split("abcdefgh", &config, &SplitOptions::default()).unwrap();

    assert_eq!(output.shares.len(), 6);
    for (i, share) in output.shares.iter().enumerate() {
        let parsed = parse_share(share).unwrap();
        assert_eq!(parsed.prefix.as_deref(), Some("tkn"));
        assert_eq!(parsed.index, i as u64 + 1);
        assert_eq!(parsed.value.len(), 16, "64-bit field: 16 hex digits");
    }

    let recovered = combine(&output.shares[0..4], 4, SecretEncoding::Text).unwrap();
    assert_eq!(recovered.as_str(), "abcdefgh");
}

#[test]
fn test_hex_round_trip_any_three() {
    let config = ShamirConfig::new(3, 6).with_encoding(SecretEncoding::Hex);
    let output = split("7bcd123411223344", &config, &SplitOptions::default()).unwrap();

    for subset in subsets(6, 3) {
        let shares: Vec<&str> = subset.iter().map(|&i| output.shares[i].as_str()).collect();
        let recovered = combine(&shares, 3, SecretEncoding::Hex).unwrap();
        assert_eq!(recovered.as_str(), "7bcd123411223344", "subset {:?}", subset);
    }
}

#[test]
fn test_round_trip_across_field_sizes() {
    for len in [1usize, 2, 7, 8, 9, 15, 16, 31, 33, 64, 100, 128] {
        let secret: String = (0..len).map(|i| (b'!' + (i % 90) as u8) as char).collect();
        let shares = text_shares(&secret, 3, 4);
        let recovered = combine(&shares[1..4], 3, SecretEncoding::Text).unwrap();
        assert_eq!(recovered.as_str(), secret, "{} byte secret", len);
    }
}

#[test]
fn test_byte_round_trip_keeps_leading_zeros() {
    let secret = [0u8, 0, 0, 0x01, 0x80, 0xff, 0x00, 0x7f, 0x10, 0x00];
    let config = ShamirConfig::three_of_five();
    let output = split_bytes(&secret, &config, &SplitOptions::default()).unwrap();
    let recovered = combine_to_bytes(&output.shares[2..5], 3).unwrap();
    assert_eq!(recovered.as_slice(), &secret);
}

#[test]
fn test_unicode_secret_round_trip() {
    // Non-ASCII text only warns
    let shares = text_shares("clé secrète", 2, 3);
    let recovered = combine(&shares[..2], 2, SecretEncoding::Text).unwrap();
    assert_eq!(recovered.as_str(), "clé secrète");
}

// ============================================================================
// 2. Subset Independence
// ============================================================================

#[test]
fn test_subset_independence() {
    let shares = text_shares("subset independence", 3, 5);
    let mut recovered: Vec<String> = subsets(5, 3)
        .into_iter()
        .map(|subset| {
            let chosen: Vec<&String> = subset.iter().map(|&i| &shares[i]).collect();
            combine(&chosen, 3, SecretEncoding::Text).unwrap().to_string()
        })
        .collect();
    recovered.dedup();
    assert_eq!(recovered, vec!["subset independence".to_string()]);
}

#[test]
fn test_extra_shares_are_ignored() {
    let shares = text_shares("abcdefgh", 2, 4);
    let mut input = shares[..2].to_vec();
    // Neither a foreign share nor garbage past the threshold is looked at
    input.push("99-ffffffffffffffff".to_string());
    input.push("not a share".to_string());

    let recovered = combine(&input, 2, SecretEncoding::Text).unwrap();
    assert_eq!(recovered.as_str(), "abcdefgh");
}

#[test]
fn test_fewer_than_threshold_shares() {
    let shares = text_shares("abcdefgh", 3, 5);
    assert_eq!(
        combine(&shares[..2], 3, SecretEncoding::Text).unwrap_err(),
        ShamirError::InsufficientShares { needed: 3, got: 2 }
    );
}

#[test]
fn test_wrong_threshold_gives_wrong_secret() {
    // Two shares of a 3-of-5 split fit a lower-degree polynomial that is
    // not the original one
    let shares = text_shares("abcdefgh", 3, 5);
    let recovered = combine(&shares[..2], 2, SecretEncoding::Hex).unwrap();
    let expected = combine(&shares[..3], 3, SecretEncoding::Hex).unwrap();
    assert_ne!(recovered.as_str(), expected.as_str());
}

#[test]
fn test_duplicate_index_is_singular() {
    let shares = text_shares("abcdefgh", 3, 5);
    let input = [&shares[0], &shares[3], &shares[0]];
    assert_eq!(
        combine(&input, 3, SecretEncoding::Text).unwrap_err(),
        ShamirError::SingularSystem
    );
}

// ============================================================================
// 3. Resplit / Extend / Regenerate
// ============================================================================

#[test]
fn test_resplit_preserves_secret() {
    let shares = text_shares("resplit me", 3, 4);
    let config = ShamirConfig::new(3, 8).with_prefix("v2");
    let fresh = resplit(&shares[..3], &config).unwrap();
    assert_eq!(fresh.len(), 8);

    let recovered = combine(&fresh[..3], 3, SecretEncoding::Text).unwrap();
    assert_eq!(recovered.as_str(), "resplit me");

    // Old and new shares lie on the same polynomial
    let mixed = [fresh[7].as_str(), shares[3].as_str(), fresh[0].as_str()];
    let recovered = combine(&mixed, 3, SecretEncoding::Text).unwrap();
    assert_eq!(recovered.as_str(), "resplit me");
}

#[test]
fn test_resplit_rejects_small_batches() {
    let shares = text_shares("abcdefgh", 3, 4);
    let err = resplit(&shares, &ShamirConfig::new(3, 3)).unwrap_err();
    assert!(matches!(err, ShamirError::InvalidParams(_)));
    assert!(err.to_string().contains("numberOfKeys must be greater than threshold"));
}

#[test]
fn test_regenerate_reproduces_every_share() {
    let config = ShamirConfig::new(4, 10).with_prefix("tkn");
    let output = split("regenerate", &config, &SplitOptions::default()).unwrap();

    for subset in [[0usize, 1, 2, 3], [9, 7, 5, 3], [2, 4, 6, 8]] {
        let chosen: Vec<&String> = subset.iter().map(|&i| &output.shares[i]).collect();
        for (i, original) in output.shares.iter().enumerate() {
            let again = regenerate(&chosen, 4, i as u64 + 1, Some("tkn")).unwrap();
            assert_eq!(&again, original);
        }
    }
}

#[test]
fn test_extend_after_loss() {
    let config = ShamirConfig::new(2, 4).with_prefix("team");
    let output = split("abcdefgh", &config, &SplitOptions::default()).unwrap();

    // Share 1 was lost
    let remaining = &output.shares[1..];
    let replacement = extend(remaining, 2, Some("team")).unwrap();
    assert_eq!(replacement, output.shares[0]);

    // With no gap the next index is appended
    let next = extend(&output.shares, 2, Some("team")).unwrap();
    assert!(next.starts_with("team-5-"));
    let pair = [next.as_str(), output.shares[2].as_str()];
    assert_eq!(
        combine(&pair, 2, SecretEncoding::Text).unwrap().as_str(),
        "abcdefgh"
    );
}

// ============================================================================
// 4. Deterministic Splitting
// ============================================================================

#[test]
fn test_custom_entropy_is_deterministic() {
    let config = ShamirConfig::new(3, 6).with_encoding(SecretEncoding::Hex);
    let options = SplitOptions::with_entropy("0123456789abcdeffedcba9876543210");

    let first = split("7bcd123411223344", &config, &options).unwrap();
    let second = split("7bcd123411223344", &config, &options).unwrap();
    assert_eq!(first.shares, second.shares);
    assert_eq!(
        first.shares,
        vec![
            "1-7c66849cf939204e",
            "2-7aad1bcdccc18c0b",
            "3-8552e432333e73f3",
            "4-6adfc77a452ac9d5",
            "5-95203885bad5363f",
            "6-93eba7d48f2d9a5e",
        ]
    );
}

#[test]
fn test_known_shares_combine() {
    let shares = [
        "tkn-4-faf3799bd2ec1b1d",
        "tkn-2-5169b463b5ba1a85",
        "tkn-1-fba5d26286efe520",
    ];
    let recovered = combine(&shares, 3, SecretEncoding::Text).unwrap();
    assert_eq!(recovered.as_str(), "abcdefgh");
}

#[test]
fn test_random_splits_differ() {
    let a = text_shares("abcdefgh", 2, 3);
    let b = text_shares("abcdefgh", 2, 3);
    assert_ne!(a, b, "coefficients must come from the CSPRNG");
}
