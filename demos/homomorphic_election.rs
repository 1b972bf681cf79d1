// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

use homomorphic_vote::{
    CastVote, CryptoParams, Election, EncryptedVote, ProofScheme, Question, SecretKey,
    SignedEncryptedShare, Tally, ThresholdScheme, Trustee,
};
use num_bigint::BigUint;

fn main() {
    let params = CryptoParams::rfc3526();
    params.check_strength().unwrap();

    // Three trustees, any two of them can decrypt.
    let dealer = params.generate_keypair();
    let keypairs: Vec<_> = (0..3).map(|_| params.generate_keypair()).collect();
    let trustees: Vec<Trustee> = keypairs
        .iter()
        .enumerate()
        .map(|(i, keypair)| Trustee::new(BigUint::from(i + 1), keypair.pk.clone()))
        .collect();
    let scheme = ThresholdScheme::new(3, 2, &params).unwrap();

    let election_secret = SecretKey::from_exponent(&params, params.random_exponent());
    let shares = scheme
        .share_verifiably(&election_secret.x, &params.random_exponent(), &params, &trustees)
        .unwrap();
    let election_key = election_secret.public_key.clone();
    // Only the shares survive the key ceremony.
    drop(election_secret);

    // The dealer seals every share for its trustee, each trustee opens its own.
    let key_shares: Vec<SecretKey> = shares
        .iter()
        .zip(trustees.iter().zip(keypairs.iter()))
        .map(|(share, (trustee, keypair))| {
            let sealed =
                SignedEncryptedShare::seal(share, &trustee.public_key, &dealer.sk).unwrap();
            sealed
                .open(&keypair.sk, &dealer.pk, &scheme, &params)
                .unwrap()
                .key_share(&params)
        })
        .collect();

    let election = Election {
        uuid: "1e9f6c52-8a3d-4f0b-b7e2-94d1c0a6f3e8".to_string(),
        election_hash: "demo-election".to_string(),
        public_key: election_key.clone(),
        questions: vec![Question {
            answers: vec!["Rust".to_string(), "Zig".to_string(), "C".to_string()],
            min: 0,
            max: Some(1),
        }],
        datatype: ProofScheme::ContextBound,
    };

    let selections = [0_usize, 0, 2, 0, 1];
    let votes: Vec<CastVote> = selections
        .iter()
        .enumerate()
        .map(|(i, &selection)| {
            let alias = format!("voter-{}", i);
            let vote = EncryptedVote::from_election_and_answers(
                &election,
                &[vec![selection]],
                Some(&alias),
            )
            .unwrap()
            .without_audit_data();
            CastVote::new(vote, Some(&alias))
        })
        .collect();

    let mut tally = Tally::new(&election);
    tally.add_vote_batch(&election, &votes, true).unwrap();

    // Trustees 1 and 3 decrypt; trustee 2 is unavailable.
    let partials: Vec<(BigUint, Vec<Vec<BigUint>>)> = [0_usize, 2]
        .iter()
        .map(|&i| {
            let decryption = tally.decryption_factors_and_proofs(&election, &key_shares[i]);
            tally
                .verify_decryption_proofs(&election, &decryption, &key_shares[i].public_key)
                .unwrap();
            (trustees[i].trustee_index.clone(), decryption.decryption_factors)
        })
        .collect();

    let counts = tally
        .decrypt_from_threshold_factors(&partials, &scheme, &election_key)
        .unwrap();
    for (answer, count) in election.questions[0].answers.iter().zip(counts[0].iter()) {
        println!("{}: {}", answer, count);
    }
    assert_eq!(counts, vec![vec![3, 1, 1]]);
}
