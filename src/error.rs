// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

use num_bigint::BigUint;
use thiserror::Error;

use crate::threshold::SharingState;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("homomorphic-vote: invalid cryptosystem parameters: {0}")]
    InvalidParameters(String),

    #[error("homomorphic-vote: keys do not share the same (p, q, g)")]
    IncompatibleKeys,

    #[error("homomorphic-vote: value has no modular inverse")]
    NotInvertible,

    #[error("homomorphic-vote: plaintext does not fit in the order-q subgroup")]
    PlaintextOutOfRange,

    #[error("homomorphic-vote: element is not in the order-q subgroup")]
    NotInSubgroup,

    #[error("homomorphic-vote: {selected} answers selected, at least {min} required")]
    TooFewAnswers { min: usize, selected: usize },

    #[error("homomorphic-vote: {selected} answers selected, at most {max} allowed")]
    TooManyAnswers { max: usize, selected: usize },

    #[error("homomorphic-vote: answer index {index} out of range for {answers} answers")]
    AnswerOutOfRange { index: usize, answers: usize },

    #[error("homomorphic-vote: invalid vote: {0}")]
    InvalidVote(String),

    #[error(
        "homomorphic-vote: bad decryption factor proof at question {question}, answer {answer}"
    )]
    InvalidDecryptionProof { question: usize, answer: usize },

    #[error("homomorphic-vote: malformed decryption factors: {0}")]
    MalformedFactors(String),

    #[error(
        "homomorphic-vote: no discrete log at question {question}, answer {answer} \
         within {num_tallied} tallied votes"
    )]
    DiscreteLogNotFound {
        question: usize,
        answer: usize,
        num_tallied: usize,
    },

    #[error("homomorphic-vote: threshold {k} is invalid for {n} trustees")]
    InvalidThreshold { k: usize, n: usize },

    #[error("homomorphic-vote: commitment exceeds p - 1")]
    CommitmentOutOfRange,

    #[error("homomorphic-vote: expected {expected} commitments, found {found}")]
    CommitmentCount { expected: usize, found: usize },

    #[error("homomorphic-vote: share for trustee {0} does not match the published commitments")]
    InvalidShare(BigUint),

    #[error("homomorphic-vote: shares belong to different trustee indices")]
    MismatchedShareIndex,

    #[error("homomorphic-vote: signature verification failed")]
    InvalidSignature,

    #[error("homomorphic-vote: sharing round cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: SharingState, to: SharingState },

    #[error("homomorphic-vote: duplicate trustee index {0}")]
    DuplicateIndex(BigUint),

    #[error("homomorphic-vote: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
