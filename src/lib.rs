// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Cryptographic core of a verifiable homomorphic election.
//!
//! ```
//! use homomorphic_vote::{CryptoParams, Plaintext};
//! use num_bigint::BigUint;
//!
//! let params = CryptoParams::new(
//!     BigUint::from(23_u32),
//!     BigUint::from(11_u32),
//!     BigUint::from(4_u32),
//! )
//! .unwrap();
//! let keypair = params.generate_keypair();
//! let ciphertext = keypair.pk.encrypt(&Plaintext::new(BigUint::from(16_u32)));
//! let plaintext = keypair.sk.decrypt(&ciphertext, false).unwrap();
//! assert_eq!(plaintext.m, BigUint::from(16_u32));
//! ```

pub mod ballot;
pub mod challenge;
pub mod disjunctive;
pub mod dleq;
pub mod elgamal;
pub mod error;
pub mod params;
pub mod polynomial;
pub mod schnorr;
pub mod serialize;
pub mod sharebox;
pub mod signature;
pub mod tally;
pub mod threshold;
pub mod util;

pub use ballot::{CastVote, Election, EncryptedAnswer, EncryptedVote, Question};
pub use challenge::{ChallengeGenerator, ProofContext, ProofScheme};
pub use disjunctive::ZKDisjunctiveProof;
pub use dleq::ZKProof;
pub use elgamal::{Ciphertext, KeyPair, Plaintext, PublicKey, SecretKey};
pub use error::{Error, Result};
pub use params::CryptoParams;
pub use schnorr::DLogProof;
pub use sharebox::{Share, SignedEncryptedShare};
pub use signature::Signature;
pub use tally::{DLogTable, Tally, TrusteeDecryption};
pub use threshold::{SharingRound, SharingState, ThresholdScheme, Trustee};
