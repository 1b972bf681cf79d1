// Copyright 2020-2026 MathxH Chen.
//
// Code is licensed under MIT Apache Dual License

//! Encrypted ballots.
//!
//! Every answer of a question is encrypted as `g^0` or `g^1` and carries a
//! disjunctive proof that it is one of the two. When the question has a
//! maximum, the product of all answer ciphertexts (an encryption of
//! `g^selected`) carries an overall proof that `selected` lies in
//! `[min, max]`.

use log::debug;
use num_bigint::BigUint;
use num_traits::identities::Zero;
use serde::{Deserialize, Serialize};

use crate::challenge::{ChallengeGenerator, ProofContext, ProofScheme};
use crate::disjunctive::ZKDisjunctiveProof;
use crate::elgamal::{Ciphertext, Plaintext, PublicKey};
use crate::error::{Error, Result};
use crate::serialize::big_uint_vec_opt;
use crate::util::Util;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub answers: Vec<String>,
    #[serde(default)]
    pub min: usize,
    /// `None` for approval questions, which carry no overall proof.
    #[serde(default)]
    pub max: Option<usize>,
}

/// The parts of an election record the cryptographic core consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub uuid: String,
    pub election_hash: String,
    pub public_key: PublicKey,
    pub questions: Vec<Question>,
    #[serde(default)]
    pub datatype: ProofScheme,
}

impl Election {
    /// Context the proofs of `question_index` are bound to, or `None` when
    /// the election uses the legacy challenge.
    pub fn proof_context(
        &self,
        question_index: usize,
        voter_alias: Option<&str>,
    ) -> Option<ProofContext> {
        match self.datatype {
            ProofScheme::Legacy => None,
            ProofScheme::ContextBound => {
                Some(ProofContext::new(&self.election_hash, question_index).with_voter(voter_alias))
            }
        }
    }
}

fn challenge_generator(
    context: Option<&ProofContext>,
    answer_index: Option<usize>,
) -> ChallengeGenerator {
    match context {
        None => ChallengeGenerator::Legacy,
        Some(context) => {
            let mut context = context.clone();
            context.answer_index = answer_index;
            ProofScheme::ContextBound.generator(context)
        }
    }
}

/// One question's worth of an encrypted ballot.
///
/// `randomness` and `answer` are only present on a ballot that is going to
/// be audited instead of cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedAnswer {
    pub choices: Vec<Ciphertext>,
    pub individual_proofs: Vec<ZKDisjunctiveProof>,
    pub overall_proof: Option<ZKDisjunctiveProof>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "big_uint_vec_opt"
    )]
    pub randomness: Option<Vec<BigUint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Vec<usize>>,
}

impl EncryptedAnswer {
    /// `g^i` for every `i` in `[min, max]`.
    pub fn generate_plaintexts(pk: &PublicKey, min: usize, max: usize) -> Vec<Plaintext> {
        (min..=max)
            .map(|i| Plaintext::new(pk.g.modpow(&BigUint::from(i), &pk.p)))
            .collect()
    }

    /// Encrypt the selection `answer_indexes` for question `question_index`.
    pub fn from_election_and_answer(
        election: &Election,
        question_index: usize,
        answer_indexes: &[usize],
        voter_alias: Option<&str>,
    ) -> Result<EncryptedAnswer> {
        let question = election
            .questions
            .get(question_index)
            .ok_or_else(|| Error::InvalidVote(format!("no question {}", question_index)))?;
        let pk = &election.public_key;
        let num_answers = question.answers.len();
        if let Some(&index) = answer_indexes.iter().find(|&&index| index >= num_answers) {
            return Err(Error::AnswerOutOfRange {
                index,
                answers: num_answers,
            });
        }

        let selected: Vec<bool> = (0..num_answers).map(|i| answer_indexes.contains(&i)).collect();
        let num_selected = selected.iter().filter(|&&s| s).count();
        if num_selected < question.min {
            return Err(Error::TooFewAnswers {
                min: question.min,
                selected: num_selected,
            });
        }
        if let Some(max) = question.max {
            if num_selected > max {
                return Err(Error::TooManyAnswers {
                    max,
                    selected: num_selected,
                });
            }
        }

        let context = election.proof_context(question_index, voter_alias);
        let plaintexts = EncryptedAnswer::generate_plaintexts(pk, 0, 1);

        let mut choices = Vec::with_capacity(num_answers);
        let mut individual_proofs = Vec::with_capacity(num_answers);
        let mut randomness = Vec::with_capacity(num_answers);
        let mut homomorphic_sum = Ciphertext::identity();
        let mut randomness_sum = BigUint::zero();

        for (answer_index, &is_selected) in selected.iter().enumerate() {
            let plaintext_index = if is_selected { 1 } else { 0 };
            let r = Util::random_below(&pk.q);
            let choice = pk.encrypt_with_r(&plaintexts[plaintext_index], &r, false)?;
            let proof = choice.generate_disjunctive_encryption_proof(
                &plaintexts,
                plaintext_index,
                &r,
                pk,
                &challenge_generator(context.as_ref(), Some(answer_index)),
            )?;

            homomorphic_sum = homomorphic_sum.multiply(&choice, pk);
            randomness_sum = (randomness_sum + &r) % &pk.q;
            choices.push(choice);
            individual_proofs.push(proof);
            randomness.push(r);
        }

        let overall_proof = match question.max {
            Some(max) => {
                let overall_plaintexts =
                    EncryptedAnswer::generate_plaintexts(pk, question.min, max);
                Some(homomorphic_sum.generate_disjunctive_encryption_proof(
                    &overall_plaintexts,
                    num_selected - question.min,
                    &randomness_sum,
                    pk,
                    &challenge_generator(context.as_ref(), None),
                )?)
            }
            None => None,
        };

        Ok(EncryptedAnswer {
            choices,
            individual_proofs,
            overall_proof,
            randomness: Some(randomness),
            answer: Some(answer_indexes.to_vec()),
        })
    }

    /// Check every individual proof, then the overall proof when `max` is
    /// set. `context` selects the context-bound challenge; `None` verifies
    /// with the legacy one.
    pub fn verify(
        &self,
        pk: &PublicKey,
        min: usize,
        max: Option<usize>,
        context: Option<&ProofContext>,
    ) -> bool {
        if self.choices.len() != self.individual_proofs.len() {
            debug!(
                "{} choices but {} individual proofs",
                self.choices.len(),
                self.individual_proofs.len()
            );
            return false;
        }

        let plaintexts = EncryptedAnswer::generate_plaintexts(pk, 0, 1);
        let mut homomorphic_sum = Ciphertext::identity();
        for (answer_index, (choice, proof)) in self
            .choices
            .iter()
            .zip(self.individual_proofs.iter())
            .enumerate()
        {
            if !choice.check_group_membership(pk) {
                debug!("choice {} is not in the subgroup", answer_index);
                return false;
            }
            let generator = challenge_generator(context, Some(answer_index));
            if !choice.verify_disjunctive_encryption_proof(&plaintexts, proof, pk, &generator) {
                debug!("bad individual proof for answer {}", answer_index);
                return false;
            }
            homomorphic_sum = homomorphic_sum.multiply(choice, pk);
        }

        let max = match max {
            Some(max) => max,
            None => return true,
        };
        if min > max {
            debug!("min {} exceeds max {}", min, max);
            return false;
        }
        let overall_proof = match &self.overall_proof {
            Some(proof) => proof,
            None => {
                debug!("missing overall proof");
                return false;
            }
        };
        let overall_plaintexts = EncryptedAnswer::generate_plaintexts(pk, min, max);
        let generator = challenge_generator(context, None);
        if !homomorphic_sum.verify_disjunctive_encryption_proof(
            &overall_plaintexts,
            overall_proof,
            pk,
            &generator,
        ) {
            debug!("bad overall proof");
            return false;
        }
        true
    }

    /// Copy without the audit data, i.e. what actually gets cast.
    pub fn without_audit_data(&self) -> EncryptedAnswer {
        EncryptedAnswer {
            randomness: None,
            answer: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedVote {
    pub answers: Vec<EncryptedAnswer>,
    pub election_hash: String,
    pub election_uuid: String,
}

impl EncryptedVote {
    /// Encrypt one selection per question.
    pub fn from_election_and_answers(
        election: &Election,
        answers: &[Vec<usize>],
        voter_alias: Option<&str>,
    ) -> Result<EncryptedVote> {
        if answers.len() != election.questions.len() {
            return Err(Error::InvalidVote(format!(
                "{} selections for {} questions",
                answers.len(),
                election.questions.len()
            )));
        }
        let answers = answers
            .iter()
            .enumerate()
            .map(|(i, selection)| {
                EncryptedAnswer::from_election_and_answer(election, i, selection, voter_alias)
            })
            .collect::<Result<Vec<EncryptedAnswer>>>()?;

        Ok(EncryptedVote {
            answers,
            election_hash: election.election_hash.clone(),
            election_uuid: election.uuid.clone(),
        })
    }

    /// Full check of a vote against its election: shape, hash, uuid and
    /// every proof of every question.
    pub fn check(&self, election: &Election, voter_alias: Option<&str>) -> Result<()> {
        if self.answers.len() != election.questions.len() {
            return Err(Error::InvalidVote(format!(
                "{} answers for {} questions",
                self.answers.len(),
                election.questions.len()
            )));
        }
        if self.election_hash != election.election_hash {
            return Err(Error::InvalidVote("election hash does not match".to_string()));
        }
        if self.election_uuid != election.uuid {
            return Err(Error::InvalidVote("election uuid does not match".to_string()));
        }

        for (question_index, (answer, question)) in self
            .answers
            .iter()
            .zip(election.questions.iter())
            .enumerate()
        {
            if answer.choices.len() != question.answers.len() {
                return Err(Error::InvalidVote(format!(
                    "question {} has {} choices, expected {}",
                    question_index,
                    answer.choices.len(),
                    question.answers.len()
                )));
            }
            let context = election.proof_context(question_index, voter_alias);
            if !answer.verify(&election.public_key, question.min, question.max, context.as_ref()) {
                return Err(Error::InvalidVote(format!(
                    "proofs of question {} do not verify",
                    question_index
                )));
            }
        }
        Ok(())
    }

    pub fn verify(&self, election: &Election, voter_alias: Option<&str>) -> bool {
        match self.check(election, voter_alias) {
            Ok(()) => true,
            Err(e) => {
                debug!("{}", e);
                false
            }
        }
    }

    pub fn without_audit_data(&self) -> EncryptedVote {
        EncryptedVote {
            answers: self.answers.iter().map(EncryptedAnswer::without_audit_data).collect(),
            election_hash: self.election_hash.clone(),
            election_uuid: self.election_uuid.clone(),
        }
    }
}

/// A vote together with the alias its proofs may be bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVote {
    pub vote: EncryptedVote,
    #[serde(default)]
    pub voter_alias: Option<String>,
}

impl CastVote {
    pub fn new(vote: EncryptedVote, voter_alias: Option<&str>) -> Self {
        CastVote {
            vote,
            voter_alias: voter_alias.map(str::to_string),
        }
    }
}
