// Copyright 2025 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use core::marker::PhantomData;

use bls12_381_plus::{multi_miller_loop, G1Projective, G2Prepared, G2Projective, Gt, Scalar};
use ff::Field;
use group::Curve;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use super::{
    ciphersuites::BbsCiphersuite,
    generators::{GeneratorCache, Generators},
    keys::BBSplusPublicKey,
    signature::{core_verify, BBSplusSignature},
};
use crate::{
    errors::Error,
    schemes::{
        algorithms::BBSplus,
        generics::{PoKSignature, Signature},
    },
    utils::{
        message::BBSplusMessage,
        util::{
            bbsplus_utils::{
                calculate_domain, calculate_random_scalars, compute_b, hash_to_scalar, i2osp, is_identity,
                multi_scalar_mul, parse_g1_projective, parse_scalar, random_nonzero_scalar, ScalarExt,
                POINT_G1_LEN, SCALAR_LEN,
            },
            get_remaining_indexes, normalize_indexes,
        },
    },
};

/// A non-interactive proof of knowledge of a BBS+ signature.
///
/// Byte layout:
/// `A'(48) || Abar(48) || D(48) || c(32) || e^(32) || r2^(32) || r3^(32) || s^(32) || m^_j(32 each)`
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BBSplusPoKSignature {
    a_prime: G1Projective,
    a_bar: G1Projective,
    d: G1Projective,
    challenge: Scalar,
    e_cap: Scalar,
    r2_cap: Scalar,
    r3_cap: Scalar,
    s_cap: Scalar,
    m_cap: Vec<Scalar>,
}

impl BBSplusPoKSignature {
    /// Length of a proof that hides no message.
    pub const MIN_BYTES: usize = 3 * POINT_G1_LEN + 5 * SCALAR_LEN;

    /// Number of hidden messages the proof carries a response for.
    pub fn undisclosed_count(&self) -> usize {
        self.m_cap.len()
    }

    pub fn challenge(&self) -> Scalar {
        self.challenge
    }

    /// Responses `m^_j` for the hidden messages, in ascending index order.
    pub fn undisclosed_responses(&self) -> &[Scalar] {
        &self.m_cap
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = Vec::with_capacity(Self::MIN_BYTES + SCALAR_LEN * self.m_cap.len());

        bytes.extend_from_slice(&self.a_prime.to_affine().to_compressed());
        bytes.extend_from_slice(&self.a_bar.to_affine().to_compressed());
        bytes.extend_from_slice(&self.d.to_affine().to_compressed());
        bytes.extend_from_slice(&self.challenge.to_bytes_be());
        bytes.extend_from_slice(&self.e_cap.to_bytes_be());
        bytes.extend_from_slice(&self.r2_cap.to_bytes_be());
        bytes.extend_from_slice(&self.r3_cap.to_bytes_be());
        bytes.extend_from_slice(&self.s_cap.to_bytes_be());
        self.m_cap.iter().for_each(|v| bytes.extend_from_slice(&v.to_bytes_be()));
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < Self::MIN_BYTES || (bytes.len() - Self::MIN_BYTES) % SCALAR_LEN != 0 {
            return Err(Error::InvalidProofOfKnowledgeSignature);
        }

        let a_prime = parse_g1_projective(&bytes[0..48])?;
        let a_bar = parse_g1_projective(&bytes[48..96])?;
        let d = parse_g1_projective(&bytes[96..144])?;

        let challenge = parse_scalar(&bytes[144..176])?;
        let e_cap = parse_scalar(&bytes[176..208])?;
        let r2_cap = parse_scalar(&bytes[208..240])?;
        let r3_cap = parse_scalar(&bytes[240..272])?;
        let s_cap = parse_scalar(&bytes[272..304])?;

        let m_cap = bytes[Self::MIN_BYTES..]
            .chunks_exact(SCALAR_LEN)
            .map(parse_scalar)
            .collect::<Result<Vec<Scalar>, Error>>()?;

        Ok(Self {
            a_prime,
            a_bar,
            d,
            challenge,
            e_cap,
            r2_cap,
            r3_cap,
            s_cap,
            m_cap,
        })
    }
}

/// A signed message as it enters a proof.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProofMessage {
    Revealed(BBSplusMessage),
    Hidden(BBSplusMessage),
    /// A hidden message blinded with a caller supplied `m~`. Proofs that share
    /// one challenge and reuse the same blinding for the same value carry the
    /// same response `m^` for it, which shows the hidden values are equal.
    HiddenWithBlinding(BBSplusMessage, Scalar),
}

impl ProofMessage {
    pub fn message(&self) -> BBSplusMessage {
        match self {
            Self::Revealed(m) | Self::Hidden(m) | Self::HiddenWithBlinding(m, _) => *m,
        }
    }

    pub fn is_revealed(&self) -> bool {
        matches!(self, Self::Revealed(_))
    }

    /// Maps `messages` to scalars and marks the ones at `disclosed_indexes` as revealed.
    pub fn from_messages<CS, T>(messages: &[T], disclosed_indexes: &[usize]) -> Result<Vec<Self>, Error>
    where
        CS: BbsCiphersuite,
        T: AsRef<[u8]>,
    {
        if let Some(&invalid_index) = disclosed_indexes.iter().find(|&&i| i >= messages.len()) {
            return Err(Error::IndexOutOfRange(invalid_index));
        }

        let scalars = BBSplusMessage::messages_to_scalar::<CS, T>(messages)?;
        Ok(scalars
            .into_iter()
            .enumerate()
            .map(|(i, m)| {
                if disclosed_indexes.contains(&i) {
                    Self::Revealed(m)
                } else {
                    Self::Hidden(m)
                }
            })
            .collect())
    }
}

/// Accumulates the Fiat-Shamir input of one or more proofs.
///
/// A stand-alone proof hashes its own contribution followed by the
/// presentation context. Several proofs can be bound to one challenge by
/// adding all their contributions to the same transcript before calling
/// [`ProofTranscript::challenge`].
pub struct ProofTranscript<CS: BbsCiphersuite> {
    bytes: Vec<u8>,
    _cs: PhantomData<CS>,
}

impl<CS: BbsCiphersuite> Default for ProofTranscript<CS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<CS: BbsCiphersuite> ProofTranscript<CS> {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            _cs: PhantomData,
        }
    }

    /// Appends application data verbatim.
    pub fn append(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Appends `I2OSP(len(ph), 8) || ph`. `None` encodes like an empty context.
    pub fn append_context(&mut self, ph: Option<&[u8]>) {
        let ph = ph.unwrap_or(b"");
        self.bytes.extend_from_slice(&i2osp(ph.len(), 8));
        self.bytes.extend_from_slice(ph);
    }

    pub fn challenge(&self) -> Result<Scalar, Error> {
        hash_to_scalar::<CS>(&self.bytes, &CS::h2s_dst())
    }
}

/// The prover state between the commitment and the response phase.
///
/// Holds the signature secrets and the blindings. They are wiped on drop.
pub struct ProofCommitment<CS: BbsCiphersuite> {
    init_res: ProofInitResult,
    e: Scalar,
    s: Scalar,
    blindings: ProofBlindings,
    disclosed_indexes: Vec<usize>,
    disclosed_messages: Vec<BBSplusMessage>,
    undisclosed_messages: Vec<BBSplusMessage>,
    domain: Scalar,
    _cs: PhantomData<CS>,
}

impl<CS: BbsCiphersuite> ProofCommitment<CS> {
    /// Appends `A' || Abar || D || T1 || T2 || I2OSP(R, 8) || (I2OSP(i, 8) || m_i)... || domain`.
    pub fn add_challenge_contribution(&self, transcript: &mut ProofTranscript<CS>) {
        transcript.append(&challenge_contribution(
            &self.init_res,
            &self.disclosed_indexes,
            &self.disclosed_messages,
            self.domain,
        ));
    }

    /// Computes the responses for `challenge` and returns the finished proof.
    pub fn finalize(self, challenge: Scalar) -> PoKSignature<BBSplus<CS>> {
        PoKSignature::wrap(proof_finalize(
            &self.init_res,
            challenge,
            self.e,
            self.s,
            &self.blindings,
            &self.undisclosed_messages,
        ))
    }
}

impl<CS: BbsCiphersuite> Drop for ProofCommitment<CS> {
    fn drop(&mut self) {
        self.e.zeroize();
        self.s.zeroize();
        self.init_res.r2.zeroize();
        self.init_res.r3.zeroize();
        self.blindings.zeroize();
        self.undisclosed_messages.iter_mut().for_each(|m| m.value.zeroize());
    }
}

impl<CS: BbsCiphersuite> PoKSignature<BBSplus<CS>> {
    /// Derives a proof of knowledge of `signature` revealing the messages at `disclosed_indexes`.
    ///
    /// # Inputs:
    /// * `rng`, a source of fresh randomness. Every call re-randomizes the proof.
    /// * `pk`, the signer public key.
    /// * `signature`, a signature over `messages` under `pk`.
    /// * `messages`, the full ordered list of signed messages.
    /// * `disclosed_indexes`, the positions to reveal. Order and duplicates do not matter.
    /// * `ph` (OPTIONAL), a presentation context bound into the challenge.
    pub fn proof_gen<R, T>(
        rng: &mut R,
        pk: &BBSplusPublicKey,
        signature: &Signature<BBSplus<CS>>,
        messages: &[T],
        disclosed_indexes: &[usize],
        ph: Option<&[u8]>,
    ) -> Result<Self, Error>
    where
        R: RngCore + CryptoRng,
        T: AsRef<[u8]>,
    {
        let generators = Generators::create::<CS>(pk, messages.len())?;
        Self::proof_gen_with_generators(rng, pk, signature, messages, disclosed_indexes, ph, &generators)
    }

    pub fn proof_gen_with_cache<R, T>(
        rng: &mut R,
        pk: &BBSplusPublicKey,
        signature: &Signature<BBSplus<CS>>,
        messages: &[T],
        disclosed_indexes: &[usize],
        ph: Option<&[u8]>,
        cache: &GeneratorCache,
    ) -> Result<Self, Error>
    where
        R: RngCore + CryptoRng,
        T: AsRef<[u8]>,
    {
        let generators = cache.get::<CS>(pk, messages.len())?;
        Self::proof_gen_with_generators(rng, pk, signature, messages, disclosed_indexes, ph, &generators)
    }

    fn proof_gen_with_generators<R, T>(
        rng: &mut R,
        pk: &BBSplusPublicKey,
        signature: &Signature<BBSplus<CS>>,
        messages: &[T],
        disclosed_indexes: &[usize],
        ph: Option<&[u8]>,
        generators: &Generators,
    ) -> Result<Self, Error>
    where
        R: RngCore + CryptoRng,
        T: AsRef<[u8]>,
    {
        let disclosed_indexes = normalize_indexes(disclosed_indexes);
        let proof_messages = ProofMessage::from_messages::<CS, T>(messages, &disclosed_indexes)?;
        let commitment = core_proof_commit::<CS, R>(rng, pk, signature.bbsplus_signature(), generators, &proof_messages)?;

        let mut transcript = ProofTranscript::<CS>::new();
        commitment.add_challenge_contribution(&mut transcript);
        transcript.append_context(ph);
        let challenge = transcript.challenge()?;

        Ok(commitment.finalize(challenge))
    }

    /// First half of [`Self::proof_gen`]: commits to the blinded signature.
    ///
    /// The caller adds the commitment to a [`ProofTranscript`], possibly
    /// together with other proofs, derives the challenge, and passes it to
    /// [`ProofCommitment::finalize`].
    pub fn proof_commit<R>(
        rng: &mut R,
        pk: &BBSplusPublicKey,
        signature: &Signature<BBSplus<CS>>,
        messages: &[ProofMessage],
    ) -> Result<ProofCommitment<CS>, Error>
    where
        R: RngCore + CryptoRng,
    {
        let generators = Generators::create::<CS>(pk, messages.len())?;
        core_proof_commit::<CS, R>(rng, pk, signature.bbsplus_signature(), &generators, messages)
    }

    pub fn proof_commit_with_cache<R>(
        rng: &mut R,
        pk: &BBSplusPublicKey,
        signature: &Signature<BBSplus<CS>>,
        messages: &[ProofMessage],
        cache: &GeneratorCache,
    ) -> Result<ProofCommitment<CS>, Error>
    where
        R: RngCore + CryptoRng,
    {
        let generators = cache.get::<CS>(pk, messages.len())?;
        core_proof_commit::<CS, R>(rng, pk, signature.bbsplus_signature(), &generators, messages)
    }

    /// Verifies the proof against the revealed messages.
    ///
    /// `disclosed_messages[k]` is the message at position `disclosed_indexes[k]`;
    /// `total_message_count` is the length of the list the signature covers.
    pub fn proof_verify<T: AsRef<[u8]>>(
        &self,
        pk: &BBSplusPublicKey,
        disclosed_messages: &[T],
        disclosed_indexes: &[usize],
        total_message_count: usize,
        ph: Option<&[u8]>,
    ) -> Result<(), Error> {
        self.check_message_count(disclosed_indexes.len(), total_message_count)?;
        let generators = Generators::create::<CS>(pk, total_message_count)?;
        self.proof_verify_with_generators(pk, disclosed_messages, disclosed_indexes, ph, &generators)
    }

    pub fn proof_verify_with_cache<T: AsRef<[u8]>>(
        &self,
        pk: &BBSplusPublicKey,
        disclosed_messages: &[T],
        disclosed_indexes: &[usize],
        total_message_count: usize,
        ph: Option<&[u8]>,
        cache: &GeneratorCache,
    ) -> Result<(), Error> {
        self.check_message_count(disclosed_indexes.len(), total_message_count)?;
        let generators = cache.get::<CS>(pk, total_message_count)?;
        self.proof_verify_with_generators(pk, disclosed_messages, disclosed_indexes, ph, &generators)
    }

    fn proof_verify_with_generators<T: AsRef<[u8]>>(
        &self,
        pk: &BBSplusPublicKey,
        disclosed_messages: &[T],
        disclosed_indexes: &[usize],
        ph: Option<&[u8]>,
        generators: &Generators,
    ) -> Result<(), Error> {
        let mut transcript = ProofTranscript::<CS>::new();
        self.add_contribution_with_generators(pk, disclosed_messages, disclosed_indexes, generators, &mut transcript)?;
        transcript.append_context(ph);
        let challenge = transcript.challenge()?;

        self.proof_verify_with_challenge(pk, challenge)
    }

    /// Verifier side of [`ProofCommitment::add_challenge_contribution`].
    ///
    /// Recomputes `T1` and `T2` from the responses and appends the same bytes
    /// the prover hashed.
    pub fn add_challenge_contribution<T: AsRef<[u8]>>(
        &self,
        pk: &BBSplusPublicKey,
        disclosed_messages: &[T],
        disclosed_indexes: &[usize],
        total_message_count: usize,
        transcript: &mut ProofTranscript<CS>,
    ) -> Result<(), Error> {
        self.check_message_count(disclosed_indexes.len(), total_message_count)?;
        let generators = Generators::create::<CS>(pk, total_message_count)?;
        self.add_contribution_with_generators(pk, disclosed_messages, disclosed_indexes, &generators, transcript)
    }

    pub fn add_challenge_contribution_with_cache<T: AsRef<[u8]>>(
        &self,
        pk: &BBSplusPublicKey,
        disclosed_messages: &[T],
        disclosed_indexes: &[usize],
        total_message_count: usize,
        transcript: &mut ProofTranscript<CS>,
        cache: &GeneratorCache,
    ) -> Result<(), Error> {
        self.check_message_count(disclosed_indexes.len(), total_message_count)?;
        let generators = cache.get::<CS>(pk, total_message_count)?;
        self.add_contribution_with_generators(pk, disclosed_messages, disclosed_indexes, &generators, transcript)
    }

    /// Checks the proof against a challenge derived by the caller.
    ///
    /// `challenge` must come from a transcript this proof contributed to
    /// through [`Self::add_challenge_contribution`]; otherwise the check
    /// proves nothing.
    pub fn proof_verify_with_challenge(&self, pk: &BBSplusPublicKey, challenge: Scalar) -> Result<(), Error> {
        core_proof_check(pk, &self.inner, challenge)
    }

    fn add_contribution_with_generators<T: AsRef<[u8]>>(
        &self,
        pk: &BBSplusPublicKey,
        disclosed_messages: &[T],
        disclosed_indexes: &[usize],
        generators: &Generators,
        transcript: &mut ProofTranscript<CS>,
    ) -> Result<(), Error> {
        if disclosed_messages.len() != disclosed_indexes.len() {
            return Err(Error::PoKSVerificationError(
                "number of disclosed messages differs from number of disclosed indexes".to_owned(),
            ));
        }

        let mut disclosed: Vec<(usize, &[u8])> = disclosed_indexes
            .iter()
            .copied()
            .zip(disclosed_messages.iter().map(|m| m.as_ref()))
            .collect();
        disclosed.sort_by_key(|(i, _)| *i);
        if disclosed.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(Error::PoKSVerificationError("duplicated disclosed index".to_owned()));
        }

        let (indexes, messages): (Vec<usize>, Vec<&[u8]>) = disclosed.into_iter().unzip();
        let message_scalars = BBSplusMessage::messages_to_scalar::<CS, &[u8]>(&messages)?;

        let contribution = core_proof_contribution::<CS>(pk, &self.inner, generators, &message_scalars, &indexes)?;
        transcript.append(&contribution);
        Ok(())
    }

    // Runs before the generators are derived, so a forged count costs nothing.
    fn check_message_count(&self, disclosed_count: usize, total_message_count: usize) -> Result<(), Error> {
        if self.inner.m_cap.len() + disclosed_count != total_message_count {
            return Err(Error::PoKSVerificationError(format!(
                "{} undisclosed and {} disclosed messages, expected {} in total",
                self.inner.m_cap.len(),
                disclosed_count,
                total_message_count
            )));
        }
        Ok(())
    }

    pub fn bbsplus_proof(&self) -> &BBSplusPoKSignature {
        &self.inner
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Ok(Self::wrap(BBSplusPoKSignature::from_bytes(bytes)?))
    }
}

fn core_proof_commit<CS, R>(
    rng: &mut R,
    pk: &BBSplusPublicKey,
    signature: &BBSplusSignature,
    generators: &Generators,
    messages: &[ProofMessage],
) -> Result<ProofCommitment<CS>, Error>
where
    CS: BbsCiphersuite,
    R: RngCore + CryptoRng,
{
    let message_scalars: Vec<BBSplusMessage> = messages.iter().map(ProofMessage::message).collect();
    core_verify(pk, signature, generators, &message_scalars).map_err(|_| Error::InvalidSignature)?;

    let mut disclosed_indexes = Vec::new();
    let mut disclosed_messages = Vec::new();
    let mut undisclosed_indexes = Vec::new();
    let mut undisclosed_messages = Vec::new();
    let mut fixed_blindings: Vec<Option<Scalar>> = Vec::new();

    for (i, message) in messages.iter().enumerate() {
        match *message {
            ProofMessage::Revealed(m) => {
                disclosed_indexes.push(i);
                disclosed_messages.push(m);
            }
            ProofMessage::Hidden(m) => {
                undisclosed_indexes.push(i);
                undisclosed_messages.push(m);
                fixed_blindings.push(None);
            }
            ProofMessage::HiddenWithBlinding(m, blinding) => {
                undisclosed_indexes.push(i);
                undisclosed_messages.push(m);
                fixed_blindings.push(Some(blinding));
            }
        }
    }

    log::debug!(
        "deriving proof: {} disclosed, {} undisclosed",
        disclosed_indexes.len(),
        undisclosed_indexes.len()
    );

    // r1, then r2, e~, r2~, r3~, s~, then one m~ per hidden message without a fixed blinding
    let r1 = random_nonzero_scalar(rng);
    let drawn = fixed_blindings.iter().filter(|b| b.is_none()).count();
    let random_scalars = Zeroizing::new(calculate_random_scalars(rng, 5 + drawn));

    let mut fresh = random_scalars[5..].iter().copied();
    let m_tilde = fixed_blindings
        .iter()
        .map(|b| b.or_else(|| fresh.next()))
        .collect::<Option<Vec<Scalar>>>()
        .ok_or_else(|| Error::ProofGenError("Random scalars not valid".to_owned()))?;

    let blindings = ProofBlindings {
        e_tilde: random_scalars[1],
        r2_tilde: random_scalars[2],
        r3_tilde: random_scalars[3],
        s_tilde: random_scalars[4],
        m_tilde,
    };

    let init_res = proof_init(
        signature,
        generators,
        r1,
        random_scalars[0],
        &blindings,
        &message_scalars,
        &undisclosed_indexes,
    )?;
    let domain = calculate_domain::<CS>(pk, generators)?;

    Ok(ProofCommitment {
        init_res,
        e: signature.e,
        s: signature.s,
        blindings,
        disclosed_indexes,
        disclosed_messages,
        undisclosed_messages,
        domain,
        _cs: PhantomData,
    })
}

#[derive(Clone, Debug)]
struct ProofInitResult {
    a_prime: G1Projective,
    a_bar: G1Projective,
    d: G1Projective,
    t1: G1Projective,
    t2: G1Projective,
    r2: Scalar,
    r3: Scalar,
}

struct ProofBlindings {
    e_tilde: Scalar,
    r2_tilde: Scalar,
    r3_tilde: Scalar,
    s_tilde: Scalar,
    m_tilde: Vec<Scalar>,
}

impl Zeroize for ProofBlindings {
    fn zeroize(&mut self) {
        self.e_tilde.zeroize();
        self.r2_tilde.zeroize();
        self.r3_tilde.zeroize();
        self.s_tilde.zeroize();
        self.m_tilde.zeroize();
    }
}

fn proof_init(
    signature: &BBSplusSignature,
    generators: &Generators,
    r1: Scalar,
    r2: Scalar,
    blindings: &ProofBlindings,
    messages: &[BBSplusMessage],
    undisclosed_indexes: &[usize],
) -> Result<ProofInitResult, Error> {
    if blindings.m_tilde.len() != undisclosed_indexes.len() {
        return Err(Error::ProofGenError("Random scalars not valid".to_owned()));
    }

    let r3: Option<Scalar> = r1.invert().into();
    let r3 = r3.ok_or_else(|| Error::ProofGenError("Invert scalar failed".to_owned()))?;

    let B = compute_b(generators, signature.s, messages)?;

    let a_prime = signature.a * r1;
    let a_bar = a_prime * (-signature.e) + B * r1;
    let d = B * r1 - generators.h0 * r2;

    let t1 = a_prime * blindings.e_tilde + generators.h0 * blindings.r2_tilde;

    let hidden_generators: Vec<G1Projective> = undisclosed_indexes
        .iter()
        .map(|&j| generators.message_generators[j])
        .collect();
    let t2 = d * blindings.r3_tilde + generators.h0 * blindings.s_tilde + multi_scalar_mul(&hidden_generators, &blindings.m_tilde);

    Ok(ProofInitResult {
        a_prime,
        a_bar,
        d,
        t1,
        t2,
        r2,
        r3,
    })
}

/// A' || Abar || D || T1 || T2 || I2OSP(R, 8) || (I2OSP(i, 8) || m_i)... || domain
fn challenge_contribution(
    init_res: &ProofInitResult,
    disclosed_indexes: &[usize],
    disclosed_messages: &[BBSplusMessage],
    domain: Scalar,
) -> Vec<u8> {
    let R = disclosed_indexes.len();

    let mut c_arr: Vec<u8> = Vec::with_capacity(5 * POINT_G1_LEN + 8 + R * (8 + SCALAR_LEN) + SCALAR_LEN);
    c_arr.extend_from_slice(&init_res.a_prime.to_affine().to_compressed());
    c_arr.extend_from_slice(&init_res.a_bar.to_affine().to_compressed());
    c_arr.extend_from_slice(&init_res.d.to_affine().to_compressed());
    c_arr.extend_from_slice(&init_res.t1.to_affine().to_compressed());
    c_arr.extend_from_slice(&init_res.t2.to_affine().to_compressed());
    c_arr.extend_from_slice(&i2osp(R, 8));
    disclosed_indexes
        .iter()
        .zip(disclosed_messages.iter())
        .for_each(|(&i, m)| {
            c_arr.extend_from_slice(&i2osp(i, 8));
            c_arr.extend_from_slice(&m.to_bytes_be());
        });
    c_arr.extend_from_slice(&domain.to_bytes_be());
    c_arr
}

fn proof_finalize(
    init_res: &ProofInitResult,
    challenge: Scalar,
    e: Scalar,
    s: Scalar,
    blindings: &ProofBlindings,
    undisclosed_messages: &[BBSplusMessage],
) -> BBSplusPoKSignature {
    let s_prime = s - init_res.r2 * init_res.r3;

    let e_cap = blindings.e_tilde - challenge * e;
    let r2_cap = blindings.r2_tilde + challenge * init_res.r2;
    let r3_cap = blindings.r3_tilde + challenge * init_res.r3;
    let s_cap = blindings.s_tilde - challenge * s_prime;

    let m_cap: Vec<Scalar> = blindings
        .m_tilde
        .iter()
        .zip(undisclosed_messages.iter())
        .map(|(m_t, m)| *m_t - challenge * m.value)
        .collect();

    BBSplusPoKSignature {
        a_prime: init_res.a_prime,
        a_bar: init_res.a_bar,
        d: init_res.d,
        challenge,
        e_cap,
        r2_cap,
        r3_cap,
        s_cap,
        m_cap,
    }
}

/// `disclosed_indexes` must be sorted, without duplicates, and paired with `disclosed_messages`.
fn core_proof_contribution<CS: BbsCiphersuite>(
    pk: &BBSplusPublicKey,
    proof: &BBSplusPoKSignature,
    generators: &Generators,
    disclosed_messages: &[BBSplusMessage],
    disclosed_indexes: &[usize],
) -> Result<Vec<u8>, Error> {
    pk.validate()?;

    let L = generators.message_count();
    let U = proof.m_cap.len();
    let R = disclosed_indexes.len();

    if U + R != L {
        return Err(Error::PoKSVerificationError(format!(
            "{} undisclosed and {} disclosed messages, expected {} in total",
            U, R, L
        )));
    }

    if let Some(&invalid_index) = disclosed_indexes.iter().find(|&&i| i >= L) {
        return Err(Error::IndexOutOfRange(invalid_index));
    }

    if is_identity(&proof.a_prime) {
        return Err(Error::InvalidProofOfKnowledgeSignature);
    }

    let init_res = proof_verify_init(proof, generators, disclosed_messages, disclosed_indexes)?;
    let domain = calculate_domain::<CS>(pk, generators)?;

    Ok(challenge_contribution(&init_res, disclosed_indexes, disclosed_messages, domain))
}

/// Accepts iff the challenge matches and `e(A', W) * e(Abar, -P2) == 1`.
fn core_proof_check(pk: &BBSplusPublicKey, proof: &BBSplusPoKSignature, challenge: Scalar) -> Result<(), Error> {
    pk.validate()?;

    if is_identity(&proof.a_prime) {
        return Err(Error::InvalidProofOfKnowledgeSignature);
    }

    if challenge != proof.challenge {
        log::debug!("proof rejected: challenge mismatch");
        return Err(Error::InvalidProofOfKnowledgeSignature);
    }

    let BP2 = G2Projective::GENERATOR;

    let term1 = (&proof.a_prime.to_affine(), &G2Prepared::from(pk.0.to_affine()));
    let term2 = (&proof.a_bar.to_affine(), &G2Prepared::from(-BP2.to_affine()));

    let pairing = multi_miller_loop(&[term1, term2]).final_exponentiation();

    if pairing == Gt::IDENTITY {
        Ok(())
    } else {
        log::debug!("proof rejected: pairing check failed");
        Err(Error::InvalidProofOfKnowledgeSignature)
    }
}

/// Recomputes `T1` and `T2` from the responses and the challenge.
fn proof_verify_init(
    proof: &BBSplusPoKSignature,
    generators: &Generators,
    disclosed_messages: &[BBSplusMessage],
    disclosed_indexes: &[usize],
) -> Result<ProofInitResult, Error> {
    let L = generators.message_count();
    let undisclosed_indexes = get_remaining_indexes(L, disclosed_indexes);

    if undisclosed_indexes.len() != proof.m_cap.len() {
        return Err(Error::PoKSVerificationError("wrong number of undisclosed messages".to_owned()));
    }

    let c = proof.challenge;

    let t1 = proof.a_prime * proof.e_cap + generators.h0 * proof.r2_cap - (proof.a_bar - proof.d) * c;

    let disclosed_generators: Vec<G1Projective> = disclosed_indexes
        .iter()
        .map(|&i| generators.message_generators[i])
        .collect();
    let disclosed_scalars: Vec<Scalar> = disclosed_messages.iter().map(|m| m.value).collect();
    let D_rev = generators.g1_base_point + multi_scalar_mul(&disclosed_generators, &disclosed_scalars);

    let hidden_generators: Vec<G1Projective> = undisclosed_indexes
        .iter()
        .map(|&j| generators.message_generators[j])
        .collect();

    let t2 = proof.d * proof.r3_cap + generators.h0 * proof.s_cap + multi_scalar_mul(&hidden_generators, &proof.m_cap)
        - D_rev * c;

    Ok(ProofInitResult {
        a_prime: proof.a_prime,
        a_bar: proof.a_bar,
        d: proof.d,
        t1,
        t2,
        r2: Scalar::ZERO,
        r3: Scalar::ZERO,
    })
}
