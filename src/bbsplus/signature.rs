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

use bls12_381_plus::{multi_miller_loop, G1Projective, G2Prepared, G2Projective, Gt, Scalar};
use ff::Field;
use group::Curve;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::{
    ciphersuites::BbsCiphersuite,
    generators::{GeneratorCache, Generators},
    keys::{BBSplusPublicKey, BBSplusSecretKey},
};
use crate::{
    errors::Error,
    schemes::{algorithms::BBSplus, generics::Signature},
    utils::{
        message::BBSplusMessage,
        util::bbsplus_utils::{
            calculate_random_scalars, compute_b, is_identity, parse_g1_projective, parse_scalar, ScalarExt,
            POINT_G1_LEN, SCALAR_LEN,
        },
    },
};

/// Upper bound on the `(e, s)` draws before signing gives up. Each retry
/// happens with probability about `2^-255`.
const MAX_SIGN_ATTEMPTS: usize = 8;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BBSplusSignature {
    pub a: G1Projective,
    pub e: Scalar,
    pub s: Scalar,
}

impl BBSplusSignature {
    pub const BYTES: usize = POINT_G1_LEN + 2 * SCALAR_LEN;

    /// `A (48) || e (32) || s (32)`, scalars in big-endian order.
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let mut bytes = [0u8; Self::BYTES];
        bytes[0..48].copy_from_slice(&self.a.to_affine().to_compressed());
        bytes[48..80].copy_from_slice(&self.e.to_bytes_be());
        bytes[80..112].copy_from_slice(&self.s.to_bytes_be());
        bytes
    }

    /// Parses an encoded signature. Anything that is not exactly 112 bytes,
    /// holds a non canonical scalar, an invalid point or `A = identity` is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != Self::BYTES {
            return Err(Error::DeserializationError(format!(
                "signature must be {} bytes, got {}",
                Self::BYTES,
                bytes.len()
            )));
        }

        let a = parse_g1_projective(&bytes[0..48])?;
        if is_identity(&a) {
            return Err(Error::InvalidSignature);
        }
        let e = parse_scalar(&bytes[48..80])?;
        let s = parse_scalar(&bytes[80..112])?;

        Ok(Self { a, e, s })
    }
}

impl<CS: BbsCiphersuite> Signature<BBSplus<CS>> {
    pub fn a(&self) -> G1Projective {
        self.inner.a
    }

    pub fn e(&self) -> Scalar {
        self.inner.e
    }

    pub fn s(&self) -> Scalar {
        self.inner.s
    }

    /// Signs an ordered list of messages.
    ///
    /// # Inputs:
    /// * `rng`, the source of the `e` and `s` scalars.
    /// * `messages`, the octet strings to sign. An empty list is allowed.
    /// * `sk`, the signer secret key.
    /// * `pk`, the public key matching `sk`, used to derive the generators.
    pub fn sign<R, T>(rng: &mut R, messages: &[T], sk: &BBSplusSecretKey, pk: &BBSplusPublicKey) -> Result<Self, Error>
    where
        R: RngCore + CryptoRng,
        T: AsRef<[u8]>,
    {
        let generators = Generators::create::<CS>(pk, messages.len())?;
        Self::sign_with_generators(rng, messages, sk, &generators)
    }

    /// Same as [`Self::sign`], reusing the generators memoized in `cache`.
    pub fn sign_with_cache<R, T>(
        rng: &mut R,
        messages: &[T],
        sk: &BBSplusSecretKey,
        pk: &BBSplusPublicKey,
        cache: &GeneratorCache,
    ) -> Result<Self, Error>
    where
        R: RngCore + CryptoRng,
        T: AsRef<[u8]>,
    {
        let generators = cache.get::<CS>(pk, messages.len())?;
        Self::sign_with_generators(rng, messages, sk, &generators)
    }

    fn sign_with_generators<R, T>(
        rng: &mut R,
        messages: &[T],
        sk: &BBSplusSecretKey,
        generators: &Generators,
    ) -> Result<Self, Error>
    where
        R: RngCore + CryptoRng,
        T: AsRef<[u8]>,
    {
        let message_scalars = BBSplusMessage::messages_to_scalar::<CS, T>(messages)?;
        let signature = core_sign(rng, sk, generators, &message_scalars)?;
        Ok(Self::wrap(signature))
    }

    /// Checks the signature against the public key and the ordered list of messages.
    pub fn verify<T: AsRef<[u8]>>(&self, pk: &BBSplusPublicKey, messages: &[T]) -> Result<(), Error> {
        let generators = Generators::create::<CS>(pk, messages.len())?;
        let message_scalars = BBSplusMessage::messages_to_scalar::<CS, T>(messages)?;
        core_verify(pk, &self.inner, &generators, &message_scalars)
    }

    pub fn verify_with_cache<T: AsRef<[u8]>>(
        &self,
        pk: &BBSplusPublicKey,
        messages: &[T],
        cache: &GeneratorCache,
    ) -> Result<(), Error> {
        let generators = cache.get::<CS>(pk, messages.len())?;
        let message_scalars = BBSplusMessage::messages_to_scalar::<CS, T>(messages)?;
        core_verify(pk, &self.inner, &generators, &message_scalars)
    }

    pub fn bbsplus_signature(&self) -> &BBSplusSignature {
        &self.inner
    }

    pub fn to_bytes(&self) -> [u8; BBSplusSignature::BYTES] {
        self.inner.to_bytes()
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        Ok(Self::wrap(BBSplusSignature::from_bytes(data)?))
    }
}

impl<CS: BbsCiphersuite> From<BBSplusSignature> for Signature<BBSplus<CS>> {
    fn from(signature: BBSplusSignature) -> Self {
        Self::wrap(signature)
    }
}

/// A = B * (1 / (SK + e)), with fresh `e` and `s` for every attempt.
pub(crate) fn core_sign<R>(
    rng: &mut R,
    sk: &BBSplusSecretKey,
    generators: &Generators,
    messages: &[BBSplusMessage],
) -> Result<BBSplusSignature, Error>
where
    R: RngCore + CryptoRng,
{
    if generators.message_generators.len() != messages.len() {
        return Err(Error::NotEnoughGenerators);
    }

    log::debug!("signing {} messages", messages.len());

    for _ in 0..MAX_SIGN_ATTEMPTS {
        let scalars = calculate_random_scalars(rng, 2);
        let (e, s) = (scalars[0], scalars[1]);

        let inverse: Option<Scalar> = (sk.0 + e).invert().into();
        let Some(inverse) = inverse else {
            log::warn!("degenerate signature nonce, retrying");
            continue;
        };

        let B = compute_b(generators, s, messages)?;
        let A = B * inverse;
        if is_identity(&A) {
            log::warn!("degenerate signature nonce, retrying");
            continue;
        }

        return Ok(BBSplusSignature { a: A, e, s });
    }

    Err(Error::SignatureGenerationError(
        "unable to draw a valid (e, s) pair".to_owned(),
    ))
}

/// Accepts iff `e(A, W + P2 * e) * e(B, -P2) == 1` and `A != identity`.
pub(crate) fn core_verify(
    pk: &BBSplusPublicKey,
    signature: &BBSplusSignature,
    generators: &Generators,
    messages: &[BBSplusMessage],
) -> Result<(), Error> {
    pk.validate()?;

    if generators.message_generators.len() != messages.len() {
        return Err(Error::NotEnoughGenerators);
    }

    if is_identity(&signature.a) {
        return Err(Error::SignatureVerificationError);
    }

    let B = compute_b(generators, signature.s, messages)?;

    let BP2 = G2Projective::GENERATOR;
    let A2 = pk.0 + BP2 * signature.e;

    let term1 = (&signature.a.to_affine(), &G2Prepared::from(A2.to_affine()));
    let term2 = (&B.to_affine(), &G2Prepared::from(-BP2.to_affine()));

    let pairing = multi_miller_loop(&[term1, term2]).final_exponentiation();

    if pairing == Gt::IDENTITY {
        Ok(())
    } else {
        Err(Error::SignatureVerificationError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bbsplus::ciphersuites::{Bls12381Sha256, Bls12381Shake256},
        keys::pair::KeyPair,
    };
    use rand::{rngs::StdRng, SeedableRng};

    const IKM: &[u8] = b"this-IS-just-an-Test-IKM-to-generate-$e(r@#-key";

    fn messages() -> Vec<Vec<u8>> {
        vec![
            b"first_name: Alice".to_vec(),
            b"surname: Liddell".to_vec(),
            b"date_of_birth: 1852-05-04".to_vec(),
        ]
    }

    fn sign_and_verify<CS: BbsCiphersuite>() {
        let mut rng = StdRng::seed_from_u64(1);
        let (sk, pk) = KeyPair::<BBSplus<CS>>::generate(IKM, None, None).unwrap().into_parts();
        let msgs = messages();

        let signature = Signature::<BBSplus<CS>>::sign(&mut rng, &msgs, &sk, &pk).unwrap();
        assert!(signature.verify(&pk, &msgs).is_ok());
        assert_eq!(signature.to_bytes().len(), 112);
    }

    #[test]
    fn sign_and_verify_sha256() {
        sign_and_verify::<Bls12381Sha256>();
    }

    #[test]
    fn sign_and_verify_shake256() {
        sign_and_verify::<Bls12381Shake256>();
    }

    #[test]
    fn signatures_are_randomized() {
        let mut rng = StdRng::seed_from_u64(2);
        let (sk, pk) = KeyPair::<BBSplus<Bls12381Sha256>>::generate(IKM, None, None).unwrap().into_parts();
        let msgs = messages();

        let first = Signature::<BBSplus<Bls12381Sha256>>::sign(&mut rng, &msgs, &sk, &pk).unwrap();
        let second = Signature::<BBSplus<Bls12381Sha256>>::sign(&mut rng, &msgs, &sk, &pk).unwrap();
        assert_ne!(first, second);
        assert!(second.verify(&pk, &msgs).is_ok());
    }

    #[test]
    fn tampered_or_reordered_messages_fail() {
        let mut rng = StdRng::seed_from_u64(3);
        let (sk, pk) = KeyPair::<BBSplus<Bls12381Sha256>>::generate(IKM, None, None).unwrap().into_parts();
        let msgs = messages();
        let signature = Signature::<BBSplus<Bls12381Sha256>>::sign(&mut rng, &msgs, &sk, &pk).unwrap();

        let mut tampered = msgs.clone();
        tampered[1] = b"surname: Hatter".to_vec();
        assert_eq!(signature.verify(&pk, &tampered), Err(Error::SignatureVerificationError));

        let mut reordered = msgs.clone();
        reordered.swap(0, 2);
        assert_eq!(signature.verify(&pk, &reordered), Err(Error::SignatureVerificationError));

        assert_eq!(signature.verify(&pk, &msgs[..2]), Err(Error::SignatureVerificationError));
    }

    #[test]
    fn wrong_public_key_fails() {
        let mut rng = StdRng::seed_from_u64(4);
        let (sk, pk) = KeyPair::<BBSplus<Bls12381Sha256>>::generate(IKM, None, None).unwrap().into_parts();
        let other = KeyPair::<BBSplus<Bls12381Sha256>>::random(&mut rng).unwrap();
        let msgs = messages();
        let signature = Signature::<BBSplus<Bls12381Sha256>>::sign(&mut rng, &msgs, &sk, &pk).unwrap();

        assert_eq!(
            signature.verify(other.public_key(), &msgs),
            Err(Error::SignatureVerificationError)
        );
    }

    #[test]
    fn empty_message_list() {
        let mut rng = StdRng::seed_from_u64(5);
        let (sk, pk) = KeyPair::<BBSplus<Bls12381Sha256>>::generate(IKM, None, None).unwrap().into_parts();
        let empty: Vec<Vec<u8>> = Vec::new();

        let signature = Signature::<BBSplus<Bls12381Sha256>>::sign(&mut rng, &empty, &sk, &pk).unwrap();
        assert!(signature.verify(&pk, &empty).is_ok());
        assert!(signature.verify(&pk, &messages()).is_err());

        let full = Signature::<BBSplus<Bls12381Sha256>>::sign(&mut rng, &messages(), &sk, &pk).unwrap();
        assert!(full.verify(&pk, &empty).is_err());
    }

    #[test]
    fn cached_generators_give_the_same_results() {
        let mut rng = StdRng::seed_from_u64(6);
        let (sk, pk) = KeyPair::<BBSplus<Bls12381Sha256>>::generate(IKM, None, None).unwrap().into_parts();
        let cache = GeneratorCache::new();
        let msgs = messages();

        let signature =
            Signature::<BBSplus<Bls12381Sha256>>::sign_with_cache(&mut rng, &msgs, &sk, &pk, &cache).unwrap();
        assert!(signature.verify(&pk, &msgs).is_ok());
        assert!(signature.verify_with_cache(&pk, &msgs, &cache).is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn signature_bytes_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        let (sk, pk) = KeyPair::<BBSplus<Bls12381Sha256>>::generate(IKM, None, None).unwrap().into_parts();
        let msgs = messages();
        let signature = Signature::<BBSplus<Bls12381Sha256>>::sign(&mut rng, &msgs, &sk, &pk).unwrap();

        let decoded = Signature::<BBSplus<Bls12381Sha256>>::from_bytes(&signature.to_bytes()).unwrap();
        assert_eq!(decoded, signature);
        assert!(decoded.verify(&pk, &msgs).is_ok());
    }

    #[test]
    fn malformed_signature_bytes_are_rejected() {
        let mut rng = StdRng::seed_from_u64(8);
        let (sk, pk) = KeyPair::<BBSplus<Bls12381Sha256>>::generate(IKM, None, None).unwrap().into_parts();
        let bytes = Signature::<BBSplus<Bls12381Sha256>>::sign(&mut rng, &messages(), &sk, &pk)
            .unwrap()
            .to_bytes();

        assert!(matches!(
            BBSplusSignature::from_bytes(&bytes[..24]),
            Err(Error::DeserializationError(_))
        ));
        assert!(matches!(
            BBSplusSignature::from_bytes(&[bytes.as_slice(), &[0u8][..]].concat()),
            Err(Error::DeserializationError(_))
        ));

        let mut non_canonical = bytes;
        non_canonical[80..112].copy_from_slice(&[0xffu8; 32]);
        assert!(matches!(
            BBSplusSignature::from_bytes(&non_canonical),
            Err(Error::DeserializationError(_))
        ));

        let mut identity = bytes;
        identity[0..48].copy_from_slice(&G1Projective::IDENTITY.to_affine().to_compressed());
        assert_eq!(BBSplusSignature::from_bytes(&identity), Err(Error::InvalidSignature));
    }

    #[test]
    fn generator_count_must_match() {
        let mut rng = StdRng::seed_from_u64(9);
        let (sk, pk) = KeyPair::<BBSplus<Bls12381Sha256>>::generate(IKM, None, None).unwrap().into_parts();
        let generators = Generators::create::<Bls12381Sha256>(&pk, 2).unwrap();
        let scalars = BBSplusMessage::messages_to_scalar::<Bls12381Sha256, _>(&messages()).unwrap();

        assert_eq!(
            core_sign(&mut rng, &sk, &generators, &scalars),
            Err(Error::NotEnoughGenerators)
        );
    }

    #[test]
    fn identity_public_key_cannot_be_used_to_forge() {
        let identity = BBSplusPublicKey(G2Projective::IDENTITY);
        let msgs = vec![b"amount: 1000000".to_vec()];
        let generators = Generators::create::<Bls12381Sha256>(&identity, 1).unwrap();
        let scalars = BBSplusMessage::messages_to_scalar::<Bls12381Sha256, _>(&msgs).unwrap();

        // with W = identity, A = B / e satisfies the pairing equation for any (e, s)
        let e = Scalar::from(7u64);
        let s = Scalar::from(11u64);
        let b = compute_b(&generators, s, &scalars).unwrap();
        let a = b * Option::<Scalar>::from(e.invert()).unwrap();
        let pairing = multi_miller_loop(&[
            (&a.to_affine(), &G2Prepared::from((G2Projective::GENERATOR * e).to_affine())),
            (&b.to_affine(), &G2Prepared::from(-G2Projective::GENERATOR.to_affine())),
        ])
        .final_exponentiation();
        assert_eq!(pairing, Gt::IDENTITY);

        let forged = Signature::<BBSplus<Bls12381Sha256>>::wrap(BBSplusSignature { a, e, s });
        assert_eq!(forged.verify(&identity, &msgs), Err(Error::PointAtInfinity));
        assert_eq!(
            core_verify(&identity, forged.bbsplus_signature(), &generators, &scalars),
            Err(Error::PointAtInfinity)
        );
    }
}
