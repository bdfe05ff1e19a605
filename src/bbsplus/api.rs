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

//! Byte oriented operations over plain request/response types, for callers
//! that exchange keys, signatures and proofs as opaque octet strings.
//!
//! "Did this validate" outcomes are always a [`BbsVerifyResponse`]; only
//! requests that make no sense return an [`Error`].

use std::collections::HashMap;
use std::marker::PhantomData;

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::{
    ciphersuites::BbsCiphersuite,
    generators::{GeneratorCache, GeneratorCacheConfig},
    keys::{BBSplusPublicKey, BBSplusSecretKey},
};
use crate::{
    errors::Error,
    keys::pair::KeyPair,
    schemes::{
        algorithms::BBSplus,
        generics::{PoKSignature, Signature},
    },
};

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BbsKeyPair {
    pub public_key: Vec<u8>,
    pub secret_key: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BbsSignRequest {
    pub secret_key: Vec<u8>,
    pub messages: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BbsVerifyRequest {
    pub public_key: Vec<u8>,
    pub messages: Vec<Vec<u8>>,
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BbsVerifyResponse {
    pub verified: bool,
    pub error: Option<String>,
}

impl BbsVerifyResponse {
    fn from_result(result: Result<(), Error>) -> Self {
        match result {
            Ok(()) => Self { verified: true, error: None },
            Err(e) => {
                log::debug!("verification failed: {}", e);
                Self {
                    verified: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BbsDeriveProofRevealMessageRequest {
    pub reveal: bool,
    pub value: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BbsDeriveProofRequest {
    pub public_key: Vec<u8>,
    pub messages: Vec<BbsDeriveProofRevealMessageRequest>,
    pub signature: Vec<u8>,
    pub presentation_message: Vec<u8>,
}

/// `messages` maps the decimal position of each revealed message to its value.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BbsVerifyProofRequest {
    pub public_key: Vec<u8>,
    pub proof: Vec<u8>,
    pub presentation_message: Vec<u8>,
    pub total_message_count: usize,
    pub messages: HashMap<String, Vec<u8>>,
}

/// Entry point for the byte oriented operations under the ciphersuite `CS`.
///
/// Generators are memoized in a cache owned by the instance.
#[derive(Debug, Default)]
pub struct BbsApi<CS: BbsCiphersuite> {
    cache: GeneratorCache,
    _ciphersuite: PhantomData<CS>,
}

impl<CS: BbsCiphersuite> BbsApi<CS> {
    pub fn new() -> Self {
        Self {
            cache: GeneratorCache::new(),
            _ciphersuite: PhantomData,
        }
    }

    /// Same as [`Self::new`] with explicit limits on the generator cache.
    pub fn with_cache_config(config: GeneratorCacheConfig) -> Self {
        Self {
            cache: GeneratorCache::with_config(config),
            _ciphersuite: PhantomData,
        }
    }

    pub fn cache(&self) -> &GeneratorCache {
        &self.cache
    }

    /// Derives a key pair from `seed` when given, from fresh randomness otherwise.
    ///
    /// Seeds of any length are accepted, see [`KeyPair::from_seed`]. `key_info`
    /// is only used together with a seed.
    pub fn generate_key_pair<R>(
        &self,
        rng: &mut R,
        seed: Option<&[u8]>,
        key_info: Option<&[u8]>,
    ) -> Result<BbsKeyPair, Error>
    where
        R: RngCore + CryptoRng,
    {
        let keypair = match seed {
            Some(seed) => KeyPair::<BBSplus<CS>>::from_seed(seed, key_info)?,
            None => KeyPair::<BBSplus<CS>>::random(rng)?,
        };

        Ok(BbsKeyPair {
            public_key: keypair.public_key().to_bytes().to_vec(),
            secret_key: Some(keypair.private_key().to_bytes().to_vec()),
        })
    }

    pub fn sign<R>(&self, rng: &mut R, request: &BbsSignRequest) -> Result<Vec<u8>, Error>
    where
        R: RngCore + CryptoRng,
    {
        let sk = BBSplusSecretKey::from_bytes(&request.secret_key)?;
        let pk = sk.public_key();

        let signature =
            Signature::<BBSplus<CS>>::sign_with_cache(rng, &request.messages, &sk, &pk, &self.cache)?;
        Ok(signature.to_bytes().to_vec())
    }

    pub fn verify(&self, request: &BbsVerifyRequest) -> BbsVerifyResponse {
        BbsVerifyResponse::from_result(self.try_verify(request))
    }

    fn try_verify(&self, request: &BbsVerifyRequest) -> Result<(), Error> {
        let pk = BBSplusPublicKey::from_bytes(&request.public_key)?;
        let signature = Signature::<BBSplus<CS>>::from_bytes(&request.signature)?;
        signature.verify_with_cache(&pk, &request.messages, &self.cache)
    }

    /// Derives a proof revealing the messages flagged with `reveal`.
    ///
    /// Fails with [`Error::InvalidSignature`] when the signature does not
    /// cover the request messages.
    pub fn create_proof<R>(&self, rng: &mut R, request: &BbsDeriveProofRequest) -> Result<Vec<u8>, Error>
    where
        R: RngCore + CryptoRng,
    {
        let pk = BBSplusPublicKey::from_bytes(&request.public_key)?;
        let signature = Signature::<BBSplus<CS>>::from_bytes(&request.signature)?;

        let (messages, revealed): (Vec<&[u8]>, Vec<bool>) = request
            .messages
            .iter()
            .map(|m| (m.value.as_slice(), m.reveal))
            .unzip();
        let disclosed_indexes: Vec<usize> = revealed
            .iter()
            .enumerate()
            .filter_map(|(i, &reveal)| reveal.then_some(i))
            .collect();

        let proof = PoKSignature::<BBSplus<CS>>::proof_gen_with_cache(
            rng,
            &pk,
            &signature,
            &messages,
            &disclosed_indexes,
            Some(request.presentation_message.as_slice()),
            &self.cache,
        )?;

        Ok(proof.to_bytes())
    }

    /// Only a non numeric key in `request.messages` is an error, every other
    /// problem is reported as `verified: false`.
    pub fn verify_proof(&self, request: &BbsVerifyProofRequest) -> Result<BbsVerifyResponse, Error> {
        let mut revealed: Vec<(usize, &[u8])> = request
            .messages
            .iter()
            .map(|(key, value)| {
                key.parse::<usize>()
                    .map(|i| (i, value.as_slice()))
                    .map_err(|_| Error::InvalidRequest(format!("message index '{}' is not a number", key)))
            })
            .collect::<Result<_, _>>()?;
        revealed.sort_by_key(|(i, _)| *i);

        let (indexes, messages): (Vec<usize>, Vec<&[u8]>) = revealed.into_iter().unzip();

        Ok(BbsVerifyResponse::from_result(self.try_verify_proof(
            request,
            &indexes,
            &messages,
        )))
    }

    fn try_verify_proof(&self, request: &BbsVerifyProofRequest, indexes: &[usize], messages: &[&[u8]]) -> Result<(), Error> {
        let pk = BBSplusPublicKey::from_bytes(&request.public_key)?;
        let proof = PoKSignature::<BBSplus<CS>>::from_bytes(&request.proof)?;

        proof.proof_verify_with_cache(
            &pk,
            messages,
            indexes,
            request.total_message_count,
            Some(request.presentation_message.as_slice()),
            &self.cache,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbsplus::ciphersuites::{Bls12381Sha256, Bls12381Shake256};
    use rand::{rngs::StdRng, SeedableRng};

    const SEED: &[u8] = b"H297BpoOgkfpXcxr1fJyQRiNx1+ZekeQ+OU/AYV/lVxaPXXhFBIbxeIU8kIAAX68cwQ=";

    fn messages() -> Vec<Vec<u8>> {
        vec![b"message1".to_vec(), b"message2".to_vec(), b"message3".to_vec()]
    }

    fn signed<CS: BbsCiphersuite>(api: &BbsApi<CS>, rng: &mut StdRng) -> (BbsKeyPair, Vec<u8>) {
        let key_pair = api.generate_key_pair(rng, Some(SEED), None).unwrap();
        let signature = api
            .sign(
                rng,
                &BbsSignRequest {
                    secret_key: key_pair.secret_key.clone().unwrap(),
                    messages: messages(),
                },
            )
            .unwrap();
        (key_pair, signature)
    }

    fn sign_verify_and_prove<CS: BbsCiphersuite>() {
        let api = BbsApi::<CS>::new();
        let mut rng = StdRng::seed_from_u64(20);
        let (key_pair, signature) = signed(&api, &mut rng);

        assert_eq!(key_pair.public_key.len(), 96);
        assert_eq!(key_pair.secret_key.as_ref().map(Vec::len), Some(32));
        assert_eq!(signature.len(), 112);

        let response = api.verify(&BbsVerifyRequest {
            public_key: key_pair.public_key.clone(),
            messages: messages(),
            signature: signature.clone(),
        });
        assert_eq!(response, BbsVerifyResponse { verified: true, error: None });

        let proof = api
            .create_proof(
                &mut rng,
                &BbsDeriveProofRequest {
                    public_key: key_pair.public_key.clone(),
                    messages: messages()
                        .into_iter()
                        .enumerate()
                        .map(|(i, value)| BbsDeriveProofRevealMessageRequest { reveal: i != 1, value })
                        .collect(),
                    signature,
                    presentation_message: b"nonce".to_vec(),
                },
            )
            .unwrap();

        let response = api
            .verify_proof(&BbsVerifyProofRequest {
                public_key: key_pair.public_key,
                proof,
                presentation_message: b"nonce".to_vec(),
                total_message_count: 3,
                messages: HashMap::from([
                    ("2".to_owned(), b"message3".to_vec()),
                    ("0".to_owned(), b"message1".to_vec()),
                ]),
            })
            .unwrap();
        assert!(response.verified);
    }

    #[test]
    fn round_trip_sha256() {
        sign_verify_and_prove::<Bls12381Sha256>();
    }

    #[test]
    fn round_trip_shake256() {
        sign_verify_and_prove::<Bls12381Shake256>();
    }

    #[test]
    fn seeded_key_pairs_are_deterministic() {
        let api = BbsApi::<Bls12381Sha256>::new();
        let mut rng = StdRng::seed_from_u64(21);
        let a = api.generate_key_pair(&mut rng, Some(SEED), None).unwrap();
        let b = api.generate_key_pair(&mut rng, Some(SEED), None).unwrap();
        assert_eq!(a, b);

        let c = api.generate_key_pair(&mut rng, None, None).unwrap();
        assert_ne!(a.public_key, c.public_key);

        let short = api.generate_key_pair(&mut rng, Some(b"short".as_slice()), None).unwrap();
        assert_eq!(short, api.generate_key_pair(&mut rng, Some(b"short".as_slice()), None).unwrap());
        assert_ne!(short.public_key, a.public_key);

        let empty = api.generate_key_pair(&mut rng, Some(b"".as_slice()), None).unwrap();
        assert_ne!(empty.public_key, short.public_key);

        let with_info = api
            .generate_key_pair(&mut rng, Some(b"short".as_slice()), Some(b"key-info".as_slice()))
            .unwrap();
        assert_ne!(with_info.public_key, short.public_key);
    }

    #[test]
    fn verify_with_many_keys_keeps_the_cache_bounded() {
        let api = BbsApi::<Bls12381Sha256>::with_cache_config(GeneratorCacheConfig::new(16, 1024));
        let mut rng = StdRng::seed_from_u64(25);

        for _ in 0..40 {
            let key_pair = api.generate_key_pair(&mut rng, None, None).unwrap();
            let signature = api
                .sign(
                    &mut rng,
                    &BbsSignRequest {
                        secret_key: key_pair.secret_key.clone().unwrap(),
                        messages: messages(),
                    },
                )
                .unwrap();
            let response = api.verify(&BbsVerifyRequest {
                public_key: key_pair.public_key,
                messages: messages(),
                signature,
            });
            assert!(response.verified);
            assert!(api.cache().len() <= 16);
        }
    }

    #[test]
    fn malformed_inputs_are_not_verified() {
        let api = BbsApi::<Bls12381Sha256>::new();
        let mut rng = StdRng::seed_from_u64(22);
        let (key_pair, signature) = signed(&api, &mut rng);

        let request = BbsVerifyRequest {
            public_key: key_pair.public_key.clone(),
            messages: messages(),
            signature: signature.clone(),
        };

        let short_signature = BbsVerifyRequest {
            signature: signature[..24].to_vec(),
            ..request.clone()
        };
        let response = api.verify(&short_signature);
        assert!(!response.verified);
        assert!(response.error.is_some());

        let short_key = BbsVerifyRequest {
            public_key: vec![1u8; 20],
            ..request.clone()
        };
        assert!(!api.verify(&short_key).verified);

        let no_messages = BbsVerifyRequest {
            messages: Vec::new(),
            ..request.clone()
        };
        assert!(!api.verify(&no_messages).verified);

        let other_key = api.generate_key_pair(&mut rng, None, None).unwrap();
        let wrong_key = BbsVerifyRequest {
            public_key: other_key.public_key,
            ..request
        };
        assert!(!api.verify(&wrong_key).verified);
    }

    #[test]
    fn request_errors() {
        let api = BbsApi::<Bls12381Sha256>::new();
        let mut rng = StdRng::seed_from_u64(23);
        let (key_pair, signature) = signed(&api, &mut rng);

        assert!(api
            .sign(
                &mut rng,
                &BbsSignRequest {
                    secret_key: vec![0u8; 31],
                    messages: messages(),
                },
            )
            .is_err());

        let tampered = BbsDeriveProofRequest {
            public_key: key_pair.public_key.clone(),
            messages: vec![BbsDeriveProofRevealMessageRequest {
                reveal: true,
                value: b"message1".to_vec(),
            }],
            signature,
            presentation_message: Vec::new(),
        };
        assert_eq!(api.create_proof(&mut rng, &tampered), Err(Error::InvalidSignature));

        let response = api.verify_proof(&BbsVerifyProofRequest {
            public_key: key_pair.public_key,
            proof: vec![0u8; 10],
            presentation_message: Vec::new(),
            total_message_count: 3,
            messages: HashMap::from([("first".to_owned(), b"message1".to_vec())]),
        });
        assert!(matches!(response, Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn malformed_proof_is_not_verified() {
        let api = BbsApi::<Bls12381Sha256>::new();
        let mut rng = StdRng::seed_from_u64(24);
        let (key_pair, _) = signed(&api, &mut rng);

        let response = api
            .verify_proof(&BbsVerifyProofRequest {
                public_key: key_pair.public_key,
                proof: vec![0u8; 10],
                presentation_message: Vec::new(),
                total_message_count: 3,
                messages: HashMap::new(),
            })
            .unwrap();
        assert!(!response.verified);
    }

    #[test]
    fn requests_use_camel_case() {
        let request = BbsVerifyProofRequest {
            public_key: vec![1],
            proof: vec![2],
            presentation_message: vec![3],
            total_message_count: 4,
            messages: HashMap::from([("0".to_owned(), vec![5])]),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["publicKey"], serde_json::json!([1]));
        assert_eq!(json["presentationMessage"], serde_json::json!([3]));
        assert_eq!(json["totalMessageCount"], serde_json::json!(4));

        let decoded: BbsVerifyProofRequest = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, request);

        let key_pair: BbsKeyPair = serde_json::from_str(r#"{"publicKey":[7],"secretKey":null}"#).unwrap();
        assert_eq!(key_pair.secret_key, None);
    }
}
