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

use thiserror::Error;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Error during keypair generation: {0}")]
    KeyGenError(String),
    #[error("Invalid key")]
    KeyDeserializationError,
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
    #[error("Point is not on the curve or not in the prime order subgroup")]
    PointNotOnCurve,
    #[error("Point is the identity element")]
    PointAtInfinity,
    #[error("Error during computation of a Signature: {0}")]
    SignatureGenerationError(String),
    #[error("Not a valid Signature")]
    InvalidSignature,
    #[error("Error during hash to scalar computation")]
    HashToScalarError,
    #[error("Error mapping a message to scalar")]
    MapMessageToScalarError,
    #[error("Not enough Generators")]
    NotEnoughGenerators,
    #[error("Error during deserialization: {0}")]
    DeserializationError(String),
    #[error("Signature is not valid")]
    SignatureVerificationError,
    #[error("Revealed index {0} is out of range")]
    IndexOutOfRange(usize),
    #[error("Error during computation of a Proof of Knowledge of a Signature: {0}")]
    ProofGenError(String),
    #[error("Invalid Proof of Knowledge of a Signature")]
    InvalidProofOfKnowledgeSignature,
    #[error("Proof of Knowledge of a Signature verification failed: {0}")]
    PoKSVerificationError(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
