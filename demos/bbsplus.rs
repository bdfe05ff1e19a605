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

#[cfg(feature = "bbsplus")]
mod bbsplus_demo {
    use bbs_core::{
        bbsplus::ciphersuites::BbsCiphersuite,
        errors::Error,
        keys::pair::KeyPair,
        schemes::{
            algorithms::{BBSplus, Scheme},
            generics::{PoKSignature, Signature},
        },
        utils::util::get_messages_vec,
    };
    use rand::RngCore;

    pub(crate) fn bbsplus_main<S: Scheme>() -> Result<(), Error>
    where
        S::Ciphersuite: BbsCiphersuite,
    {
        const MSGS: [&str; 3] = [
            "9872ad089e452c7b6e283dfac2a80d58e8d0ff71cc4d5e310a1debdda4a45f02",
            "87a8bd656d49ee07b8110e1d8fd4f1dcef6fb9bc368c492d9bc8c4f98a739ac6",
            "96012096adda3f13dd4adbe4eea481a4c4b5717932b73b00e31807d3c5894b90",
        ];

        log::info!("Messages: {:?}", MSGS);

        let mut rng = rand::thread_rng();

        log::info!("Keypair Generation");
        let issuer_keypair = KeyPair::<BBSplus<S::Ciphersuite>>::random(&mut rng)?;

        let issuer_sk = issuer_keypair.private_key();
        let issuer_pk = issuer_keypair.public_key();
        log::info!("PK: {}", issuer_keypair.encoded_public_key());

        let messages: Vec<Vec<u8>> = MSGS
            .iter()
            .map(|m| hex::decode(m).map_err(|e| Error::DeserializationError(e.to_string())))
            .collect::<Result<_, _>>()?;

        log::info!("Signature Computation...");
        let signature = Signature::<BBSplus<S::Ciphersuite>>::sign(&mut rng, &messages, issuer_sk, issuer_pk)?;

        signature.verify(issuer_pk, &messages)?;
        log::info!("Signature is VALID");

        //Holder receive nonce from Verifier
        let mut nonce_verifier = [0u8; 32];
        rng.fill_bytes(&mut nonce_verifier);
        log::info!("Nonce: {}", hex::encode(nonce_verifier));

        let disclosed_indexes = [0usize, 2usize];

        log::info!("Proof of Knowledge of the Signature Generation...");
        let proof = PoKSignature::<BBSplus<S::Ciphersuite>>::proof_gen(
            &mut rng,
            issuer_pk,
            &signature,
            &messages,
            &disclosed_indexes,
            Some(nonce_verifier.as_slice()),
        )?;
        log::info!("Proof: {} bytes", proof.to_bytes().len());

        //Verifier verifies the proof
        let disclosed_messages = get_messages_vec(&messages, &disclosed_indexes);

        log::info!("Proof of Knowledge of the Signature verification...");
        proof.proof_verify(
            issuer_pk,
            &disclosed_messages,
            &disclosed_indexes,
            messages.len(),
            Some(nonce_verifier.as_slice()),
        )?;
        log::info!("Proof of Knowledge of the Signature is VALID!");

        Ok(())
    }
}

#[cfg(feature = "bbsplus")]
fn main() {
    use crate::bbsplus_demo::bbsplus_main;
    use bbs_core::schemes::algorithms::{BbsBls12381Sha256, BbsBls12381Shake256};
    use std::env;

    dotenvy::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        println!(
            "Usage: {} <cipher_suite>
                Ciphersuites:
                    - BLS12-381-SHA-256
                    - BLS12-381-SHAKE-256",
            args[0]
        );
        return;
    }

    let result = match args[1].as_str() {
        "BLS12-381-SHA-256" => {
            log::info!("Ciphersuite: BLS12-381-SHA-256");
            bbsplus_main::<BbsBls12381Sha256>()
        }
        "BLS12-381-SHAKE-256" => {
            log::info!("Ciphersuite: BLS12-381-SHAKE-256");
            bbsplus_main::<BbsBls12381Shake256>()
        }
        other => {
            println!("Unknown cipher suite: {}", other);
            return;
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
    }
}

#[cfg(not(feature = "bbsplus"))]
fn main() {}
