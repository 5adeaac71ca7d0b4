//! Key rotation racing with lookups and verifications.
//!
//! Readers must only ever observe a complete key set: either the old one or
//! the new one, never a mix and never an empty store.
#![allow(clippy::expect_used, clippy::panic)]

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use common::*;
use ssd_jwt_auth::VerifyError;

const ROTATIONS: usize = 200;
const READERS: usize = 4;

#[test]
fn rotation_never_exposes_a_partial_key_set() {
    let verifier = verifier();
    let k1 = k1_token(&user_payload());
    let k2 = k2_token(&user_payload());
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..ROTATIONS {
                if i % 2 == 0 {
                    verifier
                        .rotate_keys([("k1", K1_PUBLIC), ("k2", K2_PUBLIC)])
                        .expect("rotation to k1+k2");
                } else {
                    verifier
                        .rotate_keys([("k1", K1_PUBLIC)])
                        .expect("rotation to k1");
                }
                if i % 10 == 0 {
                    verifier
                        .rotate_keys([("k1", K1_PUBLIC), ("junk", b"foo".as_slice())])
                        .expect_err("junk rotation is rejected");
                }
            }
            done.store(true, Ordering::SeqCst);
        });

        for _ in 0..READERS {
            s.spawn(|| {
                loop {
                    let finished = done.load(Ordering::SeqCst);

                    verifier.verify(&k1).expect("k1 is always installed");

                    match verifier.verify(&k2) {
                        Ok(claims) => assert_eq!(claims.kid, "k2"),
                        Err(VerifyError::KeyNotFound(err)) => assert_eq!(err.kid, "k2"),
                        Err(other) => panic!("unexpected failure during rotation: {other:?}"),
                    }

                    let ids = verifier.key_ids();
                    assert!(
                        ids == ["k1"] || ids == ["k1", "k2"],
                        "observed key set {ids:?}"
                    );

                    if finished {
                        break;
                    }
                }
            });
        }
    });

    assert_eq!(verifier.key_ids(), vec!["k1".to_string()]);
}

#[test]
fn swapping_the_key_behind_a_kid_is_atomic() {
    let verifier = verifier();
    let token = k1_token(&user_payload());
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..ROTATIONS {
                let public = if i % 2 == 0 { K2_PUBLIC } else { K1_PUBLIC };
                verifier.rotate_keys([("k1", public)]).expect("rotation");
            }
            done.store(true, Ordering::SeqCst);
        });

        for _ in 0..READERS {
            s.spawn(|| {
                loop {
                    let finished = done.load(Ordering::SeqCst);

                    match verifier.verify(&token) {
                        Ok(_) | Err(VerifyError::SignatureInvalid) => {}
                        Err(other) => panic!("unexpected failure during rotation: {other:?}"),
                    }

                    if finished {
                        break;
                    }
                }
            });
        }
    });

    // Last rotation (odd index) restored k1's real key.
    assert!(verifier.verify(&token).is_ok());
}
