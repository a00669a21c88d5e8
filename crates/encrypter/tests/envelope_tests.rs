//! End-to-end behaviour of envelopes: round trips, tampering, and compatibility
//! with envelopes already in storage.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use encrypter::{CipherId, DecryptError, Encrypter, EncrypterError, Envelope};
use serde_json::{json, Value};

/// Produced by the previous implementation: AES-128-CBC, key `0123456789abcdef`,
/// plaintext `{"id":7,"name":"alice"}`. Its JSON escapes `/` as `\/`.
const LEGACY_AES_128: &str = "eyJpdiI6IitcL1wvK1B6OFwvUHo4XC9QejhcL1B6OFwvUHc9PSIsInZhbHVlIjoiUEdpMXZ5OXpYVkxVcGxpNmlycmE1U1diTFwvdkdGTjloZEhoMDA3MTJSN0U9IiwibWFjIjoiOTg5MjY2ZDVjMDQ2MmNiOTJkMmJjZTljOTNmODA2MjE1NGE1YTk2NDcwZDAyYmU5NGRhODA3ZTVkOGY1M2IxYSJ9";

fn encrypters() -> Vec<Encrypter> {
    CipherId::ALL
        .into_iter()
        .map(|c| Encrypter::new(vec![0x24; c.key_len()], c).unwrap())
        .collect()
}

fn open(envelope: &str) -> Envelope {
    serde_json::from_slice(&STANDARD.decode(envelope).unwrap()).unwrap()
}

fn seal(envelope: &Envelope) -> String {
    STANDARD.encode(serde_json::to_vec(envelope).unwrap())
}

fn assert_rejected(result: Result<String, EncrypterError>) -> DecryptError {
    match result {
        Err(EncrypterError::Decrypt(e)) => e,
        other => panic!("expected a decrypt-path error, got {other:?}"),
    }
}

/// Flip one byte of the decoded base64 field and re-encode it.
fn flip_b64(field: &str, index: usize) -> String {
    let mut bytes = STANDARD.decode(field).unwrap();
    bytes[index] ^= 0x01;
    STANDARD.encode(bytes)
}

#[test]
fn text_round_trip() {
    for enc in encrypters() {
        for text in ["", "hello", "ünïcødé ✓", &"x".repeat(4096)] {
            let envelope = enc.encrypt_string(text).unwrap();
            assert_eq!(enc.decrypt_string(&envelope).unwrap(), text);
        }
    }
}

#[test]
fn structured_round_trip() {
    let value = json!({
        "user": {"id": 42, "roles": ["a", "b"]},
        "active": true,
        "balance": 12.5,
        "note": null,
    });
    for enc in encrypters() {
        let envelope = enc.encrypt(&value).unwrap();
        assert_eq!(enc.decrypt::<Value>(&envelope).unwrap(), value);

        let mut map = BTreeMap::new();
        map.insert("k".to_string(), vec![1u8, 2, 3]);
        let envelope = enc.encrypt(&map).unwrap();
        assert_eq!(enc.decrypt::<BTreeMap<String, Vec<u8>>>(&envelope).unwrap(), map);
    }
}

#[test]
fn envelopes_are_non_deterministic() {
    for enc in encrypters() {
        let a = enc.encrypt_string("same input").unwrap();
        let b = enc.encrypt_string("same input").unwrap();
        assert_ne!(a, b);
        assert_ne!(open(&a).iv, open(&b).iv);
        assert_eq!(enc.decrypt_string(&a).unwrap(), "same input");
        assert_eq!(enc.decrypt_string(&b).unwrap(), "same input");
    }
}

#[test]
fn envelope_shape() {
    let enc = Encrypter::new([9u8; 32], CipherId::Aes256Cbc).unwrap();
    let envelope = enc.encrypt_string("shape").unwrap();
    let json: Value = serde_json::from_slice(&STANDARD.decode(&envelope).unwrap()).unwrap();
    let obj = json.as_object().unwrap();
    assert_eq!(obj.len(), 3);

    let raw = String::from_utf8(STANDARD.decode(&envelope).unwrap()).unwrap();
    let (iv_at, value_at, mac_at) = (
        raw.find("\"iv\"").unwrap(),
        raw.find("\"value\"").unwrap(),
        raw.find("\"mac\"").unwrap(),
    );
    assert!(iv_at < value_at && value_at < mac_at);

    let env = open(&envelope);
    assert_eq!(STANDARD.decode(&env.iv).unwrap().len(), 16);
    assert_eq!(STANDARD.decode(&env.value).unwrap().len() % 16, 0);
    assert_eq!(env.mac.len(), 64);
}

#[test]
fn tampered_value_rejected() {
    for enc in encrypters() {
        let envelope = enc.encrypt_string("tamper me please").unwrap();
        let original = open(&envelope);
        let len = STANDARD.decode(&original.value).unwrap().len();
        for i in 0..len {
            let mut env = original.clone();
            env.value = flip_b64(&env.value, i);
            let err = assert_rejected(enc.decrypt_string(&seal(&env)));
            assert_eq!(err, DecryptError::InvalidMac);
        }
    }
}

#[test]
fn tampered_iv_rejected() {
    for enc in encrypters() {
        let original = open(&enc.encrypt_string("tamper me").unwrap());
        for i in 0..16 {
            let mut env = original.clone();
            env.iv = flip_b64(&env.iv, i);
            let err = assert_rejected(enc.decrypt_string(&seal(&env)));
            assert_eq!(err, DecryptError::InvalidMac);
        }
    }
}

#[test]
fn tampered_mac_rejected() {
    for enc in encrypters() {
        let original = open(&enc.encrypt_string("tamper me").unwrap());
        for i in 0..original.mac.len() {
            let mut env = original.clone();
            let mut bytes = env.mac.into_bytes();
            bytes[i] ^= 0x01;
            env.mac = String::from_utf8(bytes).unwrap();
            let err = assert_rejected(enc.decrypt_string(&seal(&env)));
            assert_eq!(err, DecryptError::InvalidMac);
        }
    }
}

#[test]
fn key_length_validation() {
    assert!(Encrypter::new(vec![0u8; 15], CipherId::Aes128Cbc).is_err());
    assert!(Encrypter::new(vec![0u8; 16], CipherId::Aes128Cbc).is_ok());
    assert!(Encrypter::new(vec![0u8; 31], CipherId::Aes256Cbc).is_err());
    assert!(Encrypter::new(vec![0u8; 32], CipherId::Aes256Cbc).is_ok());
    assert!(matches!(
        Encrypter::new(vec![0u8; 15], CipherId::Aes128Cbc),
        Err(EncrypterError::UnsupportedConfiguration(_))
    ));
}

#[test]
fn cross_key_rejected_with_mac_error() {
    let k1 = Encrypter::new([1u8; 32], CipherId::Aes256Cbc).unwrap();
    let k2 = Encrypter::new([2u8; 32], CipherId::Aes256Cbc).unwrap();
    let envelope = k1.encrypt_string("for k1 only").unwrap();
    let err = assert_rejected(k2.decrypt_string(&envelope));
    assert_eq!(err, DecryptError::InvalidMac);
}

#[test]
fn malformed_envelopes_are_invalid_payload() {
    let enc = Encrypter::new([0u8; 32], CipherId::Aes256Cbc).unwrap();
    let cases = [
        "%%% not base64 %%%".to_string(),
        STANDARD.encode("this is not json"),
        STANDARD.encode(r#"{"iv":"AAAA","value":"AAAA"}"#),
        STANDARD.encode(r#"{"iv":"AAAA","mac":"00"}"#),
        STANDARD.encode(r#"{"value":"AAAA","mac":"00"}"#),
        STANDARD.encode(r#"["iv","value","mac"]"#),
        STANDARD.encode(r#""just a string""#),
        STANDARD.encode(r#"{"iv":null,"value":"AAAA","mac":"00"}"#),
    ];
    for payload in &cases {
        let err = assert_rejected(enc.decrypt_string(payload));
        assert_eq!(err, DecryptError::InvalidPayload, "payload {payload:?}");
    }
}

#[test]
fn positional_array_envelope_is_invalid_payload() {
    let enc = Encrypter::new([0u8; 32], CipherId::Aes256Cbc).unwrap();
    let env = open(&enc.encrypt_string("hello").unwrap());
    assert_eq!(hmac_hex(&[0u8; 32], &env.iv, &env.value), env.mac);

    let positional = json!([env.iv, env.value, env.mac]);
    let positional = STANDARD.encode(serde_json::to_vec(&positional).unwrap());
    let err = assert_rejected(enc.decrypt_string(&positional));
    assert_eq!(err, DecryptError::InvalidPayload);
}

#[test]
fn authentic_but_undecryptable_is_decryption_failure() {
    let key = [5u8; 32];
    let enc = Encrypter::new(key, CipherId::Aes256Cbc).unwrap();

    // A correctly MACed envelope whose IV is too short for CBC.
    let iv = STANDARD.encode([0u8; 8]);
    let value = STANDARD.encode([0u8; 16]);
    let mac = hmac_hex(&key, &iv, &value);
    let payload = seal(&Envelope { iv, value, mac });

    let err = assert_rejected(enc.decrypt_string(&payload));
    assert_eq!(err, DecryptError::DecryptionFailure);
}

fn hmac_hex(key: &[u8], iv: &str, value: &str) -> String {
    use hmac::{Hmac, Mac};
    let mut mac = <Hmac<sha2::Sha256> as Mac>::new_from_slice(key).unwrap();
    mac.update(iv.as_bytes());
    mac.update(value.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[test]
fn hello_example_and_truncation() {
    let enc = Encrypter::new([0u8; 32], CipherId::Aes256Cbc).unwrap();
    let e = enc.encrypt_string("hello").unwrap();
    assert_eq!(enc.decrypt_string(&e).unwrap(), "hello");

    let truncated = &e[..e.len() - 1];
    assert!(enc.decrypt_string(truncated).unwrap_err().is_decrypt());
}

#[test]
fn legacy_envelope_decrypts() {
    let enc = Encrypter::with_cipher_name(*b"0123456789abcdef", "AES-128-CBC").unwrap();
    let value: Value = enc.decrypt(LEGACY_AES_128).unwrap();
    assert_eq!(value, json!({"id": 7, "name": "alice"}));
}

#[test]
fn legacy_envelope_rejected_under_other_cipher_key() {
    let enc = Encrypter::new([0u8; 32], CipherId::Aes256Cbc).unwrap();
    let err = assert_rejected(enc.decrypt_string(LEGACY_AES_128));
    assert_eq!(err, DecryptError::InvalidMac);
}

#[test]
fn concurrent_use_without_locking() {
    let enc = Encrypter::new([7u8; 32], CipherId::Aes256Cbc).unwrap();
    std::thread::scope(|s| {
        for t in 0..8 {
            let enc = &enc;
            s.spawn(move || {
                for i in 0..50 {
                    let text = format!("thread {t} message {i}");
                    let envelope = enc.encrypt_string(&text).unwrap();
                    assert_eq!(enc.decrypt_string(&envelope).unwrap(), text);
                }
            });
        }
    });
}
