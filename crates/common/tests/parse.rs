//! Integration tests for parsing sync metadata on behalf of an identity

mod common;

use ::common::crypto::{Iv, SecretShare, SymmetricKey};
use ::common::fetch::Access;
use ::common::keystore::{FileKeyStore, KeyStoreError, UnwrapError};
use ::common::sync_metadata::{parse, types, Context, Identity, MatchPolicy, SyncMetadata};
use ::common::tlv::{DecodeError, Encoder};
use crate::common::Party;
use proptest::prelude::*;

const POLICIES: [MatchPolicy; 2] = [MatchPolicy::MatchAndStop, MatchPolicy::ValidateAll];

#[test]
fn test_alice_shares_with_bob_and_carol() {
    common::init_tracing();

    let alice = Party::new("alice");
    let bob = Party::new("bob");
    let carol = Party::new("carol");
    let dave = Party::new("dave");

    let key = SymmetricKey::generate();
    let iv = Iv::generate();
    let bytes = common::seal_for("/alice/photos/img1.jpg", &key, Some(iv), &[&bob, &carol]);

    for policy in POLICIES {
        for reader in [&bob, &carol] {
            let store = reader.key_store();
            let ctx = Context::new(&reader.identity, &store).with_policy(policy);
            let request = parse(&bytes, &ctx).unwrap();
            assert_eq!(request.name(), "/alice/photos/img1.jpg");
            assert_eq!(request.key(), Some(&key));
            assert_eq!(request.iv(), Some(&iv));
        }

        // neither the publisher nor a stranger is listed
        for outsider in [&alice, &dave] {
            let store = outsider.key_store();
            let ctx = Context::new(&outsider.identity, &store).with_policy(policy);
            let request = parse(&bytes, &ctx).unwrap();
            assert_eq!(request.name(), "/alice/photos/img1.jpg");
            assert_eq!(request.access(), &Access::NotAuthorized);
            assert!(request.key().is_none());
        }
    }
}

#[test]
fn test_entries_without_iv() {
    let bob = Party::new("bob");
    let key = SymmetricKey::from_slice(&[5u8; 16]).unwrap();
    let bytes = common::seal_for("/a", &key, None, &[&bob]);

    let store = bob.key_store();
    for policy in POLICIES {
        let ctx = Context::new(&bob.identity, &store).with_policy(policy);
        let request = parse(&bytes, &ctx).unwrap();
        assert_eq!(request.key(), Some(&key));
        assert!(request.iv().is_none());
    }
}

#[test]
fn test_mixed_iv_shapes() {
    let bob = Party::new("bob");
    let carol = Party::new("carol");
    let key = SymmetricKey::generate();
    let iv = Iv::generate();

    let mut metadata = SyncMetadata::seal(
        "/mixed",
        &key,
        Some(iv),
        &[
            (bob.identity.name.clone(), bob.secret.public()),
            (carol.identity.name.clone(), carol.secret.public()),
        ],
    )
    .unwrap();
    metadata.recipients[0].iv = None;
    let bytes = metadata.encode();

    let bob_store = bob.key_store();
    let carol_store = carol.key_store();
    for policy in POLICIES {
        let request = parse(
            &bytes,
            &Context::new(&bob.identity, &bob_store).with_policy(policy),
        )
        .unwrap();
        assert!(request.iv().is_none());

        let request = parse(
            &bytes,
            &Context::new(&carol.identity, &carol_store).with_policy(policy),
        )
        .unwrap();
        assert_eq!(request.iv(), Some(&iv));
    }
}

#[test]
fn test_truncated_input() {
    let bob = Party::new("bob");
    let bytes = common::seal_for("/a/b/c", &SymmetricKey::generate(), None, &[&bob]);
    let store = bob.key_store();

    for policy in POLICIES {
        let ctx = Context::new(&bob.identity, &store).with_policy(policy);
        for len in 0..bytes.len() {
            let err = parse(&bytes[..len], &ctx).unwrap_err();
            assert!(
                matches!(err, DecodeError::Truncated { .. }),
                "prefix of {} bytes gave {:?}",
                len,
                err
            );
        }
    }
}

#[test]
fn test_entry_overruns_metadata() {
    // 999 declares 6 bytes; the entry inside claims 10
    let bytes = [
        0xFD, 0x03, 0xE7, 0x06, 0x68, 0x0A, 0x65, 0x01, b'b', 0x00,
    ];
    let bob = Party::new("bob");
    let store = bob.key_store();

    for policy in POLICIES {
        let ctx = Context::new(&bob.identity, &store).with_policy(policy);
        assert!(matches!(
            parse(&bytes, &ctx),
            Err(DecodeError::Truncated { .. })
        ));
    }
}

#[test]
fn test_schema_mismatch() {
    let mut encoder = Encoder::new();
    encoder.write_nested(types::RECIPIENT_ENTRY, |entry| {
        entry.write_blob(types::RECIPIENT_ID, b"bob");
    });

    let bob = Party::new("bob");
    let store = bob.key_store();
    let err = parse(encoder.as_bytes(), &Context::new(&bob.identity, &store)).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::SchemaMismatch {
            expected: 999,
            actual: 104
        }
    ));
}

#[test]
fn test_unrecognized_type_before_match() {
    let bob = Party::new("bob");
    let key = SymmetricKey::generate();
    let share: Vec<u8> = SecretShare::new(&key, &bob.secret.public()).unwrap().into();

    let mut encoder = Encoder::new();
    encoder.write_nested(types::SYNC_METADATA, |metadata| {
        metadata.write_blob(types::NAME, b"/a");
        metadata.write_blob(42, b"unknown");
        metadata.write_nested(types::RECIPIENT_ENTRY, |entry| {
            entry.write_blob(types::RECIPIENT_ID, b"bob");
            entry.write_blob(types::WRAPPED_KEY, &share);
        });
    });

    let store = bob.key_store();
    for policy in POLICIES {
        let ctx = Context::new(&bob.identity, &store).with_policy(policy);
        let err = parse(encoder.as_bytes(), &ctx).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnrecognizedType { actual: 42, .. }
        ));
    }
}

#[test]
fn test_missing_name() {
    let bob = Party::new("bob");
    let key = SymmetricKey::generate();
    let share: Vec<u8> = SecretShare::new(&key, &bob.secret.public()).unwrap().into();

    let mut encoder = Encoder::new();
    encoder.write_nested(types::SYNC_METADATA, |metadata| {
        metadata.write_nested(types::RECIPIENT_ENTRY, |entry| {
            entry.write_blob(types::RECIPIENT_ID, b"bob");
            entry.write_blob(types::WRAPPED_KEY, &share);
        });
    });

    let store = bob.key_store();
    for policy in POLICIES {
        let ctx = Context::new(&bob.identity, &store).with_policy(policy);
        assert!(matches!(
            parse(encoder.as_bytes(), &ctx),
            Err(DecodeError::MissingField(100))
        ));
    }
}

#[test]
fn test_first_matching_entry_wins() {
    let bob = Party::new("bob");
    let key = SymmetricKey::generate();
    let other = SymmetricKey::generate();

    let mut metadata = SyncMetadata::seal(
        "/dup",
        &key,
        None,
        &[
            (bob.identity.name.clone(), bob.secret.public()),
            (bob.identity.name.clone(), bob.secret.public()),
        ],
    )
    .unwrap();
    // the second entry wraps a different key
    metadata.recipients[1].wrapped_key = SecretShare::new(&other, &bob.secret.public())
        .unwrap()
        .into();
    let bytes = metadata.encode();

    let store = bob.key_store();
    for policy in POLICIES {
        let ctx = Context::new(&bob.identity, &store).with_policy(policy);
        assert_eq!(parse(&bytes, &ctx).unwrap().key(), Some(&key));
    }
}

#[test]
fn test_key_not_in_store() {
    let bob = Party::new("bob");
    let bytes = common::seal_for("/a", &SymmetricKey::generate(), None, &[&bob]);

    // bob is listed, but his store holds someone else's key name
    let store = Party::new("eve").key_store();
    let err = parse(&bytes, &Context::new(&bob.identity, &store)).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::KeyUnwrapFailed(UnwrapError::KeyStore(KeyStoreError::NotFound(name)))
            if name == "/bob/KEY/1"
    ));
}

#[test]
fn test_wrapped_key_for_someone_else() {
    let bob = Party::new("bob");
    let mallory = Party::new("mallory");
    let key = SymmetricKey::generate();

    // an entry labelled bob, but wrapped against mallory's key
    let mut metadata = SyncMetadata::new("/a");
    metadata.add_recipient(::common::sync_metadata::RecipientEntry {
        recipient: "bob".to_string(),
        wrapped_key: SecretShare::new(&key, &mallory.secret.public())
            .unwrap()
            .into(),
        iv: None,
    });

    let store = bob.key_store();
    let err = parse(&metadata.encode(), &Context::new(&bob.identity, &store)).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::KeyUnwrapFailed(UnwrapError::Share(_))
    ));
}

#[test]
fn test_malformed_wrapped_key() {
    let bob = Party::new("bob");
    let mut metadata = SyncMetadata::new("/a");
    metadata.add_recipient(::common::sync_metadata::RecipientEntry {
        recipient: "bob".to_string(),
        wrapped_key: vec![0xAB; 20],
        iv: None,
    });

    let store = bob.key_store();
    let err = parse(&metadata.encode(), &Context::new(&bob.identity, &store)).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::KeyUnwrapFailed(UnwrapError::Share(_))
    ));
}

#[test]
fn test_parse_with_file_key_store() {
    let tmp = tempfile::tempdir().unwrap();
    let bob = Party::new("bob");
    let store = FileKeyStore::new(tmp.path().join("keys"));
    store.insert(&bob.identity.key_name, &bob.secret).unwrap();

    let key = SymmetricKey::generate();
    let bytes = common::seal_for("/a", &key, None, &[&bob]);

    let request = parse(&bytes, &Context::new(&bob.identity, &store)).unwrap();
    assert_eq!(request.key(), Some(&key));
}

#[test]
fn test_parse_through_trait_object() {
    let bob = Party::new("bob");
    let store = bob.key_store();
    let dyn_store: &dyn ::common::keystore::KeyStore = &store;

    let key = SymmetricKey::generate();
    let bytes = common::seal_for("/a", &key, None, &[&bob]);

    let identity = Identity::new("bob", "/bob/KEY/1");
    let request = parse(&bytes, &Context::new(&identity, dyn_store)).unwrap();
    assert!(request.is_authorized());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_every_recipient_recovers_the_key(
        name in "/[a-z0-9]{1,12}(/[a-z0-9._-]{1,12}){0,4}",
        recipients in prop::collection::btree_set("[a-z]{1,10}", 1..6),
        with_iv in any::<bool>(),
    ) {
        let parties: Vec<Party> = recipients.iter().map(|r| Party::new(r)).collect();
        let refs: Vec<&Party> = parties.iter().collect();

        let key = SymmetricKey::generate();
        let iv = with_iv.then(Iv::generate);
        let bytes = common::seal_for(&name, &key, iv, &refs);

        for party in &parties {
            let store = party.key_store();
            for policy in POLICIES {
                let ctx = Context::new(&party.identity, &store).with_policy(policy);
                let request = parse(&bytes, &ctx).unwrap();
                prop_assert_eq!(request.name(), name.as_str());
                prop_assert_eq!(request.key(), Some(&key));
                prop_assert_eq!(request.iv(), iv.as_ref());
            }
        }

        // upper-case names never collide with the generated recipients
        let outsider = Party::new("OUTSIDER");
        let store = outsider.key_store();
        let request = parse(&bytes, &Context::new(&outsider.identity, &store)).unwrap();
        prop_assert_eq!(request.name(), name.as_str());
        prop_assert!(request.key().is_none());
    }

    #[test]
    fn prop_decode_keeps_names_and_recipients(
        name in "\\PC{0,64}",
        recipients in prop::collection::vec("\\PC{1,16}", 0..8),
    ) {
        let mut metadata = SyncMetadata::new(name.clone());
        for recipient in &recipients {
            metadata.add_recipient(::common::sync_metadata::RecipientEntry {
                recipient: recipient.clone(),
                wrapped_key: vec![0u8; 72],
                iv: None,
            });
        }

        let decoded = SyncMetadata::decode(&metadata.encode()).unwrap();
        prop_assert_eq!(decoded.name, name);
        let decoded_recipients: Vec<String> =
            decoded.recipients.into_iter().map(|e| e.recipient).collect();
        prop_assert_eq!(decoded_recipients, recipients);
    }
}
