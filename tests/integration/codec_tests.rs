//! Public identifiers over stored listings

use crate::common::candidate;
use gig_crawler::codec::{CodecError, IdCodec};
use gig_crawler::ingest::{ingest_batch, IngestOptions};
use gig_crawler::model::PublicRecord;
use gig_crawler::storage::{SqliteStorage, Storage};

#[test]
fn test_public_record_round_trips_to_native_id() {
    let codec = IdCodec::generate();
    let mut store = SqliteStorage::new_in_memory().unwrap();
    ingest_batch(
        &mut store,
        vec![candidate("wishket", "https://www.wishket.com/project/142399", "142399")],
        IngestOptions::default(),
    )
    .unwrap();

    let stored = store.query_all().unwrap().remove(0);
    let public = PublicRecord::from_record(&stored, &codec).unwrap();
    assert_ne!(public.id, "142399");
    assert_ne!(public.id, stored.id.to_string());

    let native = codec.decode(&public.id).unwrap();
    let found = store.find_by_source_id("wishket", &native).unwrap().unwrap();
    assert_eq!(found.id, stored.id);
}

#[test]
fn test_tokens_from_previous_key_are_rejected() {
    let before_restart = IdCodec::generate();
    let token = before_restart.encode("142399").unwrap();

    let after_restart = IdCodec::generate();
    assert!(matches!(after_restart.decode(&token), Err(CodecError::Decode(_))));
}

#[test]
fn test_configured_key_survives_restart() {
    let key = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";
    let token = IdCodec::from_hex(key).unwrap().encode("2045123").unwrap();
    let reloaded = IdCodec::from_hex(key).unwrap();
    assert_eq!(reloaded.decode(&token).unwrap(), "2045123");
}

#[test]
fn test_truncated_and_random_tokens() {
    let codec = IdCodec::generate();
    let token = codec.encode("142399").unwrap();

    assert!(matches!(
        codec.decode(&token[..token.len() - 2]),
        Err(CodecError::Decode(_))
    ));
    assert!(matches!(
        codec.decode("AbCdEfGhIjKlMnOpQrSt"),
        Err(CodecError::Decode(_))
    ));
    assert!(matches!(codec.encode(""), Err(CodecError::InvalidInput(_))));
}
