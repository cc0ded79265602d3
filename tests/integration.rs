/// Integration tests for mcdmanager

use mcdmanager::format::constants::*;
use mcdmanager::*;
use proptest::prelude::*;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::thread;

/// A save file as written to a card: directory frame followed by its blocks
fn save_file(country: &str, product: &str, identifier: &str, payload: &[u8]) -> Vec<u8> {
    let frame = DirectoryFrame::for_file(country, product, identifier, payload.len() as u32);
    let mut data = frame.encode().to_vec();
    data.extend_from_slice(payload);
    data
}

fn filled(blocks: usize, value: u8) -> Vec<u8> {
    vec![value; blocks * BLOCK_SIZE]
}

fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[test]
fn test_blank_card_round_trip() {
    let card = MemoryCard::blank();
    let bytes = card.encode();

    assert_eq!(bytes.len(), CARD_SIZE);
    assert_eq!(
        sha256_hex(&bytes),
        "ac0dbcb89e54bcddf7c698fb6fe52cb0ca71977dba2d28e521d6ed556c7a11b5"
    );

    let decoded = MemoryCard::decode(&bytes).expect("Failed to decode blank card");
    assert_eq!(decoded.count_files(), 0);
    assert!(decoded.is_valid());
    assert_eq!(decoded.encode(), bytes);
}

#[test]
fn test_empty_writer_matches_blank_card() {
    let writer = CardWriter::new();
    let bytes = writer.finish().expect("Failed to finish writer");
    assert_eq!(bytes, MemoryCard::blank().encode());
}

#[test]
fn test_read_dir_scenario() {
    let writer = CardWriter::new();
    writer
        .add_file(&save_file("BE", "SLES-00024", "TOMBRAID", &filled(1, 0x24)))
        .expect("Failed to add TOMBRAID");
    writer
        .add_file(&save_file("BE", "SCES-01237", "TEKKEN-3", &filled(1, 0x37)))
        .expect("Failed to add TEKKEN-3");

    let reader = CardReader::from_bytes(&writer.finish().unwrap()).expect("Failed to read card");
    let entries = reader.read_dir(".").expect("Failed to list root");

    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["BESCES-01237TEKKEN-3", "BESLES-00024TOMBRAID"]);

    for entry in &entries {
        let meta = entry.metadata().expect("Failed to stat entry");
        assert!(meta.size > 0);
        assert!(!meta.is_dir());

        match reader.open(&entry.name).expect("Failed to open entry") {
            OpenEntry::File(mut file) => {
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                assert_eq!(data.len() as u64, meta.size);
            }
            OpenEntry::Dir(_) => panic!("{} should be a file", entry.name),
        }
    }
}

#[test]
fn test_writer_reader_round_trip() {
    let payloads = [
        ("SLES-00024", "TOMBRAID", filled(1, 0x11)),
        ("SCES-01237", "TEKKEN-3", filled(3, 0x22)),
        ("SCUS-94163", "FF7", filled(2, 0x33)),
    ];

    let writer = CardWriter::new();
    for (product, identifier, payload) in &payloads {
        writer
            .add_file(&save_file("BA", product, identifier, payload))
            .expect("Failed to add file");
    }
    assert_eq!(writer.free_blocks(), NUM_BLOCKS - 6);

    let reader = CardReader::from_bytes(&writer.finish().unwrap()).unwrap();
    assert_eq!(reader.card().count_files(), 3);
    assert_eq!(reader.info().free_blocks, NUM_BLOCKS - 6);

    for ((product, identifier, payload), file) in payloads.iter().zip(reader.files()) {
        assert_eq!(&file.product_code, product);
        assert_eq!(&file.identifier, identifier);

        let content = reader.read_file(&file.name).unwrap();
        assert_eq!(&content[FRAME_SIZE..], payload.as_slice());
        assert_eq!(
            reader.card().chain(file.block).unwrap().len(),
            payload.len().div_ceil(BLOCK_SIZE)
        );
    }
}

#[test]
fn test_capacity_boundary() {
    let writer = CardWriter::new();
    writer
        .add_file(&save_file("BE", "SLES-00001", "BIG", &filled(13, 1)))
        .unwrap();

    let result = writer.add_file(&save_file("BE", "SLES-00002", "TOOBIG", &filled(3, 2)));
    assert!(matches!(
        result,
        Err(McdError::NoFreeSpace {
            needed: 3,
            available: 2
        })
    ));

    let card = MemoryCard::decode(&writer.finish().unwrap()).unwrap();
    assert_eq!(card.count_files(), 1);
    assert_eq!(card.free_blocks(), 2);
    assert!(card.blocks()[13].is_blank());
}

#[test]
fn test_duplicate_name_rejected() {
    let writer = CardWriter::new();
    let data = save_file("BE", "SLES-00024", "TOMBRAID", &filled(1, 0));

    writer.add_file(&data).unwrap();
    assert!(matches!(
        writer.add_file(&data),
        Err(McdError::DuplicateName(_))
    ));
}

#[test]
fn test_concurrent_duplicate_handles() {
    let writer = CardWriter::new();
    let data = save_file("BE", "SLES-00024", "TOMBRAID", &filled(1, 0));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let file = writer.create_file().unwrap();
            file.append(&data).unwrap();
            file
        })
        .collect();

    let results: Vec<_> = thread::scope(|s| {
        let joins: Vec<_> = handles
            .into_iter()
            .map(|file| s.spawn(move || file.close()))
            .collect();
        joins.into_iter().map(|j| j.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(McdError::DuplicateName(_))))
            .count(),
        1
    );
    assert_eq!(writer.free_blocks(), NUM_BLOCKS - 1);
}

#[test]
fn test_concurrent_writers_fill_card() {
    let writer = CardWriter::new();

    thread::scope(|s| {
        for i in 0..NUM_BLOCKS {
            let writer = &writer;
            s.spawn(move || {
                let data = save_file("BE", &format!("SLES-{:05}", i), "SAVE", &filled(1, i as u8));
                writer.add_file(&data).unwrap();
            });
        }
    });

    assert_eq!(writer.free_blocks(), 0);
    assert!(matches!(
        writer.create_file(),
        Err(McdError::NoFreeSpace { .. })
    ));

    let reader = CardReader::from_bytes(&writer.finish().unwrap()).unwrap();
    assert_eq!(reader.files().len(), NUM_BLOCKS);

    // Every block holds the payload of the file that owns it
    for file in reader.files() {
        let i: u8 = file.product_code[5..].parse().unwrap();
        assert!(reader.card().blocks()[file.block].data().iter().all(|&b| b == i));
    }
}

#[test]
fn test_concurrent_readers() {
    let writer = CardWriter::new();
    for i in 0..5u8 {
        writer
            .add_file(&save_file("BE", &format!("SLES-0000{}", i), "SAVE", &filled(2, i)))
            .unwrap();
    }
    let reader = CardReader::from_bytes(&writer.finish().unwrap()).unwrap();

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                assert_eq!(reader.read_dir(".").unwrap().len(), 5);
                for file in reader.files() {
                    let data = reader.read_file(&file.name).unwrap();
                    assert_eq!(data.len(), FRAME_SIZE + 2 * BLOCK_SIZE);
                }
            });
        }
    });
}

#[test]
fn test_split_golden_digest() {
    let pattern: Vec<u8> = (0..BLOCK_SIZE).map(|i| ((i * 7 + 3) % 251) as u8).collect();

    let first = CardWriter::new();
    first
        .add_file(&save_file("BE", "SCESP00582", "SAVE0001", &pattern))
        .unwrap();
    first
        .add_file(&save_file("BE", "SLES-00024", "TOMBRAID", &filled(2, 0x24)))
        .unwrap();
    first
        .add_file(&save_file("BE", "SCES-00582", "SAVE0002", &filled(1, 0x82)))
        .unwrap();

    let second = CardWriter::new();
    second
        .add_file(&save_file("BE", "SCES-01237", "TEKKEN-3", &filled(1, 0x37)))
        .unwrap();

    let inputs = tempfile::tempdir().unwrap();
    let first_path = inputs.path().join("MemoryCard2-1.mcd");
    let second_path = inputs.path().join("MemoryCard2-2.mcd");
    first.save(&first_path).unwrap();
    second.save(&second_path).unwrap();

    let output = tempfile::tempdir().unwrap();
    let written = split_files(
        output.path(),
        &[&first_path, &second_path],
        &SplitOptions::default(),
    )
    .expect("Failed to split cards");
    assert_eq!(written.len(), 3);

    let sces = std::fs::read(output.path().join("SCES-00582").join("SCES-00582-1.mcd")).unwrap();
    assert_eq!(
        sha256_hex(&sces),
        "46789266a6ef673286c9b7e89724397d53fe76f458d530a6614c74b216c406e2"
    );

    assert!(output.path().join("SLES-00024/SLES-00024-1.mcd").is_file());
    assert!(output.path().join("SCES-01237/SCES-01237-1.mcd").is_file());

    // Splitting again takes the next channel
    split_files(output.path(), &[&first_path], &SplitOptions::default()).unwrap();
    let again = std::fs::read(output.path().join("SCES-00582").join("SCES-00582-2.mcd")).unwrap();
    assert_eq!(again, sces);
}

#[test]
fn test_sniff_and_open_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("card.mcr");

    let writer = CardWriter::new();
    writer
        .add_file(&save_file("BE", "SLES-00024", "TOMBRAID", &filled(1, 0x24)))
        .unwrap();
    writer.save(&path).unwrap();

    assert!(is_mcd_file(&path));
    assert!(sniff_file(&path).unwrap());

    let reader = CardReader::open_path(&path).unwrap();
    assert_eq!(reader.files()[0].name, "BESLES-00024TOMBRAID");
}

#[test]
fn test_corrupt_first_link_checksum() {
    let mut bytes = {
        let writer = CardWriter::new();
        writer
            .add_file(&save_file("BE", "SLES-00024", "TOMBRAID", &filled(1, 0)))
            .unwrap();
        writer.finish().unwrap()
    };
    bytes[DIRECTORY_FRAME_OFFSET + DIR_IDENTIFIER_OFFSET] ^= 0x20;

    assert!(matches!(
        MemoryCard::decode(&bytes),
        Err(McdError::BadChecksum {
            frame: "directory",
            ..
        })
    ));
}

proptest! {
    #[test]
    fn prop_writer_reader_round_trip(
        files in prop::collection::vec((1usize..=3, any::<u8>()), 1..=5)
    ) {
        let writer = CardWriter::new();
        for (i, (blocks, value)) in files.iter().enumerate() {
            let data = save_file("BE", &format!("SLES-{:05}", i), "SAVE", &filled(*blocks, *value));
            writer.add_file(&data).unwrap();
        }

        let reader = CardReader::from_bytes(&writer.finish().unwrap()).unwrap();
        prop_assert_eq!(reader.files().len(), files.len());
        prop_assert_eq!(reader.read_dir(".").unwrap().len(), reader.card().count_files());

        for ((blocks, value), file) in files.iter().zip(reader.files()) {
            let content = reader.read_file(&file.name).unwrap();
            prop_assert_eq!(content.len(), FRAME_SIZE + blocks * BLOCK_SIZE);
            prop_assert!(content[FRAME_SIZE..].iter().all(|b| b == value));
            prop_assert_eq!(reader.card().chain(file.block).unwrap().len(), *blocks);
        }
    }

    #[test]
    fn prop_decodable_cards_reencode_identically(
        offset in 0usize..BLOCK_SIZE,
        value in any::<u8>()
    ) {
        let mut bytes = MemoryCard::blank().encode();
        bytes[offset] = value;

        if let Ok(card) = MemoryCard::decode(&bytes) {
            prop_assert_eq!(card.encode(), bytes);
        }
    }

    #[test]
    fn prop_checksum_is_idempotent(identifier in "[A-Z0-9]{0,8}", size in 1u32..16) {
        let mut frame = DirectoryFrame::for_file("BE", "SLES-00024", &identifier, size * BLOCK_SIZE as u32);
        let once = frame.compute_checksum();
        frame.update_checksum();
        prop_assert_eq!(frame.checksum, once);
        prop_assert_eq!(frame.compute_checksum(), once);
        prop_assert!(frame.has_valid_checksum());
    }
}
