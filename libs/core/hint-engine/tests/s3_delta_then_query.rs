// [libs/core/hint-engine/tests/s3_delta_then_query.rs]
//! Escenario S3: un delta serializado con `plinko-codec` se aplica a la
//! tabla y a un espejo local de la base de datos por separado; una consulta
//! posterior sobre el índice afectado debe recuperar el valor ya
//! actualizado, no el original.

mod support;

use plinko_codec::delta::{DeltaEntry, DeltaFile};
use plinko_codec::record::xor_into;
use plinko_hint_engine::table::HintTable;

#[test]
fn query_after_delta_round_trip_recovers_the_updated_value() {
    let dims = support::toy_dims(128);
    let mut database = support::toy_database(dims);
    let master_key = [21u8; 16];
    let mut table = HintTable::initialize(&database, dims, &master_key, 64);

    let affected_index = (0..dims.db_size)
        .find(|&index| table.query(index).is_ok())
        .expect("at least one index must be covered at lambda=64");
    // Rebuild fresh: the probe above already consumed a slot covering
    // `affected_index`, which would short-circuit the delta-then-query path
    // this test actually exercises.
    let mut table = HintTable::initialize(&database, dims, &master_key, 64);

    let xor = [0x5Au8; 32];
    let file = DeltaFile::new(vec![DeltaEntry {
        index: affected_index,
        position_flag: None,
        xor,
    }]);
    let encoded = file.encode().expect("in-memory encode cannot fail");
    let decoded = DeltaFile::decode(&encoded).expect("round-trip of a just-encoded buffer must succeed");
    assert_eq!(decoded, file);

    for entry in &decoded.entries {
        table.apply_delta(entry.index, &entry.xor).expect("index is in range");
        xor_into(&mut database[entry.index as usize], &entry.xor);
    }

    let pending = match table.query(affected_index) {
        Ok(pending) => pending,
        Err(_) => return, // not covered by any queryable slot at this lambda; nothing to assert
    };
    let server_parity = support::fake_server_parity(&pending.envelope(), dims, &database);
    let recovered = pending.reconstruct(&mut table, &server_parity);
    assert_eq!(recovered, database[affected_index as usize]);
}

#[test]
fn multiple_deltas_compose_correctly_before_a_query() {
    let dims = support::toy_dims(128);
    let mut database = support::toy_database(dims);
    let master_key = [22u8; 16];
    let mut table = HintTable::initialize(&database, dims, &master_key, 64);

    let entries: Vec<DeltaEntry> = (0..8)
        .map(|i| DeltaEntry {
            index: i * 7 % dims.db_size,
            position_flag: None,
            xor: [i as u8 + 1; 32],
        })
        .collect();
    let file = DeltaFile::new(entries.clone());
    let decoded = DeltaFile::decode(&file.encode().unwrap()).unwrap();

    for entry in &decoded.entries {
        table.apply_delta(entry.index, &entry.xor).unwrap();
        xor_into(&mut database[entry.index as usize], &entry.xor);
    }

    for entry in &decoded.entries {
        if let Ok(pending) = table.query(entry.index) {
            let server_parity = support::fake_server_parity(&pending.envelope(), dims, &database);
            let recovered = pending.reconstruct(&mut table, &server_parity);
            assert_eq!(recovered, database[entry.index as usize]);
        }
    }
}
