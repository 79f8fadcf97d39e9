// [libs/core/hint-engine/tests/property_delta_query_interleaving.rs]
//! Propiedad 7: para cualquier intercalado de deltas y consultas, una
//! ranura consultada siempre reconstruye el valor que su espejo local de
//! la base de datos tiene en ese momento — nunca el valor previo a un
//! delta que ya fue aplicado, ni uno posterior a uno que todavía no llegó.

mod support;

use plinko_codec::record::xor_into;
use plinko_hint_engine::table::HintTable;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Delta { index: u64, xor: [u8; 32] },
    Query { index: u64 },
}

fn step_strategy(db_size: u64) -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..db_size, prop::array::uniform32(any::<u8>())).prop_map(|(index, xor)| Step::Delta { index, xor }),
        (0..db_size).prop_map(|index| Step::Query { index }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn interleaved_deltas_and_queries_always_reconstruct_the_current_value(
        steps in prop::collection::vec(step_strategy(64), 1..40),
    ) {
        let dims = support::toy_dims(64);
        let mut database = support::toy_database(dims);
        let master_key = [41u8; 16];
        let mut table = HintTable::initialize(&database, dims, &master_key, 8);

        for step in steps {
            match step {
                Step::Delta { index, xor } => {
                    table.apply_delta(index, &xor).unwrap();
                    xor_into(&mut database[index as usize], &xor);
                }
                Step::Query { index } => {
                    if let Ok(pending) = table.query(index) {
                        let server_parity = support::fake_server_parity(&pending.envelope(), dims, &database);
                        let recovered = pending.reconstruct(&mut table, &server_parity);
                        prop_assert_eq!(recovered, database[index as usize]);
                    }
                }
            }
        }
    }
}
