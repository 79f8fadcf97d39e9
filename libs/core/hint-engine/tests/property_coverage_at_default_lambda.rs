// [libs/core/hint-engine/tests/property_coverage_at_default_lambda.rs]
//! Propiedad 8: a λ=64 (`DEFAULT_LAMBDA`), la cobertura inicial de la tabla
//! debe superar el 99.9% del rango declarado, para cualquier base de datos
//! y clave maestra.

mod support;

use plinko_hint_engine::table::{HintTable, DEFAULT_LAMBDA};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn coverage_exceeds_999_per_mille_at_default_lambda(
        db_size in 64u64..2048,
        master_key in prop::array::uniform16(any::<u8>()),
    ) {
        let dims = support::toy_dims(db_size);
        let database = support::toy_database(dims);
        let table = HintTable::initialize(&database, dims, &master_key, DEFAULT_LAMBDA);

        prop_assert!(
            table.coverage_estimate() >= 0.999,
            "coverage {} fell below 99.9% for db_size={}",
            table.coverage_estimate(),
            db_size,
        );
    }
}
