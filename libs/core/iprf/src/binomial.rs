// [libs/core/iprf/src/binomial.rs]
/*!
 * =================================================================
 * APARATO: MUESTREO BINOMIAL SEMBRADO
 * RESPONSABILIDAD: DECIDIR CUÁNTOS DE n' PUNTOS CAEN A LA IZQUIERDA
 *
 * El PMNS necesita, en cada nodo interno de su árbol de bisección, una
 * muestra de Binomial(n', 1/2) sembrada determinísticamente por la clave
 * y el identificador del nodo. Por debajo de 1000 ensayos se cuenta bit
 * a bit (exacto); por encima, se usa la aproximación normal con CDF
 * inversa, que mantiene el costo en O(1) evaluaciones de bloque.
 * =================================================================
 */

use crate::key_derivation::{derive_unit_interval, keyed_block};

/// Umbral de ensayos bajo el cual el conteo exacto de bits es preferible a
/// la aproximación normal.
pub const EXACT_SAMPLING_THRESHOLD: u64 = 1000;

/// Extrae `count` bits pseudoaleatorios sembrados por `(key, tag, fields)` y
/// devuelve cuántos son uno. Cada bloque de 32 bytes aporta 256 bits, así que
/// `count` hasta 1000 requiere a lo sumo 4 llamadas a la función de bloque.
fn count_set_bits(key: &[u8], tag: &[u8], fields: &[u64], count: u64) -> u64 {
    let mut remaining = count;
    let mut block_index: u64 = 0;
    let mut ones = 0u64;

    while remaining > 0 {
        let mut extended_fields = fields.to_vec();
        extended_fields.push(block_index);
        let block = keyed_block(key, tag, &extended_fields);

        let bits_in_block = remaining.min(256);
        for bit_position in 0..bits_in_block {
            let byte = block[(bit_position / 8) as usize];
            let bit = (byte >> (bit_position % 8)) & 1;
            ones += bit as u64;
        }

        remaining -= bits_in_block;
        block_index += 1;
    }

    ones
}

/// Aproximación racional de Acklam de la CDF inversa de la normal estándar.
///
/// Suficiente para fines de muestreo; no pretende precisión de biblioteca
/// numérica de referencia.
fn inverse_standard_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e+01,
        2.209_460_984_245_205e+02,
        -2.759_285_104_469_687e+02,
        1.383_577_518_672_690e+02,
        -3.066_479_806_614_716e+01,
        2.506_628_277_459_239e+00,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e+01,
        1.615_858_368_580_409e+02,
        -1.556_989_798_598_866e+02,
        6.680_131_188_771_972e+01,
        -1.328_068_155_288_572e+01,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-03,
        -3.223_964_580_411_365e-01,
        -2.400_758_277_161_838e+00,
        -2.549_732_539_343_734e+00,
        4.374_664_141_464_968e+00,
        2.938_163_982_698_783e+00,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-03,
        3.224_671_290_700_398e-01,
        2.445_134_137_142_996e+00,
        3.754_408_661_907_416e+00,
    ];

    let p_low = 0.02425;
    let p_high = 1.0 - p_low;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < p_low {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= p_high {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

/// Muestra `Binomial(trials, 1/2)` sembrado por `(key, tag, fields)`,
/// alternando entre conteo exacto de bits y aproximación normal según
/// `EXACT_SAMPLING_THRESHOLD`.
#[must_use]
pub fn sample_binomial_half(key: &[u8], tag: &[u8], fields: &[u64], trials: u64) -> u64 {
    if trials == 0 {
        return 0;
    }

    if trials <= EXACT_SAMPLING_THRESHOLD {
        return count_set_bits(key, tag, fields, trials);
    }

    let mean = trials as f64 / 2.0;
    let std_dev = (trials as f64 * 0.25).sqrt();
    let u = derive_unit_interval(key, tag, fields);
    let z = inverse_standard_normal_cdf(u);
    let sample = mean + std_dev * z;

    sample.round().clamp(0.0, trials as f64) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_sampling_is_deterministic_and_in_range() {
        let key = [2u8; 16];
        for trials in [1u64, 17, 256, 999] {
            let k = sample_binomial_half(&key, b"PLNK", &[0, 4], trials);
            assert!(k <= trials);
            let k_again = sample_binomial_half(&key, b"PLNK", &[0, 4], trials);
            assert_eq!(k, k_again);
        }
    }

    #[test]
    fn approximate_sampling_is_deterministic_and_in_range() {
        let key = [9u8; 16];
        for trials in [1001u64, 50_000, 2_000_000] {
            let k = sample_binomial_half(&key, b"PLNK", &[1, 2], trials);
            assert!(k <= trials);
            let k_again = sample_binomial_half(&key, b"PLNK", &[1, 2], trials);
            assert_eq!(k, k_again);
        }
    }

    #[test]
    fn zero_trials_yields_zero() {
        let key = [0u8; 16];
        assert_eq!(sample_binomial_half(&key, b"PLNK", &[0, 0], 0), 0);
    }

    #[test]
    fn distribution_is_roughly_centered_across_seeds() {
        let key = [5u8; 16];
        let trials = 200u64;
        let sum: u64 = (0..64)
            .map(|seed| sample_binomial_half(&key, b"PLNK", &[seed, 3], trials))
            .sum();
        let mean = sum as f64 / 64.0;
        assert!((mean - 100.0).abs() < 25.0);
    }
}
