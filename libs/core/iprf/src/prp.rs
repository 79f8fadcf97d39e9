// [libs/core/iprf/src/prp.rs]
/*!
 * =================================================================
 * APARATO: SWAP-OR-NOT PSEUDORANDOM PERMUTATION
 * RESPONSABILIDAD: PERMUTACIÓN KEYADA DE DOMINIO PEQUEÑO SOBRE [0, n)
 *
 * Cada ronda es una involución: empareja x con un socio determinado por
 * la clave de ronda y decide, con un bit también keyado, si intercambiar
 * el par o dejarlo fijo. Por ser involutiva, la ronda inversa es
 * idéntica a la directa; sólo el orden de las rondas se invierte.
 * =================================================================
 */

use crate::key_derivation::{derive_bit, derive_u64, TAG_PRP_ROUND_BIT, TAG_PRP_ROUND_KEY};

/// Permutación pseudoaleatoria Swap-or-Not sobre `[0, n)`, keyada por `K1`.
#[derive(Debug, Clone)]
pub struct Prp {
    key: [u8; 16],
    n: u64,
    rounds: u64,
}

impl Prp {
    /// Construye una instancia del PRP sobre el dominio `[0, n)`.
    ///
    /// Número de rondas `R = 6*ceil(log2(n+1)) + 6`, como en §4.1.
    #[must_use]
    pub fn new(key: [u8; 16], n: u64) -> Self {
        let rounds = 6 * ceil_log2(n + 1) + 6;
        Self { key, n, rounds }
    }

    /// Tamaño del dominio sobre el que opera esta permutación.
    #[must_use]
    pub fn domain_size(&self) -> u64 {
        self.n
    }

    /// Aplica la permutación hacia adelante: rondas `0..R` en orden.
    #[must_use]
    pub fn forward(&self, x: u64) -> u64 {
        debug_assert!(x < self.n, "x out of domain");
        let mut current = x;
        for round in 0..self.rounds {
            current = self.apply_round(round, current);
        }
        current
    }

    /// Aplica la permutación inversa: las mismas rondas involutivas, en orden inverso.
    #[must_use]
    pub fn inverse(&self, y: u64) -> u64 {
        debug_assert!(y < self.n, "y out of domain");
        let mut current = y;
        for round in (0..self.rounds).rev() {
            current = self.apply_round(round, current);
        }
        current
    }

    /// Transformación de una ronda, idéntica en ambas direcciones por ser una involución.
    fn apply_round(&self, round: u64, x: u64) -> u64 {
        let round_key = derive_u64(&self.key, TAG_PRP_ROUND_KEY, &[round]) % self.n;
        let partner = (round_key + self.n - x) % self.n;
        let canonical = x.max(partner);
        if derive_bit(&self.key, TAG_PRP_ROUND_BIT, &[round, canonical]) {
            partner
        } else {
            x
        }
    }
}

fn ceil_log2(value: u64) -> u64 {
    if value <= 1 {
        return 0;
    }
    (u64::BITS - (value - 1).leading_zeros()) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ceil_log2_matches_known_values() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(4), 2);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(1025), 11);
    }

    #[test]
    fn forward_then_inverse_is_identity_for_every_point() {
        let prp = Prp::new([3u8; 16], 97);
        for x in 0..97 {
            assert_eq!(prp.inverse(prp.forward(x)), x);
        }
    }

    #[test]
    fn forward_is_a_bijection_over_small_domain() {
        let prp = Prp::new([11u8; 16], 64);
        let mut seen = vec![false; 64];
        for x in 0..64 {
            let y = prp.forward(x);
            assert!(y < 64);
            assert!(!seen[y as usize], "collision at {y}");
            seen[y as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    proptest! {
        #[test]
        fn bijectivity_holds_for_arbitrary_keys_and_domains(
            key in prop::array::uniform16(any::<u8>()),
            n in 2u64..300,
            x in 0u64..300,
        ) {
            let x = x % n;
            let prp = Prp::new(key, n);
            prop_assert_eq!(prp.inverse(prp.forward(x)), x);
        }
    }
}
