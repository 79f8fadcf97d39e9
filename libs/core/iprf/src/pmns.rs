// [libs/core/iprf/src/pmns.rs]
/*!
 * =================================================================
 * APARATO: PSEUDORANDOM MULTINOMIAL SAMPLER (PMNS)
 * RESPONSABILIDAD: REPARTIR [0, n) EN m BINS VÍA UN ÁRBOL DE BISECCIÓN
 *
 * El árbol nunca se materializa: cada nodo se identifica por el rango de
 * bins que cubre, `(bin_lo, bin_hi)`, y el muestreo binomial sembrado por
 * ese identificador decide cuántos de los puntos de dominio restantes
 * van al subárbol izquierdo. Como la partición es un corte contiguo del
 * rango de dominio ordenado (nunca un subconjunto disperso), el rango de
 * dominio de cada nodo sigue siendo un intervalo — por eso `inverse`
 * puede devolver el bin completo como un rango sin reconstruir el árbol.
 * =================================================================
 */

use crate::binomial::sample_binomial_half;
use crate::key_derivation::TAG_PMNS_NODE;

/// Muestreador multinomial pseudoaleatorio que distribuye `[0, n)` en `m` bins, keyado por `K2`.
#[derive(Debug, Clone)]
pub struct Pmns {
    key: [u8; 16],
    n: u64,
    m: u64,
}

impl Pmns {
    /// Construye una instancia del PMNS sobre dominio `[0, n)` y `m` bins.
    #[must_use]
    pub fn new(key: [u8; 16], n: u64, m: u64) -> Self {
        Self { key, n, m }
    }

    /// Cantidad de bins del rango.
    #[must_use]
    pub fn bin_count(&self) -> u64 {
        self.m
    }

    /// Descifra a qué bin pertenece el punto de dominio `x`.
    #[must_use]
    pub fn forward(&self, x: u64) -> u64 {
        debug_assert!(x < self.n, "x out of domain");

        let mut domain_lo = 0u64;
        let mut domain_hi = self.n;
        let mut bin_lo = 0u64;
        let mut bin_hi = self.m;

        while bin_hi - bin_lo > 1 {
            let mid_bin = bin_lo + (bin_hi - bin_lo) / 2;
            let trials = domain_hi - domain_lo;
            let left_count = sample_binomial_half(&self.key, TAG_PMNS_NODE, &[bin_lo, bin_hi], trials);
            let split_point = domain_lo + left_count;

            if x < split_point {
                domain_hi = split_point;
                bin_hi = mid_bin;
            } else {
                domain_lo = split_point;
                bin_lo = mid_bin;
            }
        }

        bin_lo
    }

    /// Enumera el conjunto (ordenado) de puntos de dominio que caen en el bin `y`.
    #[must_use]
    pub fn inverse(&self, y: u64) -> Vec<u64> {
        debug_assert!(y < self.m, "y out of range");

        let mut domain_lo = 0u64;
        let mut domain_hi = self.n;
        let mut bin_lo = 0u64;
        let mut bin_hi = self.m;

        while bin_hi - bin_lo > 1 {
            let mid_bin = bin_lo + (bin_hi - bin_lo) / 2;
            let trials = domain_hi - domain_lo;
            let left_count = sample_binomial_half(&self.key, TAG_PMNS_NODE, &[bin_lo, bin_hi], trials);
            let split_point = domain_lo + left_count;

            if y < mid_bin {
                domain_hi = split_point;
                bin_hi = mid_bin;
            } else {
                domain_lo = split_point;
                bin_lo = mid_bin;
            }
        }

        (domain_lo..domain_hi).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn forward_and_inverse_agree() {
        let pmns = Pmns::new([4u8; 16], 1000, 16);
        for x in 0..1000 {
            let y = pmns.forward(x);
            assert!(pmns.inverse(y).contains(&x));
        }
    }

    #[test]
    fn bins_are_complete_and_disjoint() {
        let pmns = Pmns::new([6u8; 16], 513, 8);
        let mut seen = HashSet::new();
        for y in 0..8 {
            for point in pmns.inverse(y) {
                assert!(seen.insert(point), "point {point} appeared in more than one bin");
            }
        }
        assert_eq!(seen.len(), 513);
        assert_eq!(seen, (0..513).collect::<HashSet<_>>());
    }

    proptest! {
        #[test]
        fn completeness_and_disjointness_hold_for_arbitrary_parameters(
            key in prop::array::uniform16(any::<u8>()),
            n in 4u64..600,
            m_pow in 1u64..6,
            x in 0u64..600,
        ) {
            let m = 1u64 << m_pow;
            let x = x % n;
            let pmns = Pmns::new(key, n, m);
            let y = pmns.forward(x);
            prop_assert!(y < m);
            prop_assert!(pmns.inverse(y).contains(&x));

            let mut total = 0usize;
            for bin in 0..m {
                total += pmns.inverse(bin).len();
            }
            prop_assert_eq!(total as u64, n);
        }
    }
}
