// [libs/core/iprf/src/iprf.rs]
/*!
 * =================================================================
 * APARATO: iPRF — PRF INVERTIBLE MULTI-VALUADA
 * RESPONSABILIDAD: F_K(x) = PMNS_K2 ∘ PRP_K1(x), CON INVERSA DE CONJUNTO
 * =================================================================
 */

use crate::errors::IprfError;
use crate::pmns::Pmns;
use crate::prp::Prp;

/// La construcción iPRF completa: una permutación de dominio pequeño seguida
/// de un muestreador multinomial, mapeando un índice de base de datos a una
/// ranura de hint con una inversa de conjunto eficiente.
#[derive(Debug, Clone)]
pub struct Iprf {
    prp: Prp,
    pmns: Pmns,
    n: u64,
    m: u64,
}

impl Iprf {
    /// Construye la instancia compuesta sobre dominio `[0, n)` y rango `[0, m)`,
    /// keyada por el par `(k1, k2)`.
    #[must_use]
    pub fn new(k1: [u8; 16], k2: [u8; 16], n: u64, m: u64) -> Self {
        Self {
            prp: Prp::new(k1, n),
            pmns: Pmns::new(k2, n, m),
            n,
            m,
        }
    }

    /// Tamaño del dominio `n`.
    #[must_use]
    pub fn domain_size(&self) -> u64 {
        self.n
    }

    /// Tamaño del rango `m`.
    #[must_use]
    pub fn range_size(&self) -> u64 {
        self.m
    }

    /// Evalúa `F_K(x) = PMNS_K2(PRP_K1(x))`.
    ///
    /// # Errors
    /// `IprfError::InvalidRange` si `x >= n`.
    pub fn forward(&self, x: u64) -> Result<u64, IprfError> {
        if x >= self.n {
            return Err(IprfError::InvalidRange {
                value: x,
                bound: self.n,
            });
        }
        Ok(self.pmns.forward(self.prp.forward(x)))
    }

    /// Enumera, en orden ascendente, todos los `x` tales que `forward(x) == y`.
    ///
    /// # Errors
    /// `IprfError::InvalidRange` si `y >= m`.
    pub fn inverse(&self, y: u64) -> Result<Vec<u64>, IprfError> {
        if y >= self.m {
            return Err(IprfError::InvalidRange {
                value: y,
                bound: self.m,
            });
        }
        let mut points: Vec<u64> = self
            .pmns
            .inverse(y)
            .into_iter()
            .map(|pre_image| self.prp.inverse(pre_image))
            .collect();
        points.sort_unstable();
        Ok(points)
    }
}
