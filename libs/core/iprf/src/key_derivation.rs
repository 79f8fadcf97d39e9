// [libs/core/iprf/src/key_derivation.rs]
/*!
 * =================================================================
 * APARATO: FUNCIÓN DE BLOQUE KEYADA
 * RESPONSABILIDAD: DERIVAR TODA ALEATORIEDAD DEL PROTOCOLO DESDE UNA CLAVE MAESTRA
 *
 * Toda aleatoriedad pseudoaleatoria de este crate — claves de ronda del PRP,
 * bits internos de ronda, aleatoriedad de nodo del PMNS, sub-claves
 * (K1, K2) por ranura — pasa por esta única función de bloque, separada
 * por dominio mediante un byte/cadena de etiqueta y una lista de campos
 * enteros. Dos llamadas con la misma clave, etiqueta y campos producen
 * siempre el mismo bloque de 32 bytes.
 * =================================================================
 */

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Evalúa la función de bloque keyada: `HMAC-SHA256(key, tag || fields...)`.
///
/// `fields` se serializa como enteros little-endian de 8 bytes, en el orden
/// dado. Esto es lo único que separa invocaciones que de otro modo
/// compartirían clave y etiqueta (por ejemplo, distintos índices de ronda).
#[must_use]
pub fn keyed_block(key: &[u8], tag: &[u8], fields: &[u64]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(tag);
    for field in fields {
        mac.update(&field.to_le_bytes());
    }
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// Deriva un `u64` tomando los primeros 8 bytes del bloque keyado, little-endian.
#[must_use]
pub fn derive_u64(key: &[u8], tag: &[u8], fields: &[u64]) -> u64 {
    let block = keyed_block(key, tag, fields);
    u64::from_le_bytes(block[0..8].try_into().expect("8-byte slice"))
}

/// Deriva un único bit pseudoaleatorio: el bit menos significativo del bloque keyado.
#[must_use]
pub fn derive_bit(key: &[u8], tag: &[u8], fields: &[u64]) -> bool {
    let block = keyed_block(key, tag, fields);
    (block[0] & 1) == 1
}

/// Deriva un valor uniforme en `[0, 1)` a partir del bloque keyado, para uso
/// en la aproximación normal del muestreo binomial a gran escala.
#[must_use]
pub fn derive_unit_interval(key: &[u8], tag: &[u8], fields: &[u64]) -> f64 {
    let raw = derive_u64(key, tag, fields);
    (raw as f64) / (u64::MAX as f64 + 1.0)
}

/// Tag de dominio para las claves de ronda del PRP (`k_r`).
pub const TAG_PRP_ROUND_KEY: &[u8] = &[0x00];
/// Tag de dominio para el bit interno de ronda del PRP.
pub const TAG_PRP_ROUND_BIT: &[u8] = &[0x01];
/// Tag de dominio para la aleatoriedad de nodo del PMNS.
pub const TAG_PMNS_NODE: &[u8] = b"PLNK";
/// Tag de dominio para derivar `K1` de una ranura a partir de la clave maestra.
pub const TAG_SLOT_K1: &[u8] = &[0x10];
/// Tag de dominio para derivar `K2` de una ranura a partir de la clave maestra.
pub const TAG_SLOT_K2: &[u8] = &[0x11];

/// Deriva el par `(K1, K2)` de una ranura de hint a partir de la clave maestra
/// y su índice, según la separación de dominio de §4.1 "Key-derivation domain separation".
#[must_use]
pub fn derive_slot_keys(master_key: &[u8], slot_index: u64) -> ([u8; 16], [u8; 16]) {
    let k1_block = keyed_block(master_key, TAG_SLOT_K1, &[slot_index]);
    let k2_block = keyed_block(master_key, TAG_SLOT_K2, &[slot_index]);
    let mut k1 = [0u8; 16];
    let mut k2 = [0u8; 16];
    k1.copy_from_slice(&k1_block[0..16]);
    k2.copy_from_slice(&k2_block[0..16]);
    (k1, k2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_block_is_deterministic() {
        let key = [7u8; 16];
        let a = keyed_block(&key, TAG_PRP_ROUND_KEY, &[3, 9]);
        let b = keyed_block(&key, TAG_PRP_ROUND_KEY, &[3, 9]);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_tags_diverge() {
        let key = [7u8; 16];
        let a = keyed_block(&key, TAG_PRP_ROUND_KEY, &[3]);
        let b = keyed_block(&key, TAG_PRP_ROUND_BIT, &[3]);
        assert_ne!(a, b);
    }

    #[test]
    fn slot_keys_differ_per_slot() {
        let master = [1u8; 16];
        let (k1_a, k2_a) = derive_slot_keys(&master, 0);
        let (k1_b, k2_b) = derive_slot_keys(&master, 1);
        assert_ne!(k1_a, k1_b);
        assert_ne!(k2_a, k2_b);
    }
}
