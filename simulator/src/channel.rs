//! Binary symmetric channel helpers for the simulation loop.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Flip each bit independently with probability `flip_probability`.
pub fn noise_bitstring_inplace(rng: &mut ChaCha8Rng, bits: &mut [u8], flip_probability: f64) {
    for bit in bits.iter_mut() {
        if rng.gen_bool(flip_probability) {
            *bit ^= 1;
        }
    }
}

/// Draw a uniformly random bit string of length `n`.
pub fn random_bitstring(rng: &mut ChaCha8Rng, n: usize) -> Vec<u8> {
    (0..n).map(|_| rng.gen_range(0..=1u8)).collect()
}

/// Binary entropy in bits; the Slepian-Wolf bound on syndrome bits per
/// key bit for a binary symmetric channel.
pub fn h2(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    -p * p.log2() - (1.0 - p) * (1.0 - p).log2()
}
