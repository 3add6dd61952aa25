use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Generates a short uppercase reference code.
pub fn reference_code(length: usize) -> String {
    thread_rng()
        .sample_iter(Alphanumeric)
        .take(length)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect()
}
