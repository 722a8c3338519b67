use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub const TRACKING_PREFIX: &str = "TRK";
const TRACKING_RANDOM_LEN: usize = 16;

/// `TRK` followed by 16 random upper-case alphanumerics (about 82 bits).
pub fn generate_tracking_number() -> String {
    let random: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TRACKING_RANDOM_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{}{}", TRACKING_PREFIX, random)
}
