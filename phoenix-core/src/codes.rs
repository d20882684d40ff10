use rand::Rng;
use std::collections::VecDeque;
use std::sync::Mutex;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const REFERENCE_LENGTH: usize = 6;
pub const TAG_PREFIX: &str = "PA";
pub const TAG_SUFFIX_LENGTH: usize = 8;

/// Source of human-facing identifiers. Uniqueness is enforced by the store;
/// callers regenerate on collision.
pub trait CodeGenerator: Send + Sync {
    /// Six uppercase alphanumeric characters, e.g. `K3ZQ8M`.
    fn booking_reference(&self) -> String;

    /// Airline prefix plus eight alphanumerics, e.g. `PA7TQ2M0XB`.
    fn baggage_tag(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodes;

fn random_alphanumeric(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHANUMERIC[rng.gen_range(0..ALPHANUMERIC.len())] as char)
        .collect()
}

impl CodeGenerator for RandomCodes {
    fn booking_reference(&self) -> String {
        random_alphanumeric(REFERENCE_LENGTH)
    }

    fn baggage_tag(&self) -> String {
        format!("{}{}", TAG_PREFIX, random_alphanumeric(TAG_SUFFIX_LENGTH))
    }
}

/// Replays fixed codes in order, then falls back to random ones.
/// Lets tests force reference and tag collisions.
#[derive(Debug, Default)]
pub struct ScriptedCodes {
    references: Mutex<VecDeque<String>>,
    tags: Mutex<VecDeque<String>>,
}

impl ScriptedCodes {
    pub fn new<R, T>(references: R, tags: T) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            references: Mutex::new(references.into_iter().map(Into::into).collect()),
            tags: Mutex::new(tags.into_iter().map(Into::into).collect()),
        }
    }

    fn next(queue: &Mutex<VecDeque<String>>) -> Option<String> {
        queue.lock().ok().and_then(|mut q| q.pop_front())
    }
}

impl CodeGenerator for ScriptedCodes {
    fn booking_reference(&self) -> String {
        Self::next(&self.references).unwrap_or_else(|| RandomCodes.booking_reference())
    }

    fn baggage_tag(&self) -> String {
        Self::next(&self.tags).unwrap_or_else(|| RandomCodes.baggage_tag())
    }
}

/// Trim and uppercase a reference typed by a customer.
pub fn normalize_reference(reference: &str) -> String {
    reference.trim().to_ascii_uppercase()
}
