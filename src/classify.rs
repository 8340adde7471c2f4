//! Classification of remote errors.
//!
//! The control-plane API does not return machine-readable error codes for the
//! conditions the provider cares about, so the decision is made on the error
//! text. All substring checks live here.

/// Marker the API uses when a login was throttled.
pub const RATE_LIMIT_SIGNATURE: &str = "Exceeded rate limit";

/// Marker the API uses while an upstream object is still being provisioned.
pub const PROVISIONING_SIGNATURE: &str = "provisioning";

const NOT_FOUND_SIGNATURES: &[&str] = &["not found", "404"];

/// What kind of failure an error message describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request was throttled and may be retried after waiting.
    RateLimited,
    /// The target is not ready yet; the request may succeed later.
    Provisioning,
    /// The target object does not exist.
    NotFound,
    /// Anything else. Never retried.
    Other,
}

impl ErrorClass {
    /// Whether the provider retries this class of error anywhere.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::RateLimited | Self::Provisioning)
    }
}

/// Classify an error message. The first matching rule wins, in the order
/// rate limit, provisioning, not found.
pub fn classify(message: &str) -> ErrorClass {
    if message.contains(RATE_LIMIT_SIGNATURE) {
        return ErrorClass::RateLimited;
    }
    if message.contains(PROVISIONING_SIGNATURE) {
        return ErrorClass::Provisioning;
    }
    let lowered = message.to_ascii_lowercase();
    if NOT_FOUND_SIGNATURES.iter().any(|sig| lowered.contains(sig)) {
        return ErrorClass::NotFound;
    }
    ErrorClass::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit() {
        assert_eq!(
            classify("login: Exceeded rate limit, try later"),
            ErrorClass::RateLimited
        );
        // case matters for the throttling marker
        assert_eq!(classify("exceeded rate limit"), ErrorClass::Other);
    }

    #[test]
    fn test_provisioning() {
        assert_eq!(
            classify("Kafka cluster is still provisioning"),
            ErrorClass::Provisioning
        );
        assert!(ErrorClass::Provisioning.is_transient());
    }

    #[test]
    fn test_not_found() {
        assert_eq!(classify("Environment Not Found"), ErrorClass::NotFound);
        assert_eq!(classify("HTTP 404"), ErrorClass::NotFound);
        assert!(!ErrorClass::NotFound.is_transient());
    }

    #[test]
    fn test_other() {
        assert_eq!(classify("invalid credentials"), ErrorClass::Other);
        assert!(!ErrorClass::Other.is_transient());
    }
}
