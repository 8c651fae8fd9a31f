// =============================================================================
// Fetch error kinds
// =============================================================================
//
// The pipeline surfaces exactly these kinds to the presentation layer so it
// can show a specific message ("rate limited, try again soon" vs "no data").
// There is no automatic retry anywhere; re-fetching is a user-initiated
// re-interaction.

/// Why a fetch operation produced no usable series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    /// Network/transport failure or timeout; the source could not be reached.
    Unreachable,
    /// The upstream signalled throttling (HTTP 429 or a vendor note).
    RateLimited,
    /// Well-formed response with no usable series in it.
    EmptyData,
    /// Response shape does not match the expected schema.
    ParseFailure,
}

impl FetchError {
    /// Stable machine-readable name, used in API error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unreachable => "unreachable",
            Self::RateLimited => "rate_limited",
            Self::EmptyData => "empty_data",
            Self::ParseFailure => "parse_failure",
        }
    }

    /// Classify a reqwest transport/decode error.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_decode() {
            Self::ParseFailure
        } else {
            // Timeouts, connect failures, request build errors: the source is
            // unreachable from the caller's point of view.
            Self::Unreachable
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited
        } else {
            Self::Unreachable
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable => write!(f, "source unreachable (transport failure or timeout)"),
            Self::RateLimited => write!(f, "source is rate limiting requests"),
            Self::EmptyData => write!(f, "source returned no usable data"),
            Self::ParseFailure => write!(f, "source response did not match the expected schema"),
        }
    }
}

impl std::error::Error for FetchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_429_maps_to_rate_limited() {
        assert_eq!(
            FetchError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS),
            FetchError::RateLimited
        );
    }

    #[test]
    fn other_error_statuses_map_to_unreachable() {
        assert_eq!(
            FetchError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            FetchError::Unreachable
        );
        assert_eq!(
            FetchError::from_status(reqwest::StatusCode::BAD_GATEWAY),
            FetchError::Unreachable
        );
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(FetchError::EmptyData.kind(), "empty_data");
        assert_eq!(FetchError::ParseFailure.kind(), "parse_failure");
    }
}
