//! Classify HTTP status and curl errors into retry policy error kinds.

use super::error::FetchError;
use super::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a fetch error into an ErrorKind.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::Curl(ce) => classify_curl_error(ce),
        FetchError::Http(code) => classify_http_status(*code),
        FetchError::EmptyBody => ErrorKind::Validation,
        FetchError::InvalidUrl(_) => ErrorKind::Other,
    }
}

/// Default retry predicate: network, timeout, throttling, 5xx and validation
/// failures are retried; everything else is fatal.
pub fn is_retryable(e: &FetchError) -> bool {
    !matches!(classify(e), ErrorKind::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_429_and_503_throttled() {
        assert_eq!(classify_http_status(429), ErrorKind::Throttled);
        assert_eq!(classify_http_status(503), ErrorKind::Throttled);
    }

    #[test]
    fn http_5xx_retryable() {
        assert!(matches!(classify_http_status(500), ErrorKind::Http5xx(500)));
        assert!(is_retryable(&FetchError::Http(502)));
    }

    #[test]
    fn http_4xx_fatal() {
        assert_eq!(classify_http_status(404), ErrorKind::Other);
        assert!(!is_retryable(&FetchError::Http(403)));
    }

    #[test]
    fn empty_body_is_validation_and_retryable() {
        assert_eq!(classify(&FetchError::EmptyBody), ErrorKind::Validation);
        assert!(is_retryable(&FetchError::EmptyBody));
    }

    #[test]
    fn invalid_url_is_fatal() {
        assert!(!is_retryable(&FetchError::InvalidUrl("::".into())));
    }
}
