//! Error shared by every backend gateway port.

use super::define_port_error;

define_port_error! {
    /// Failures reported by backend gateway adapters.
    ///
    /// Adapters classify transport outcomes into these variants; services
    /// map them onto domain error codes.
    pub enum GatewayError {
        /// The backend refused the bearer token, or none was sent.
        Unauthorized {
            /// Human-readable detail.
            message: String,
        } => "not authorized: {message}",
        /// The principal lacks permission for the resource.
        Forbidden {
            /// Human-readable detail.
            message: String,
        } => "forbidden: {message}",
        /// The resource does not exist.
        NotFound {
            /// Human-readable detail.
            message: String,
        } => "not found: {message}",
        /// The backend refused the operation; `reason` is shown verbatim.
        Rejected {
            /// Reason reported by the backend.
            reason: String,
        } => "{reason}",
        /// No response arrived in time.
        Timeout {
            /// Human-readable detail.
            message: String,
        } => "backend timed out: {message}",
        /// The backend could not be reached or failed internally.
        Transport {
            /// Human-readable detail.
            message: String,
        } => "backend unavailable: {message}",
        /// The response body could not be decoded.
        Decode {
            /// Human-readable detail.
            message: String,
        } => "malformed backend response: {message}",
    }
}

impl GatewayError {
    /// Whether the session must be discarded.
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
