//! Outbound mail seam.
//!
//! Delivery is fire-and-forget from the handlers' point of view; a failed
//! send must never fail the request that triggered it.

/// Sends account mail. Implementations must swallow their own errors.
pub trait Mailer: Send + Sync {
    fn send_verification_code(&self, email: &str, code: &str);
    fn send_password_reset(&self, email: &str, token: &str);
}

/// Writes mail to the log instead of delivering it. Default for local runs
/// and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send_verification_code(&self, email: &str, code: &str) {
        tracing::info!(email, code, "verification code issued");
    }

    fn send_password_reset(&self, email: &str, token: &str) {
        tracing::info!(email, token, "password reset token issued");
    }
}
