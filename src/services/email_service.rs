use tracing::info;

/// Outbound mail. There is no SMTP relay wired up in this deployment, so
/// every message is emitted as a structured log line carrying the link or
/// code the recipient needs; swap the bodies of these methods to integrate
/// a real provider.
#[derive(Clone)]
pub struct EmailService {
    frontend_url: String,
}

impl EmailService {
    pub fn new(frontend_url: String) -> Self {
        Self { frontend_url }
    }

    pub fn send_verification_email(&self, email: &str, first_name: &str, token: &str) {
        let verification_url = format!("{}/verify/{}", self.frontend_url, token);
        info!(
            email,
            first_name, verification_url, "verification email queued"
        );
    }

    pub fn send_password_reset_otp(&self, email: &str, otp: &str) {
        info!(email, otp, "password reset OTP queued");
    }

    pub fn send_email_change_verification(&self, new_email: &str, token: &str) {
        let verification_url = format!(
            "{}/verify-email-change/{}?newEmail={}",
            self.frontend_url, token, new_email
        );
        info!(new_email, verification_url, "email change verification queued");
    }
}
