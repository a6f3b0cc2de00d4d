//! Shared email content templates
//!
//! Canonical content generators for verification-code emails, used by both
//! production (SES) and mock email services.

/// Subject line for verification-code emails.
pub const VERIFICATION_SUBJECT: &str = "Your Gatehouse verification code";

/// Generate plain-text body for a verification-code email.
pub fn verification_code_text(recipient: &str, code: &str) -> String {
    format!(
        "Hi {recipient},\n\n\
        You are registering a Gatehouse account. Use the code below to finish:\n\n\
        {code}\n\n\
        The code is valid for 3 minutes. Do not share it with anyone.\n\n\
        If you did not request this, you can safely ignore this email.\n\n\
        Thanks,\n\
        The Gatehouse Team"
    )
}

/// Generate styled HTML body for a verification-code email.
pub fn verification_code_html(recipient: &str, code: &str) -> String {
    format!(
        r#"
            <html>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #1b9de2;">Verify your email</h2>

                    <p>Hi {recipient},</p>

                    <p>You are registering a Gatehouse account. Use the code below to finish:</p>

                    <div style="text-align: center; margin: 30px 0;">
                        <div style="display: inline-block; background-color: #e6f3fa; padding: 15px 30px; border-radius: 8px;">
                            <div style="font-size: 36px; color: #1b9de2; font-weight: bold; letter-spacing: 5px;">{code}</div>
                        </div>
                    </div>

                    <p style="color: #666; font-size: 14px;">
                        <em>The code is valid for 3 minutes. Do not share it with anyone.</em>
                    </p>

                    <hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">

                    <p style="color: #666; font-size: 12px;">
                        If you did not request this, you can safely ignore this email.<br>
                        Thanks, The Gatehouse Team
                    </p>
                </div>
            </body>
            </html>
            "#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_body_contains_code_and_validity_window() {
        let body = verification_code_text("a@b.com", "123456");
        assert!(body.contains("a@b.com"));
        assert!(body.contains("123456"));
        assert!(body.contains("3 minutes"));
    }

    #[test]
    fn test_html_body_contains_code() {
        let body = verification_code_html("a@b.com", "654321");
        assert!(body.contains("654321"));
        assert!(body.contains("<html>"));
    }
}
