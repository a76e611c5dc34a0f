// src/services/email.rs - Notification templates and provider dispatch
use std::{fmt, str::FromStr, time::Duration};

use async_trait::async_trait;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::config::EmailConfig;
use crate::models::NewConsultationRequest;

const FALLBACK_MAILGUN_DOMAIN: &str = "mg.ceyrva.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailProvider {
    #[serde(rename = "sendgrid")]
    SendGrid,
    #[serde(rename = "mailgun")]
    Mailgun,
    #[serde(rename = "aws-ses")]
    AwsSes,
}

impl FromStr for EmailProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sendgrid" => Ok(EmailProvider::SendGrid),
            "mailgun" => Ok(EmailProvider::Mailgun),
            "aws-ses" | "ses" => Ok(EmailProvider::AwsSes),
            other => Err(format!(
                "Unknown email provider: {}. Must be one of: sendgrid, mailgun, aws-ses",
                other
            )),
        }
    }
}

impl fmt::Display for EmailProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EmailProvider::SendGrid => "sendgrid",
            EmailProvider::Mailgun => "mailgun",
            EmailProvider::AwsSes => "aws-ses",
        };
        f.write_str(name)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers `message`, reporting success.
    ///
    /// Failures are logged and reported as `false`; implementations never
    /// surface transport errors to callers.
    async fn send(&self, message: &EmailMessage) -> bool;
}

/// Mailer that talks to the configured provider's HTTP API
pub struct HttpMailer {
    client: reqwest::Client,
    config: EmailConfig,
}

impl HttpMailer {
    pub fn new(config: EmailConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    /// Sending domain for Mailgun.
    ///
    /// An explicit domain setting wins; otherwise the key's leading segment up
    /// to the first `:` (the whole key when it has none) is the domain.
    fn mailgun_domain(&self, api_key: &str) -> String {
        self.config
            .mailgun_domain
            .as_deref()
            .or_else(|| api_key.split(':').next().filter(|d| !d.is_empty()))
            .unwrap_or(FALLBACK_MAILGUN_DOMAIN)
            .to_string()
    }

    async fn send_via_sendgrid(&self, message: &EmailMessage, api_key: &str, from: &str) -> bool {
        let endpoint = match endpoint(&self.config.sendgrid_base_url, "v3/mail/send") {
            Some(url) => url,
            None => return false,
        };

        let body = json!({
            "personalizations": [{
                "to": [{ "email": message.to }],
                "subject": message.subject,
            }],
            "from": { "email": from },
            "content": [{
                "type": "text/html",
                "value": message.html,
            }],
        });

        let result = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await;

        check_response("SendGrid", result)
    }

    async fn send_via_mailgun(&self, message: &EmailMessage, api_key: &str, from: &str) -> bool {
        let path = format!("v3/{}/messages", self.mailgun_domain(api_key));
        let endpoint = match endpoint(&self.config.mailgun_base_url, &path) {
            Some(url) => url,
            None => return false,
        };

        let form = [
            ("from", from),
            ("to", message.to.as_str()),
            ("subject", message.subject.as_str()),
            ("html", message.html.as_str()),
            ("text", message.text.as_deref().unwrap_or("")),
        ];

        let result = self
            .client
            .post(endpoint)
            .basic_auth("api", Some(api_key))
            .form(&form)
            .send()
            .await;

        check_response("Mailgun", result)
    }
}

fn endpoint(base: &str, path: &str) -> Option<Url> {
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    match Url::parse(&base).and_then(|url| url.join(path)) {
        Ok(url) => Some(url),
        Err(e) => {
            error!("[Email] Invalid provider URL '{}': {}", base, e);
            None
        }
    }
}

fn check_response(provider: &str, result: Result<reqwest::Response, reqwest::Error>) -> bool {
    match result {
        Ok(response) if response.status().is_success() => {
            debug!("[{}] Email accepted with status {}", provider, response.status());
            true
        }
        Ok(response) => {
            error!("[{}] Error: {}", provider, response.status());
            false
        }
        Err(e) => {
            error!("[{}] Failed to send email: {}", provider, e);
            false
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> bool {
        let (provider, api_key, from) = match (
            self.config.provider,
            self.config.api_key.as_deref(),
            self.config.from_address.as_deref(),
        ) {
            (Some(provider), Some(key), Some(from)) => (provider, key, from),
            _ => {
                warn!("[Email] Email service not configured");
                return false;
            }
        };

        match provider {
            EmailProvider::SendGrid => self.send_via_sendgrid(message, api_key, from).await,
            EmailProvider::Mailgun => self.send_via_mailgun(message, api_key, from).await,
            EmailProvider::AwsSes => {
                warn!("[AWS SES] Not yet implemented - use SendGrid or Mailgun");
                false
            }
        }
    }
}

/// Escapes the five HTML-significant characters
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Message to the business owner describing a new request
pub fn consultation_notification_email(
    data: &NewConsultationRequest,
    notify_address: &str,
) -> EmailMessage {
    let html = format!(
        r#"
      <div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
        <h2 style="color: #0066cc;">New Consultation Request</h2>

        <div style="background-color: #f5f5f5; padding: 20px; border-radius: 8px; margin: 20px 0;">
          <p><strong>Name:</strong> {name}</p>
          <p><strong>Company:</strong> {company}</p>
          <p><strong>Email:</strong> <a href="mailto:{email}">{email}</a></p>
          <p><strong>Phone:</strong> {phone}</p>
        </div>

        <div style="margin: 20px 0;">
          <h3 style="color: #333;">Message:</h3>
          <p style="white-space: pre-wrap; color: #666;">{message}</p>
        </div>

        <div style="border-top: 1px solid #ddd; padding-top: 20px; margin-top: 20px; color: #999; font-size: 12px;">
          <p>This is an automated notification from Ceyrva's consultation system.</p>
        </div>
      </div>
    "#,
        name = escape_html(&data.full_name),
        company = escape_html(&data.company),
        email = escape_html(&data.email),
        phone = escape_html(&data.phone),
        message = escape_html(&data.message),
    );

    let text = format!(
        "New Consultation Request\n\nName: {}\nCompany: {}\nEmail: {}\nPhone: {}\n\nMessage:\n{}\n",
        data.full_name, data.company, data.email, data.phone, data.message
    );

    EmailMessage {
        to: notify_address.to_string(),
        subject: format!("New Consultation Request from {}", data.company),
        html,
        text: Some(text),
    }
}

/// Acknowledgement sent back to the person who submitted the form
pub fn client_confirmation_email(
    full_name: &str,
    email: &str,
    contact_address: &str,
) -> EmailMessage {
    let html = format!(
        r#"
      <div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
        <h2 style="color: #0066cc;">Thank You for Your Consultation Request</h2>

        <p>Hi {name},</p>

        <p>We've received your consultation request and appreciate you reaching out to Ceyrva. Our team will review your information and contact you within one business day.</p>

        <div style="background-color: #f0f8ff; padding: 20px; border-radius: 8px; margin: 20px 0; border-left: 4px solid #0066cc;">
          <p style="margin: 0; color: #0066cc;"><strong>What to expect next:</strong></p>
          <ul style="margin: 10px 0; padding-left: 20px; color: #666;">
            <li>We'll review your security needs and organization details</li>
            <li>Our team will contact you to discuss your specific requirements</li>
            <li>We'll provide a customized assessment approach tailored to your environment</li>
          </ul>
        </div>

        <p>If you have any questions in the meantime, feel free to reach out to us at <a href="mailto:{contact}">{contact}</a>.</p>

        <p>Best regards,<br>
        <strong>Ceyrva Team</strong><br>
        Cybersecurity &amp; Risk Advisory</p>

        <div style="border-top: 1px solid #ddd; padding-top: 20px; margin-top: 30px; color: #999; font-size: 12px;">
          <p>&copy; 2026 Ceyrva. All rights reserved.</p>
        </div>
      </div>
    "#,
        name = escape_html(full_name),
        contact = escape_html(contact_address),
    );

    let text = format!(
        "Thank You for Your Consultation Request\n\n\
         Hi {},\n\n\
         We've received your consultation request and appreciate you reaching out to Ceyrva. \
         Our team will review your information and contact you within one business day.\n\n\
         What to expect next:\n\
         - We'll review your security needs and organization details\n\
         - Our team will contact you to discuss your specific requirements\n\
         - We'll provide a customized assessment approach tailored to your environment\n\n\
         If you have any questions in the meantime, feel free to reach out to us at {}.\n\n\
         Best regards,\nCeyrva Team\nCybersecurity & Risk Advisory\n\n\
         \u{00a9} 2026 Ceyrva. All rights reserved.\n",
        full_name, contact_address
    );

    EmailMessage {
        to: email.to_string(),
        subject: "Consultation Request Received - Ceyrva".to_string(),
        html,
        text: Some(text),
    }
}
