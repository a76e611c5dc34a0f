/// Keeps the first three characters of an email and hides the rest.
///
/// `jane@acme.io` becomes `jan***`; shorter inputs keep what they have.
pub fn mask_email(email: &str) -> String {
    let prefix: String = email.chars().take(3).collect();
    format!("{}***", prefix)
}
