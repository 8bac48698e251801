#[derive(Debug, Clone, serde::Serialize)]
pub struct StudentId(String);

impl StudentId {
    /// Student registration numbers are short alphanumeric codes, e.g. "IT19001000".
    pub fn parse(s: String) -> Result<Self, String> {
        let trimmed = s.trim();
        let is_empty = trimmed.is_empty();
        let is_too_long = trimmed.len() > 32;
        let has_invalid_characters = !trimmed.chars().all(|c| c.is_ascii_alphanumeric());

        if is_empty || is_too_long || has_invalid_characters {
            Err(format!("{} is not a valid student id", s))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    /// The applicant's institutional address: the lowercased id at the given domain.
    pub fn email_in(&self, domain: &str) -> String {
        format!("{}@{}", self.0.to_lowercase(), domain)
    }
}

impl AsRef<str> for StudentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
