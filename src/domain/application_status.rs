/// Lifecycle of a recruitment application.
///
/// Only the transitions below are legal; handlers reject anything else
/// before touching the database or any side effect:
///
/// PENDING -> INTERVIEW | REJECTED
/// INTERVIEW -> SELECTED | REJECTED
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    Pending,
    Interview,
    Selected,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Interview => "INTERVIEW",
            ApplicationStatus::Selected => "SELECTED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(ApplicationStatus::Pending),
            "INTERVIEW" => Ok(ApplicationStatus::Interview),
            "SELECTED" => Ok(ApplicationStatus::Selected),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("{} is not a known application status", other)),
        }
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, Interview) | (Pending, Rejected) | (Interview, Selected) | (Interview, Rejected)
        )
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
