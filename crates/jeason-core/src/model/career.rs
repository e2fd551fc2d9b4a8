use crate::storage::{Record, Table, numeric_key};
use crate::validation::{self, FieldErrors};
use crate::{CoreError, Timestamp};
use serde::{Deserialize, Serialize};

/// An open position listed on the careers page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Career {
    pub id: u64,
    pub title: String,
    pub department: String,
    pub location: String,
    /// Employment type, e.g. "Full-time".
    #[serde(rename = "type")]
    pub employment_type: String,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Record for Career {
    const TABLE: Table = Table::Careers;

    fn key(&self) -> String {
        numeric_key(self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerDraft {
    pub title: String,
    pub department: String,
    pub location: String,
    #[serde(rename = "type")]
    pub employment_type: String,
    pub description: String,
}

impl CareerDraft {
    /// title ≥ 3, department ≥ 2, location ≥ 2, type ≥ 2, description ≥ 20.
    pub fn normalize(self) -> Result<CareerDraft, CoreError> {
        let mut errors = FieldErrors::new();
        validation::min_len(&mut errors, "title", &self.title, 3, "Title");
        validation::min_len(&mut errors, "department", &self.department, 2, "Department");
        validation::min_len(&mut errors, "location", &self.location, 2, "Location");
        validation::min_len(&mut errors, "type", &self.employment_type, 2, "Employment type");
        validation::min_len(&mut errors, "description", &self.description, 20, "Description");
        errors.into_result()?;

        Ok(CareerDraft {
            title: self.title.trim().to_string(),
            department: self.department.trim().to_string(),
            location: self.location.trim().to_string(),
            employment_type: self.employment_type.trim().to_string(),
            description: self.description.trim().to_string(),
        })
    }
}

// =============================================================================
// APPLICATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// A job application submitted from the careers page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerApplication {
    pub id: u64,
    pub career_id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Title of the position at the time of applying.
    pub position: String,
    pub experience: String,
    pub resume_url: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Record for CareerApplication {
    const TABLE: Table = Table::CareerApplications;

    fn key(&self) -> String {
        numeric_key(self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub experience: String,
    pub resume_url: Option<String>,
}

impl ApplicationDraft {
    /// All fields but `resume_url` are required; a blank resume URL means none.
    pub fn normalize(self) -> Result<ApplicationDraft, CoreError> {
        let mut errors = FieldErrors::new();
        validation::required(&mut errors, "name", &self.name, "Name");
        validation::email(&mut errors, "email", &self.email);
        validation::required(&mut errors, "phone", &self.phone, "Phone");
        validation::required(&mut errors, "experience", &self.experience, "Experience");
        errors.into_result()?;

        let resume_url = self
            .resume_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        Ok(ApplicationDraft {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            experience: self.experience.trim().to_string(),
            resume_url,
        })
    }
}
