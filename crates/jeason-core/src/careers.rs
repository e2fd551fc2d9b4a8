//! # Careers
//!
//! Job openings and the applications submitted against them.

use crate::storage::{Table, numeric_key};
use crate::{
    ApplicationDraft, ApplicationStatus, Backoffice, Career, CareerApplication, CareerDraft,
    CoreError, Timestamp,
};

impl Backoffice {
    /// Open positions, newest first.
    pub fn list_careers(&self) -> Result<Vec<Career>, CoreError> {
        let mut careers: Vec<Career> = self.load_all()?;
        careers.reverse();
        Ok(careers)
    }

    pub fn career(&self, id: u64) -> Result<Career, CoreError> {
        self.load(&numeric_key(id))?
            .ok_or_else(|| CoreError::not_found(format!("career {id}")))
    }

    pub fn create_career(&self, draft: CareerDraft, now: Timestamp) -> Result<Career, CoreError> {
        let draft = draft.normalize()?;
        let career = Career {
            id: self.next_id(Table::Careers)?,
            title: draft.title,
            department: draft.department,
            location: draft.location,
            employment_type: draft.employment_type,
            description: draft.description,
            created_at: now,
            updated_at: now,
        };
        self.save(&career)?;
        Ok(career)
    }

    pub fn update_career(
        &self,
        id: u64,
        draft: CareerDraft,
        now: Timestamp,
    ) -> Result<Career, CoreError> {
        let draft = draft.normalize()?;
        let current = self.career(id)?;
        let career = Career {
            id,
            title: draft.title,
            department: draft.department,
            location: draft.location,
            employment_type: draft.employment_type,
            description: draft.description,
            created_at: current.created_at,
            updated_at: now,
        };
        self.save(&career)?;
        Ok(career)
    }

    /// Remove an opening. Applications already received are kept.
    pub fn delete_career(&self, id: u64) -> Result<(), CoreError> {
        if self.remove::<Career>(&numeric_key(id))? {
            Ok(())
        } else {
            Err(CoreError::not_found(format!("career {id}")))
        }
    }

    // =========================================================================
    // APPLICATIONS
    // =========================================================================

    /// Record an application for an existing opening.
    ///
    /// The position is copied from the career title so the application still
    /// reads correctly if the opening is later edited or removed.
    pub fn apply_for_career(
        &self,
        career_id: u64,
        draft: ApplicationDraft,
        now: Timestamp,
    ) -> Result<CareerApplication, CoreError> {
        let draft = draft.normalize()?;
        let career = self.career(career_id)?;
        let application = CareerApplication {
            id: self.next_id(Table::CareerApplications)?,
            career_id,
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            position: career.title,
            experience: draft.experience,
            resume_url: draft.resume_url,
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.save(&application)?;
        Ok(application)
    }

    /// Every application, newest first.
    pub fn list_applications(&self) -> Result<Vec<CareerApplication>, CoreError> {
        let mut applications: Vec<CareerApplication> = self.load_all()?;
        applications.reverse();
        Ok(applications)
    }

    pub fn application(&self, id: u64) -> Result<CareerApplication, CoreError> {
        self.load(&numeric_key(id))?
            .ok_or_else(|| CoreError::not_found(format!("application {id}")))
    }

    /// Approve or reject a pending application.
    pub fn set_application_status(
        &self,
        id: u64,
        status: ApplicationStatus,
        now: Timestamp,
    ) -> Result<CareerApplication, CoreError> {
        if status == ApplicationStatus::Pending {
            return Err(CoreError::field("status", "Status must be approved or rejected"));
        }
        self.modify(&numeric_key(id), |application: &mut CareerApplication| {
            if application.status != ApplicationStatus::Pending {
                return Err(CoreError::Conflict(format!(
                    "application {id} is already {}",
                    application.status.as_str()
                )));
            }
            application.status = status;
            application.updated_at = now;
            Ok(())
        })?
        .ok_or_else(|| CoreError::not_found(format!("application {id}")))
    }
}
