use crate::error::RegistrationError;
use crate::types::{GroupRef, NewRegistration, Registration, RegistrationId};

pub trait RegistrationRepository {
    fn create(&self, input: NewRegistration) -> Result<Registration, RegistrationError>;
    fn get(&self, id: &RegistrationId) -> Result<Option<Registration>, RegistrationError>;
    /// Looks `slug` up within one scope only: the group's registrations, or
    /// the ungrouped ones when `scope` is `None`.
    fn get_by_slug(
        &self,
        scope: Option<&GroupRef>,
        slug: &str,
    ) -> Result<Option<Registration>, RegistrationError>;
    /// Whether any registration, in any scope, uses `slug`.
    fn slug_exists(&self, slug: &str) -> Result<bool, RegistrationError>;
    fn list(&self, scope: Option<&GroupRef>) -> Result<Vec<Registration>, RegistrationError>;
    fn list_all(&self) -> Result<Vec<Registration>, RegistrationError>;
    fn update(&self, registration: Registration) -> Result<Registration, RegistrationError>;
    fn delete(&self, id: &RegistrationId) -> Result<(), RegistrationError>;
}
