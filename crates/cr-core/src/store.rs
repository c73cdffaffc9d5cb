use crate::events::EventRepository;
use crate::groups::GroupRepository;
use crate::notices::NoticeRepository;
use crate::registrations::RegistrationRepository;
use crate::CodeReposError;

pub trait Store {
    type Registrations<'a>: RegistrationRepository
    where
        Self: 'a;
    type Groups<'a>: GroupRepository
    where
        Self: 'a;
    type Events<'a>: EventRepository
    where
        Self: 'a;
    type Notices<'a>: NoticeRepository
    where
        Self: 'a;

    fn registrations(&self) -> Self::Registrations<'_>;
    fn groups(&self) -> Self::Groups<'_>;
    fn events(&self) -> Self::Events<'_>;
    fn notices(&self) -> Self::Notices<'_>;

    fn with_tx<F, T>(&self, f: F) -> Result<T, CodeReposError>
    where
        F: FnOnce(&Self) -> Result<T, CodeReposError>;
}
