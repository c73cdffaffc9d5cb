use crate::access;
use crate::error::{CodeReposError, GroupError, RegistrationError, VcsError};
use crate::events::EventRepository;
use crate::facade::RepositoryFacade;
use crate::groups::{Group, GroupRepository};
use crate::notices::NoticeRepository;
use crate::notify::{self, Notifier};
use crate::registrations::RegistrationRepository;
use crate::store::Store;
use crate::types::{
    BrowseResult, Commit, CommitDetail, CommitsQuery, CreateRegistrationInput, EventBody,
    GroupRef, MemberGroup, NewRegistration, Registration, UpdateRegistrationInput, UserId,
};
use crate::validation;
use chrono::Utc;
use cr_events::bus::EventBus;
use cr_events::notice::{Notice, StoredNotice};
use cr_events::types::{EventRecord, EventSource};
use cr_vcs::BackendRegistry;
use std::sync::Arc;

pub const DEFAULT_COMMIT_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub source: EventSource,
    pub correlation_id: Option<String>,
}

impl RequestContext {
    pub fn new(source: EventSource, correlation_id: Option<String>) -> Self {
        Self {
            source,
            correlation_id,
        }
    }
}

pub struct CodeRepos<S: Store> {
    store: S,
    registry: Arc<BackendRegistry>,
    event_bus: EventBus,
    notifier: Option<Arc<dyn Notifier>>,
}

impl<S: Store> CodeRepos<S> {
    pub fn new(store: S, registry: Arc<BackendRegistry>, event_bus: EventBus) -> Self {
        Self {
            store,
            registry,
            event_bus,
            notifier: None,
        }
    }

    /// Installs the notification hook and makes sure the `repository_new`
    /// notice type exists on it.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        if let Err(err) = notifier.ensure_notice_type(&notify::repository_new_notice_type()) {
            tracing::warn!(error = %err, "could not register notice type");
        }
        self.notifier = Some(notifier);
        self
    }

    pub fn registrations(&self) -> RegistrationsApi<'_, S> {
        RegistrationsApi { core: self }
    }

    pub fn browser(&self) -> BrowserApi<'_, S> {
        BrowserApi { core: self }
    }

    pub fn groups(&self) -> GroupsApi<'_, S> {
        GroupsApi { core: self }
    }

    pub fn events(&self) -> EventsApi<'_, S> {
        EventsApi { core: self }
    }

    pub fn notices(&self) -> NoticesApi<'_, S> {
        NoticesApi { core: self }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    fn with_events<T, F>(&self, ctx: &RequestContext, f: F) -> Result<T, CodeReposError>
    where
        F: FnOnce(&S) -> Result<(T, Vec<EventBody>), CodeReposError>,
    {
        let (value, records) = self.store.with_tx(|store| {
            let (value, bodies) = f(store)?;
            let mut records = Vec::new();
            for body in bodies {
                let record = build_event_record(ctx, body)?;
                let record = store.events().append(record)?;
                records.push(record);
            }
            Ok((value, records))
        })?;
        for record in records {
            self.event_bus.publish(record);
        }
        Ok(value)
    }

    fn find(
        &self,
        group: Option<&dyn Group>,
        slug: &str,
    ) -> Result<Registration, CodeReposError> {
        find_in_scope(&self.store, group, slug)
    }
}

fn load_group<S: Store>(store: &S, group: &GroupRef) -> Result<MemberGroup, CodeReposError> {
    store.groups().get(group)?.ok_or_else(|| {
        GroupError::NotFound {
            group: group.to_string(),
        }
        .into()
    })
}

fn find_in_scope<S: Store>(
    store: &S,
    group: Option<&dyn Group>,
    slug: &str,
) -> Result<Registration, CodeReposError> {
    store
        .registrations()
        .get_by_slug(group.map(|group| group.group_ref()), slug)?
        .ok_or(CodeReposError::Registration(RegistrationError::NotFound))
}

pub struct RegistrationsApi<'a, S: Store> {
    core: &'a CodeRepos<S>,
}

impl<'a, S: Store> RegistrationsApi<'a, S> {
    /// Registrations of `group`, or the ungrouped ones when there is none.
    pub fn list(&self, group: Option<&dyn Group>) -> Result<Vec<Registration>, CodeReposError> {
        self.core
            .store
            .registrations()
            .list(group.map(|group| group.group_ref()))
            .map_err(CodeReposError::from)
    }

    pub fn get(
        &self,
        group: Option<&dyn Group>,
        slug: &str,
    ) -> Result<Registration, CodeReposError> {
        self.core.find(group, slug)
    }

    pub fn create(
        &self,
        ctx: &RequestContext,
        user: &UserId,
        group: Option<&dyn Group>,
        input: CreateRegistrationInput,
    ) -> Result<Registration, CodeReposError> {
        access::check_create(user, group)?;
        let input = validation::validate_create(input, &self.core.registry)?;
        let (registration, current) = self.core.with_events(ctx, |store| {
            // The caller's snapshot may predate a membership change.
            let current = group
                .map(|group| load_group(store, group.group_ref()))
                .transpose()?;
            access::check_create(user, current.as_ref().map(|group| group as &dyn Group))?;
            if store.registrations().slug_exists(&input.slug)? {
                return Err(RegistrationError::SlugTaken { slug: input.slug }.into());
            }
            let registration = store.registrations().create(NewRegistration {
                name: input.name,
                slug: input.slug,
                repository_type: input.repository_type,
                location: input.location,
                creator: user.clone(),
                group: current.as_ref().map(|group| group.group.clone()),
            })?;
            let events = vec![EventBody::RepositoryCreated {
                registration: registration.clone(),
            }];
            Ok(((registration, current), events))
        })?;
        tracing::info!(
            id = %registration.id,
            slug = %registration.slug,
            group = ?registration.group.as_ref().map(ToString::to_string),
            creator = %user,
            "repository registered"
        );
        self.notify_created(&registration, current.as_ref().map(|group| group as &dyn Group));
        Ok(registration)
    }

    pub fn edit(
        &self,
        ctx: &RequestContext,
        user: &UserId,
        group: Option<&dyn Group>,
        slug: &str,
        input: UpdateRegistrationInput,
    ) -> Result<Registration, CodeReposError> {
        let registration = self.core.with_events(ctx, |store| {
            let existing = find_in_scope(store, group, slug)?;
            access::check_edit(&existing, user, group)?;
            let updated = validation::apply_update(existing.clone(), input)?;
            if updated.slug != existing.slug && store.registrations().slug_exists(&updated.slug)? {
                return Err(RegistrationError::SlugTaken { slug: updated.slug }.into());
            }
            let updated = store.registrations().update(updated)?;
            Ok((
                updated.clone(),
                vec![EventBody::RepositoryUpdated {
                    registration: updated.clone(),
                }],
            ))
        })?;
        tracing::info!(id = %registration.id, slug = %registration.slug, editor = %user, "repository updated");
        Ok(registration)
    }

    pub fn delete(
        &self,
        ctx: &RequestContext,
        user: &UserId,
        group: Option<&dyn Group>,
        slug: &str,
    ) -> Result<(), CodeReposError> {
        let result = self.core.with_events(ctx, |store| {
            let registration = find_in_scope(store, group, slug)?;
            access::check_delete(&registration, user, group)?;
            store.registrations().delete(&registration.id)?;
            Ok((
                registration.id.clone(),
                vec![EventBody::RepositoryDeleted {
                    id: registration.id,
                    slug: registration.slug,
                    group: registration.group,
                    deleted_by: user.clone(),
                }],
            ))
        });
        match result {
            Ok(id) => {
                tracing::info!(%id, slug, deleted_by = %user, "repository deleted");
                Ok(())
            }
            Err(err) => {
                if matches!(
                    err,
                    CodeReposError::Registration(RegistrationError::PermissionDenied { .. })
                ) {
                    tracing::warn!(slug, user = %user, "refused repository delete");
                }
                Err(err)
            }
        }
    }

    fn notify_created(&self, registration: &Registration, group: Option<&dyn Group>) {
        let Some(notifier) = &self.core.notifier else {
            return;
        };
        let recipients = notify::new_repository_recipients(&registration.creator, group);
        let context = notify::new_repository_context(registration, group);
        if let Err(err) = notifier.send(notify::REPOSITORY_NEW, recipients, context) {
            tracing::warn!(slug = %registration.slug, error = %err, "repository notification failed");
        }
    }
}

pub struct BrowserApi<'a, S: Store> {
    core: &'a CodeRepos<S>,
}

impl<'a, S: Store> BrowserApi<'a, S> {
    /// A facade for the registration; the backend is not contacted until the
    /// first read.
    pub fn facade(
        &self,
        group: Option<&dyn Group>,
        slug: &str,
    ) -> Result<RepositoryFacade, CodeReposError> {
        let registration = self.core.find(group, slug)?;
        Ok(RepositoryFacade::new(
            registration,
            Arc::clone(&self.core.registry),
        ))
    }

    pub fn recent_commits(
        &self,
        group: Option<&dyn Group>,
        slug: &str,
        query: &CommitsQuery,
    ) -> Result<Vec<Commit>, CodeReposError> {
        let facade = self.facade(group, slug)?;
        let limit = query
            .limit
            .map_or(DEFAULT_COMMIT_LIMIT, |limit| limit as usize);
        let commits = facade
            .get_recent_commits(query.since)?
            .take(limit)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(commits)
    }

    pub fn view_commit(
        &self,
        group: Option<&dyn Group>,
        slug: &str,
        commit_id: &str,
    ) -> Result<CommitDetail, CodeReposError> {
        let facade = self.facade(group, slug)?;
        facade.get_commit(commit_id)?.ok_or_else(|| {
            VcsError::NotFound {
                message: format!("commit not found: {commit_id}"),
            }
            .into()
        })
    }

    /// A file when `path` names one, otherwise the folder at `path`.
    pub fn browse(
        &self,
        group: Option<&dyn Group>,
        slug: &str,
        path: &str,
        revision: Option<&str>,
    ) -> Result<BrowseResult, CodeReposError> {
        let facade = self.facade(group, slug)?;
        if let Some(file) = facade.get_file_contents(path, revision)? {
            return Ok(BrowseResult::File {
                path: path.to_string(),
                file,
            });
        }
        match facade.get_folder_contents(path, revision)? {
            Some(contents) => Ok(BrowseResult::folder(path, contents)),
            None => Err(VcsError::NotFound {
                message: format!("path not found: {path}"),
            }
            .into()),
        }
    }
}

pub struct GroupsApi<'a, S: Store> {
    core: &'a CodeRepos<S>,
}

impl<'a, S: Store> GroupsApi<'a, S> {
    pub fn create(&self, group: GroupRef, name: &str) -> Result<MemberGroup, CodeReposError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GroupError::InvalidInput {
                message: "group name is required".to_string(),
            }
            .into());
        }
        let created = self.core.store.groups().create(group, name)?;
        tracing::info!(group = %created.group, name = %created.name, "group created");
        Ok(created)
    }

    /// Loads `group` or fails with not-found.
    pub fn resolve(&self, group: &GroupRef) -> Result<MemberGroup, CodeReposError> {
        load_group(&self.core.store, group)
    }

    /// Adds `user` on behalf of `actor`, who must already be a member.
    pub fn admit(
        &self,
        actor: &UserId,
        group: &GroupRef,
        user: &UserId,
    ) -> Result<MemberGroup, CodeReposError> {
        let updated = self.core.store.with_tx(|store| {
            access::check_manage_members(actor, &load_group(store, group)?)?;
            store.groups().add_member(group, user)?;
            load_group(store, group)
        })?;
        tracing::info!(%group, %user, by = %actor, "member added");
        Ok(updated)
    }

    /// Removes `user` on behalf of `actor`, who must be a member.
    pub fn dismiss(
        &self,
        actor: &UserId,
        group: &GroupRef,
        user: &UserId,
    ) -> Result<MemberGroup, CodeReposError> {
        let result = self.core.store.with_tx(|store| {
            access::check_manage_members(actor, &load_group(store, group)?)?;
            store.groups().remove_member(group, user)?;
            load_group(store, group)
        });
        match result {
            Ok(updated) => {
                tracing::info!(%group, %user, by = %actor, "member removed");
                Ok(updated)
            }
            Err(err) => {
                if matches!(err, CodeReposError::Group(GroupError::PermissionDenied { .. })) {
                    tracing::warn!(%group, %user, by = %actor, "refused member removal");
                }
                Err(err)
            }
        }
    }

    pub fn list(&self) -> Result<Vec<MemberGroup>, CodeReposError> {
        self.core.store.groups().list().map_err(CodeReposError::from)
    }

    /// Operator path without a membership check; request handlers use
    /// [`Self::admit`].
    pub fn add_member(&self, group: &GroupRef, user: &UserId) -> Result<(), CodeReposError> {
        self.core.store.groups().add_member(group, user)?;
        tracing::info!(%group, %user, "member added");
        Ok(())
    }

    pub fn remove_member(&self, group: &GroupRef, user: &UserId) -> Result<(), CodeReposError> {
        self.core.store.groups().remove_member(group, user)?;
        tracing::info!(%group, %user, "member removed");
        Ok(())
    }
}

pub struct EventsApi<'a, S: Store> {
    core: &'a CodeRepos<S>,
}

impl<'a, S: Store> EventsApi<'a, S> {
    pub fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, CodeReposError> {
        self.core.store.events().list(after, limit)
    }
}

pub struct NoticesApi<'a, S: Store> {
    core: &'a CodeRepos<S>,
}

impl<'a, S: Store> NoticesApi<'a, S> {
    /// Keeps a delivered notice so its recipients can read it later.
    pub fn record(&self, notice: &Notice) -> Result<StoredNotice, CodeReposError> {
        let stored = self.core.store.notices().record(notice)?;
        tracing::info!(seq = stored.seq, label = %stored.label, "notice stored");
        Ok(stored)
    }

    pub fn list(
        &self,
        user: &UserId,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<StoredNotice>, CodeReposError> {
        self.core.store.notices().list_for(user, after, limit)
    }
}

fn build_event_record(ctx: &RequestContext, body: EventBody) -> Result<EventRecord, CodeReposError> {
    let value = serde_json::to_value(body).map_err(|err| CodeReposError::Internal {
        message: err.to_string(),
    })?;
    Ok(EventRecord {
        id: String::new(),
        seq: 0,
        at: Utc::now(),
        correlation_id: ctx.correlation_id.clone(),
        source: ctx.source,
        body: value,
    })
}
