use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::instrument;

use super::Actor;
use super::identity::{ActorWatch, Identity, IdentityFeed};
use super::matrix::{Operation, authorize};
use crate::constants::DISPLAY_NAME_MAX_CHARS;
use crate::db::models::AccountId;
use crate::db::models::account::{Account, AccountSort, Role};
use crate::db::repositories::{Document, OrderBy, Repository};
use crate::db::StoreError;
use crate::error::{CoreError, CoreResult, NotAuthenticated, ValidationError};
use crate::util::normalize::{display_name_from_email, normalize_email};

/// Account bootstrap plus role and display-name administration.
#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn Repository<Account>>,
    admin_emails: Arc<HashSet<String>>,
    revision: Arc<watch::Sender<u64>>,
}

impl AccountService {
    pub fn new<I, S>(repo: Arc<dyn Repository<Account>>, admin_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let admin_emails = admin_emails
            .into_iter()
            .map(|e| normalize_email(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();

        let (revision, _rx) = watch::channel(0);

        Self {
            repo,
            admin_emails: Arc::new(admin_emails),
            revision: Arc::new(revision),
        }
    }

    pub fn is_admin_email(&self, email: Option<&str>) -> bool {
        email.is_some_and(|e| self.admin_emails.contains(&normalize_email(e)))
    }

    /// Returns the identity's account, creating it on first authentication.
    ///
    /// An existing account is returned untouched: neither its role nor its name is ever
    /// overwritten here.
    #[instrument(skip(self), fields(id = %identity.id))]
    pub async fn ensure_account(&self, identity: &Identity) -> CoreResult<Account> {
        if let Some(account) = self.repo.get(&identity.id).await? {
            return Ok(account);
        }

        let email = identity.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
        let role = if self.is_admin_email(email) {
            Role::Admin
        } else {
            Role::initial()
        };

        let account = Account {
            id: identity.id.clone(),
            email: email.map(str::to_owned),
            role,
            name: display_name_from_email(email),
            created_at: Utc::now(),
        };

        match self.repo.create(&account).await {
            Ok(_) => {
                tracing::info!(%role, "bootstrapped account");
                Ok(account)
            }
            // lost a race against a concurrent first sign-in
            Err(StoreError::Conflict { .. }) => self
                .repo
                .get(&identity.id)
                .await?
                .ok_or_else(|| CoreError::not_found(Account::COLLECTION, &identity.id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn actor_for(&self, identity: &Identity) -> CoreResult<Actor> {
        Ok(self.ensure_account(identity).await?.into())
    }

    pub async fn current_actor(&self, feed: &IdentityFeed) -> CoreResult<Actor> {
        let identity = feed.current().ok_or(NotAuthenticated)?;
        self.actor_for(&identity).await
    }

    pub fn watch(&self, feed: &IdentityFeed) -> ActorWatch {
        ActorWatch::new(feed.subscribe(), self.revision.subscribe(), self.clone())
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn list_accounts(&self, actor: &Actor) -> CoreResult<Vec<Account>> {
        authorize(actor, None, Operation::ListAccounts)?;
        Ok(self
            .repo
            .list(Some(OrderBy::asc(AccountSort::CreatedAt)), None)
            .await?)
    }

    /// Admin-only, and never on the admin's own account.
    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn set_role(&self, actor: &Actor, target: &AccountId, role: Role) -> CoreResult<Account> {
        let mut account = self.load(target).await?;
        authorize(actor, Some(&account.id), Operation::ChangeRole)?;

        if account.role == role {
            return Ok(account);
        }

        tracing::info!(from = %account.role, to = %role, "changing role");
        account.role = role;
        self.store(&account).await?;
        Ok(account)
    }

    #[instrument(skip(self, actor), fields(actor = %actor.id))]
    pub async fn set_display_name(
        &self,
        actor: &Actor,
        target: &AccountId,
        name: &str,
    ) -> CoreResult<Account> {
        let mut account = self.load(target).await?;
        authorize(actor, Some(&account.id), Operation::ChangeDisplayName)?;

        account.name = validate_display_name(name)?;
        self.store(&account).await?;
        Ok(account)
    }

    async fn load(&self, id: &AccountId) -> CoreResult<Account> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| CoreError::not_found(Account::COLLECTION, id))
    }

    async fn store(&self, account: &Account) -> CoreResult<()> {
        if !self.repo.update(account).await? {
            return Err(CoreError::not_found(Account::COLLECTION, &account.id));
        }

        self.revision.send_modify(|rev| *rev += 1);
        Ok(())
    }
}

fn validate_display_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyDisplayName);
    }
    if name.chars().count() > DISPLAY_NAME_MAX_CHARS {
        return Err(ValidationError::DisplayNameTooLong);
    }

    Ok(name.to_owned())
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::auth::identity::ActorState;
    use crate::db::repositories::memory::MemoryRepository;

    fn identity(id: &str, email: Option<&str>) -> Identity {
        Identity {
            id: id.into(),
            email: email.map(str::to_owned),
        }
    }

    fn service() -> (Arc<MemoryRepository<Account>>, AccountService) {
        let repo = Arc::new(MemoryRepository::<Account>::new());
        let svc = AccountService::new(repo.clone(), [" Mum@Example.com "]);
        (repo, svc)
    }

    #[tokio::test]
    async fn test_bootstrap_roles_from_allow_list() {
        let (repo, svc) = service();

        let mum = svc
            .ensure_account(&identity("mum", Some("mum@example.COM")))
            .await
            .unwrap();
        assert_eq!(mum.role, Role::Admin);
        assert_eq!(mum.name, "mum");

        let kid = svc
            .ensure_account(&identity("kid", Some("kid@example.com")))
            .await
            .unwrap();
        assert_eq!(kid.role, Role::Viewer);

        let anon = svc.ensure_account(&identity("anon", None)).await.unwrap();
        assert_eq!(anon.role, Role::Viewer);
        assert_eq!(anon.name, "someone");

        assert_eq!(repo.snapshot().await.len(), 3);
    }

    #[tokio::test]
    async fn test_bootstrap_never_overwrites() {
        let (repo, svc) = service();
        let admin = Actor::from(
            svc.ensure_account(&identity("mum", Some("mum@example.com")))
                .await
                .unwrap(),
        );
        svc.ensure_account(&identity("kid", Some("kid@example.com")))
            .await
            .unwrap();

        svc.set_role(&admin, &"kid".into(), Role::Editor).await.unwrap();
        svc.set_display_name(&admin, &"kid".into(), "Kiddo").await.unwrap();

        let again = svc
            .ensure_account(&identity("kid", Some("mum@example.com")))
            .await
            .unwrap();
        assert_eq!(again.role, Role::Editor);
        assert_eq!(again.name, "Kiddo");
        assert_eq!(repo.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_role_changes_are_admin_only_and_not_self() {
        let (_repo, svc) = service();
        let admin: Actor = svc
            .actor_for(&identity("mum", Some("mum@example.com")))
            .await
            .unwrap();
        let kid: Actor = svc
            .actor_for(&identity("kid", Some("kid@example.com")))
            .await
            .unwrap();

        let err = svc.set_role(&kid, &"kid".into(), Role::Admin).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { operation: Operation::ChangeRole }));

        let err = svc.set_role(&admin, &"mum".into(), Role::Viewer).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));

        let promoted = svc.set_role(&admin, &"kid".into(), Role::Admin).await.unwrap();
        assert_eq!(promoted.role, Role::Admin);

        let demoted = svc.set_role(&admin, &"kid".into(), Role::Viewer).await.unwrap();
        assert_eq!(demoted.role, Role::Viewer);

        let err = svc
            .set_role(&admin, &"ghost".into(), Role::Editor)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_display_name_rules() {
        let (_repo, svc) = service();
        svc.ensure_account(&identity("mum", Some("mum@example.com")))
            .await
            .unwrap();
        let kid = svc
            .actor_for(&identity("kid", Some("kid@example.com")))
            .await
            .unwrap();

        let renamed = svc.set_display_name(&kid, &"kid".into(), "  Bean ").await.unwrap();
        assert_eq!(renamed.name, "Bean");

        let err = svc.set_display_name(&kid, &"mum".into(), "Boss").await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden { .. }));

        let err = svc.set_display_name(&kid, &"kid".into(), "   ").await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::EmptyDisplayName)
        ));

        let long = "x".repeat(DISPLAY_NAME_MAX_CHARS + 1);
        let err = svc.set_display_name(&kid, &"kid".into(), &long).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::DisplayNameTooLong)
        ));
    }

    #[tokio::test]
    async fn test_list_accounts_admin_only() {
        let (_repo, svc) = service();
        let admin = svc
            .actor_for(&identity("mum", Some("mum@example.com")))
            .await
            .unwrap();
        let kid = svc.actor_for(&identity("kid", None)).await.unwrap();

        assert_eq!(svc.list_accounts(&admin).await.unwrap().len(), 2);
        assert!(svc.list_accounts(&kid).await.is_err());
    }

    #[tokio::test]
    async fn test_current_actor_requires_identity() {
        let (_repo, svc) = service();
        let feed = IdentityFeed::new();

        let err = svc.current_actor(&feed).await.unwrap_err();
        assert!(matches!(err, CoreError::NotAuthenticated(_)));

        feed.sign_in(identity("kid", None));
        let actor = svc.current_actor(&feed).await.unwrap();
        assert_eq!(actor.id, "kid".into());
        assert_eq!(actor.role, Role::Viewer);
    }

    #[tokio::test]
    async fn test_watch_follows_identity_and_role_changes() {
        let (_repo, svc) = service();
        let feed = IdentityFeed::new();
        let admin = svc
            .actor_for(&identity("mum", Some("mum@example.com")))
            .await
            .unwrap();

        let mut watch = svc.watch(&feed);
        assert_eq!(watch.next().await.unwrap().unwrap(), ActorState::SignedOut);

        feed.sign_in(identity("kid", None));
        let state = watch.next().await.unwrap().unwrap();
        assert!(matches!(state, ActorState::SignedIn(ref a) if a.role == Role::Viewer));

        svc.set_role(&admin, &"kid".into(), Role::Editor).await.unwrap();
        let state = watch.next().await.unwrap().unwrap();
        assert!(matches!(state, ActorState::SignedIn(ref a) if a.role == Role::Editor));

        feed.sign_out();
        assert_eq!(watch.next().await.unwrap().unwrap(), ActorState::SignedOut);

        drop(feed);
        let ended = tokio::time::timeout(Duration::from_secs(1), watch.next())
            .await
            .unwrap();
        assert!(ended.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let (repo, svc) = service();
        repo.set_offline(true);

        let err = svc.ensure_account(&identity("kid", None)).await.unwrap_err();
        assert!(matches!(err, CoreError::StoreUnavailable(StoreError::Unavailable(_))));
    }
}
