//! In-memory user service

use super::{not_found, paginate, MemoryStore, StoreData};
use crate::crypto::{hash_password_blocking, matches_any_blocking};
use crate::domain::audit::{event_type, AuditEntity};
use crate::domain::{new_id, NewUser, PasswordPolicy, ReferenceType, UpdateUser, User};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::service::UserService;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

fn audit_target(user: &User) -> AuditEntity {
    AuditEntity {
        id: user.id.clone(),
        entity_type: "USER".to_string(),
        display_name: Some(user.computed_display_name()),
    }
}

fn default_password_policy<'a>(data: &'a StoreData, domain: &str) -> Option<&'a PasswordPolicy> {
    data.password_policies
        .values()
        .find(|p| p.domain == domain && p.default_policy)
}

fn check_password(
    data: &StoreData,
    domain: &str,
    password: &str,
    user: Option<&User>,
) -> Result<()> {
    match default_password_policy(data, domain) {
        Some(policy) => policy.evaluate(password, user).map_err(AppError::BadRequest),
        None => Ok(()),
    }
}

fn username_taken(data: &StoreData, domain: &str, source: &str, username: &str) -> bool {
    data.users
        .values()
        .any(|u| u.domain == domain && u.source == source && u.username == username)
}

fn check_client(data: &StoreData, domain: &str, client: Option<&str>) -> Result<()> {
    if let Some(client) = client {
        let known = data
            .applications
            .values()
            .any(|a| a.domain == domain && (a.id == client || a.client_id() == Some(client)));
        if !known {
            return Err(AppError::BadRequest(format!(
                "Client [{}] does not exist in domain",
                client
            )));
        }
    }
    Ok(())
}

pub struct MemoryUserService {
    store: Arc<MemoryStore>,
}

impl MemoryUserService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Apply `change` to a user of `domain` and record `event`
    async fn modify<F>(
        &self,
        domain: &str,
        id: &str,
        event: &str,
        principal: &AuthUser,
        change: F,
    ) -> Result<User>
    where
        F: FnOnce(&mut User) + Send,
    {
        self.modify_checked(domain, id, event, principal, |_| Ok(()), change)
            .await
    }

    /// Like `modify`, with `check` run against the store under the same write lock
    async fn modify_checked<C, F>(
        &self,
        domain: &str,
        id: &str,
        event: &str,
        principal: &AuthUser,
        check: C,
        change: F,
    ) -> Result<User>
    where
        C: FnOnce(&StoreData) -> Result<()> + Send,
        F: FnOnce(&mut User) + Send,
    {
        let mut data = self.store.write().await;
        if !data.users.get(id).is_some_and(|u| u.domain == domain) {
            return Err(not_found("User", id));
        }
        check(&*data)?;

        let user = data
            .users
            .get_mut(id)
            .ok_or_else(|| not_found("User", id))?;
        change(user);
        user.updated_at = Utc::now();
        let user = user.clone();

        data.record(ReferenceType::Domain, domain, event, principal, audit_target(&user));
        Ok(user)
    }
}

#[async_trait]
impl UserService for MemoryUserService {
    async fn search(
        &self,
        domain: &str,
        query: Option<String>,
        page: u32,
        size: u32,
    ) -> Result<(Vec<User>, u64)> {
        let data = self.store.read().await;
        let mut users: Vec<User> = data
            .users
            .values()
            .filter(|u| u.domain == domain)
            .filter(|u| query.as_deref().map(|q| u.matches(q)).unwrap_or(true))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        let total = users.len() as u64;
        Ok((paginate(&users, page, size), total))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.store.read().await.users.get(id).cloned())
    }

    async fn create(&self, domain: &str, input: NewUser, principal: &AuthUser) -> Result<User> {
        input.validate()?;
        if input.password.is_none() && !input.pre_registration {
            return Err(AppError::BadRequest(
                "Field [password] is required".to_string(),
            ));
        }

        let source = input
            .source
            .unwrap_or_else(|| format!("default-idp-{}", domain));
        let now = Utc::now();
        let mut user = User {
            id: new_id(),
            username: input.username,
            email: input.email,
            display_name: input.display_name,
            first_name: input.first_name,
            last_name: input.last_name,
            source,
            client: input.client,
            domain: domain.to_string(),
            enabled: !input.pre_registration,
            account_non_locked: true,
            account_locked_at: None,
            pre_registration: input.pre_registration,
            registration_completed: !input.pre_registration,
            additional_information: input.additional_information,
            last_password_reset: None,
            password_hash: None,
            password_history: vec![],
            created_at: now,
            updated_at: now,
        };

        if let Some(password) = input.password {
            {
                let data = self.store.read().await;
                check_password(&data, domain, &password, Some(&user))?;
            }
            user.password_hash = Some(hash_password_blocking(password).await?);
        }

        let mut data = self.store.write().await;
        if !data.domain_exists(domain) {
            return Err(not_found("Domain", domain));
        }

        let source = &user.source;
        let source_known = data
            .identity_providers
            .get(source)
            .is_some_and(|p| p.domain == domain);
        if !source_known {
            return Err(AppError::BadRequest(format!(
                "Identity provider [{}] does not exist in domain",
                source
            )));
        }
        if username_taken(&data, domain, source, &user.username) {
            return Err(AppError::Conflict(format!(
                "User [{}] already exists",
                user.username
            )));
        }
        check_client(&data, domain, user.client.as_deref())?;

        data.users.insert(user.id.clone(), user.clone());
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::USER_CREATED,
            principal,
            audit_target(&user),
        );

        tracing::info!(domain_id = %domain, user_id = %user.id, "User created");
        Ok(user)
    }

    async fn update(
        &self,
        domain: &str,
        id: &str,
        input: UpdateUser,
        principal: &AuthUser,
    ) -> Result<User> {
        input.validate()?;
        let client = input.client.clone();

        let check = |data: &StoreData| check_client(data, domain, client.as_deref());
        self.modify_checked(domain, id, event_type::USER_UPDATED, principal, check, |user| {
            if let Some(email) = input.email {
                user.email = Some(email);
            }
            if let Some(first_name) = input.first_name {
                user.first_name = Some(first_name);
            }
            if let Some(last_name) = input.last_name {
                user.last_name = Some(last_name);
            }
            if let Some(display_name) = input.display_name {
                user.display_name = Some(display_name);
            }
            if let Some(enabled) = input.enabled {
                user.enabled = enabled;
            }
            if let Some(client) = input.client {
                user.client = Some(client);
            }
            if let Some(additional_information) = input.additional_information {
                user.additional_information = additional_information;
            }
        })
        .await
    }

    async fn delete(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<()> {
        let mut data = self.store.write().await;
        let user = data
            .users
            .get(id)
            .filter(|u| u.domain == domain)
            .cloned()
            .ok_or_else(|| not_found("User", id))?;

        data.users.remove(id);
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::USER_DELETED,
            principal,
            audit_target(&user),
        );

        tracing::info!(domain_id = %domain, user_id = %id, "User deleted");
        Ok(())
    }

    async fn update_status(
        &self,
        domain: &str,
        id: &str,
        enabled: bool,
        principal: &AuthUser,
    ) -> Result<User> {
        self.modify(domain, id, event_type::USER_UPDATED, principal, |user| {
            user.enabled = enabled;
        })
        .await
    }

    async fn reset_password(
        &self,
        domain: &str,
        id: &str,
        password: String,
        principal: &AuthUser,
    ) -> Result<()> {
        let (depth, previous) = {
            let data = self.store.read().await;
            let user = data
                .users
                .get(id)
                .filter(|u| u.domain == domain)
                .ok_or_else(|| not_found("User", id))?;

            check_password(&data, domain, &password, Some(user))?;

            let depth = default_password_policy(&data, domain)
                .map(PasswordPolicy::history_depth)
                .unwrap_or(0);
            let previous: Vec<String> = user
                .password_hash
                .iter()
                .chain(user.password_history.iter())
                .take(depth)
                .cloned()
                .collect();
            (depth, previous)
        };

        if matches_any_blocking(password.clone(), previous).await? {
            return Err(AppError::BadRequest(
                "Password already used recently".to_string(),
            ));
        }
        let hash = hash_password_blocking(password).await?;

        let mut data = self.store.write().await;
        let now = Utc::now();
        let stored = data
            .users
            .get_mut(id)
            .filter(|u| u.domain == domain)
            .ok_or_else(|| not_found("User", id))?;
        if let Some(old) = stored.password_hash.replace(hash) {
            stored.password_history.insert(0, old);
            stored.password_history.truncate(depth.max(1));
        }
        stored.last_password_reset = Some(now);
        stored.updated_at = now;
        let user = stored.clone();

        data.record(
            ReferenceType::Domain,
            domain,
            event_type::USER_PASSWORD_RESET,
            principal,
            audit_target(&user),
        );

        tracing::info!(domain_id = %domain, user_id = %id, "User password reset");
        Ok(())
    }

    async fn lock(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<User> {
        self.modify(domain, id, event_type::USER_LOCKED, principal, |user| {
            user.account_non_locked = false;
            user.account_locked_at = Some(Utc::now());
        })
        .await
    }

    async fn unlock(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<User> {
        self.modify(domain, id, event_type::USER_UNLOCKED, principal, |user| {
            user.account_non_locked = true;
            user.account_locked_at = None;
        })
        .await
    }

    async fn update_username(
        &self,
        domain: &str,
        id: &str,
        username: String,
        principal: &AuthUser,
    ) -> Result<User> {
        let check = |data: &StoreData| {
            let taken = data
                .users
                .values()
                .any(|u| u.domain == domain && u.username == username && u.id != id);
            if taken {
                return Err(AppError::Conflict(format!(
                    "User [{}] already exists",
                    username
                )));
            }
            Ok(())
        };
        let renamed = username.clone();

        self.modify_checked(domain, id, event_type::USERNAME_UPDATED, principal, check, |user| {
            user.username = renamed;
        })
        .await
    }
}
