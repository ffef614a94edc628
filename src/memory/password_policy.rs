//! In-memory password policy service

use super::{not_found, MemoryStore};
use crate::domain::audit::{event_type, AuditEntity};
use crate::domain::{new_id, NewPasswordPolicy, PasswordPolicy, ReferenceType, UpdatePasswordPolicy};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::service::PasswordPolicyService;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

fn audit_target(policy: &PasswordPolicy) -> AuditEntity {
    AuditEntity {
        id: policy.id.clone(),
        entity_type: "PASSWORD_POLICY".to_string(),
        display_name: Some(policy.name.clone()),
    }
}

fn check(input: &NewPasswordPolicy) -> Result<()> {
    input.validate()?;
    input.check_lengths().map_err(AppError::BadRequest)
}

fn apply_rules(policy: &mut PasswordPolicy, input: UpdatePasswordPolicy) {
    policy.name = input.name;
    policy.min_length = input.min_length;
    policy.max_length = input.max_length;
    policy.include_numbers = input.include_numbers;
    policy.include_special_characters = input.include_special_characters;
    policy.letters_in_mixed_case = input.letters_in_mixed_case;
    policy.max_consecutive_letters = input.max_consecutive_letters;
    policy.exclude_user_profile_info_in_password = input.exclude_user_profile_info_in_password;
    policy.password_history_enabled = input.password_history_enabled;
    policy.old_passwords = input.old_passwords;
    policy.expiry_duration = input.expiry_duration;
}

pub struct MemoryPasswordPolicyService {
    store: Arc<MemoryStore>,
}

impl MemoryPasswordPolicyService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PasswordPolicyService for MemoryPasswordPolicyService {
    async fn find_by_domain(&self, domain: &str) -> Result<Vec<PasswordPolicy>> {
        let data = self.store.read().await;
        let mut policies: Vec<PasswordPolicy> = data
            .password_policies
            .values()
            .filter(|p| p.domain == domain)
            .cloned()
            .collect();
        policies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(policies)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<PasswordPolicy>> {
        Ok(self.store.read().await.password_policies.get(id).cloned())
    }

    async fn create(
        &self,
        domain: &str,
        input: NewPasswordPolicy,
        principal: &AuthUser,
    ) -> Result<PasswordPolicy> {
        check(&input)?;

        let mut data = self.store.write().await;
        if !data.domain_exists(domain) {
            return Err(not_found("Domain", domain));
        }
        let first = !data.password_policies.values().any(|p| p.domain == domain);

        let now = Utc::now();
        let mut policy = PasswordPolicy {
            id: new_id(),
            name: String::new(),
            domain: domain.to_string(),
            default_policy: first,
            min_length: None,
            max_length: None,
            include_numbers: false,
            include_special_characters: false,
            letters_in_mixed_case: false,
            max_consecutive_letters: None,
            exclude_user_profile_info_in_password: false,
            password_history_enabled: false,
            old_passwords: None,
            expiry_duration: None,
            created_at: now,
            updated_at: now,
        };
        apply_rules(&mut policy, input);

        data.password_policies
            .insert(policy.id.clone(), policy.clone());
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::PASSWORD_POLICY_CREATED,
            principal,
            audit_target(&policy),
        );

        tracing::info!(domain_id = %domain, password_policy_id = %policy.id, default = first, "Password policy created");
        Ok(policy)
    }

    async fn update(
        &self,
        domain: &str,
        id: &str,
        input: UpdatePasswordPolicy,
        principal: &AuthUser,
    ) -> Result<PasswordPolicy> {
        check(&input)?;

        let mut data = self.store.write().await;
        let policy = data
            .password_policies
            .get_mut(id)
            .filter(|p| p.domain == domain)
            .ok_or_else(|| not_found("Password policy", id))?;

        apply_rules(policy, input);
        policy.updated_at = Utc::now();
        let policy = policy.clone();

        data.record(
            ReferenceType::Domain,
            domain,
            event_type::PASSWORD_POLICY_UPDATED,
            principal,
            audit_target(&policy),
        );
        Ok(policy)
    }

    async fn delete(&self, domain: &str, id: &str, principal: &AuthUser) -> Result<()> {
        let mut data = self.store.write().await;
        let policy = data
            .password_policies
            .get(id)
            .filter(|p| p.domain == domain)
            .cloned()
            .ok_or_else(|| not_found("Password policy", id))?;

        data.password_policies.remove(id);
        data.record(
            ReferenceType::Domain,
            domain,
            event_type::PASSWORD_POLICY_DELETED,
            principal,
            audit_target(&policy),
        );

        tracing::info!(domain_id = %domain, password_policy_id = %id, "Password policy deleted");
        Ok(())
    }

    async fn set_default(
        &self,
        domain: &str,
        id: &str,
        principal: &AuthUser,
    ) -> Result<PasswordPolicy> {
        let mut data = self.store.write().await;
        let owned = data
            .password_policies
            .get(id)
            .is_some_and(|p| p.domain == domain);
        if !owned {
            return Err(not_found("Password policy", id));
        }

        let now = Utc::now();
        for policy in data
            .password_policies
            .values_mut()
            .filter(|p| p.domain == domain)
        {
            let is_target = policy.id == id;
            if policy.default_policy != is_target {
                policy.default_policy = is_target;
                policy.updated_at = now;
            }
        }
        let policy = data
            .password_policies
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("Password policy", id))?;

        data.record(
            ReferenceType::Domain,
            domain,
            event_type::PASSWORD_POLICY_UPDATED,
            principal,
            audit_target(&policy),
        );
        Ok(policy)
    }
}
