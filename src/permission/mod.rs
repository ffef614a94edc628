//! Permission checks evaluated by the HTTP handlers.
//!
//! A check is a `PermissionAcls` expression: leaves name a permission and the
//! acls required on one reference, combined with `or` / `and`. Leaves are
//! resolved through `PermissionService::find_all_permissions`, one call per
//! distinct reference.

use crate::domain::{merge_permissions, Acl, Permission, PermissionMap, ReferenceType};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::service::PermissionService;
use std::collections::{BTreeSet, HashMap};

type Reference = (ReferenceType, String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionAcls {
    Of {
        reference_type: ReferenceType,
        reference_id: String,
        permission: Permission,
        acls: Vec<Acl>,
    },
    Or(Vec<PermissionAcls>),
    And(Vec<PermissionAcls>),
}

impl PermissionAcls {
    pub fn of(
        reference_type: ReferenceType,
        reference_id: impl Into<String>,
        permission: Permission,
        acls: &[Acl],
    ) -> Self {
        PermissionAcls::Of {
            reference_type,
            reference_id: reference_id.into(),
            permission,
            acls: acls.to_vec(),
        }
    }

    pub fn or(children: Vec<PermissionAcls>) -> Self {
        PermissionAcls::Or(children)
    }

    pub fn and(children: Vec<PermissionAcls>) -> Self {
        PermissionAcls::And(children)
    }

    /// Distinct references the expression needs permissions for
    pub fn references(&self) -> BTreeSet<Reference> {
        let mut out = BTreeSet::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut BTreeSet<Reference>) {
        match self {
            PermissionAcls::Of {
                reference_type,
                reference_id,
                ..
            } => {
                out.insert((*reference_type, reference_id.clone()));
            }
            PermissionAcls::Or(children) | PermissionAcls::And(children) => {
                for child in children {
                    child.collect_references(out);
                }
            }
        }
    }

    /// Evaluate against permissions already resolved per reference.
    /// An empty `or` is never satisfied, an empty `and` always is.
    pub fn evaluate(&self, resolved: &HashMap<Reference, PermissionMap>) -> bool {
        match self {
            PermissionAcls::Of {
                reference_type,
                reference_id,
                permission,
                acls,
            } => resolved
                .get(&(*reference_type, reference_id.clone()))
                .and_then(|map| map.get(permission))
                .map(|granted| acls.iter().all(|acl| granted.contains(acl)))
                .unwrap_or(false),
            PermissionAcls::Or(children) => children.iter().any(|c| c.evaluate(resolved)),
            PermissionAcls::And(children) => children.iter().all(|c| c.evaluate(resolved)),
        }
    }
}

/// Position of a resource in the organization hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceScope {
    pub organization_id: String,
    pub environment_id: String,
    pub domain_id: Option<String>,
    pub application_id: Option<String>,
}

impl ResourceScope {
    pub fn environment(organization_id: &str, environment_id: &str) -> Self {
        Self {
            organization_id: organization_id.to_string(),
            environment_id: environment_id.to_string(),
            domain_id: None,
            application_id: None,
        }
    }

    pub fn domain(organization_id: &str, environment_id: &str, domain_id: &str) -> Self {
        Self {
            domain_id: Some(domain_id.to_string()),
            ..Self::environment(organization_id, environment_id)
        }
    }

    pub fn application(
        organization_id: &str,
        environment_id: &str,
        domain_id: &str,
        application_id: &str,
    ) -> Self {
        Self {
            application_id: Some(application_id.to_string()),
            ..Self::domain(organization_id, environment_id, domain_id)
        }
    }

    /// References from the most specific level up to the organization
    pub fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::with_capacity(4);
        if let Some(application_id) = &self.application_id {
            refs.push((ReferenceType::Application, application_id.clone()));
        }
        if let Some(domain_id) = &self.domain_id {
            refs.push((ReferenceType::Domain, domain_id.clone()));
        }
        refs.push((ReferenceType::Environment, self.environment_id.clone()));
        refs.push((ReferenceType::Organization, self.organization_id.clone()));
        refs
    }

    /// Permission granted on this level or on any level above it
    pub fn permission(&self, permission: Permission, acls: &[Acl]) -> PermissionAcls {
        PermissionAcls::or(
            self.references()
                .into_iter()
                .map(|(reference_type, reference_id)| {
                    PermissionAcls::of(reference_type, reference_id, permission, acls)
                })
                .collect(),
        )
    }

    /// UPDATE on every required permission; `fallback` when nothing is required
    pub fn update_all(
        &self,
        required: BTreeSet<Permission>,
        fallback: Permission,
    ) -> PermissionAcls {
        let required = if required.is_empty() {
            BTreeSet::from([fallback])
        } else {
            required
        };
        PermissionAcls::and(
            required
                .into_iter()
                .map(|permission| self.permission(permission, &[Acl::Update]))
                .collect(),
        )
    }
}

/// Resolve and evaluate a permission expression
pub async fn is_granted<P>(permissions: &P, auth: &AuthUser, acls: &PermissionAcls) -> Result<bool>
where
    P: PermissionService + ?Sized,
{
    let mut resolved = HashMap::new();
    for (reference_type, reference_id) in acls.references() {
        let map = permissions
            .find_all_permissions(auth, reference_type, &reference_id)
            .await?;
        resolved.insert((reference_type, reference_id), map);
    }
    Ok(acls.evaluate(&resolved))
}

/// Fail with 403 unless the expression is satisfied
pub async fn enforce<P>(permissions: &P, auth: &AuthUser, acls: &PermissionAcls) -> Result<()>
where
    P: PermissionService + ?Sized,
{
    if is_granted(permissions, auth, acls).await? {
        Ok(())
    } else {
        tracing::debug!(user_id = %auth.user_id, ?acls, "Permission denied");
        Err(AppError::permission_denied())
    }
}

/// Union of the principal's permissions over every level of the scope
pub async fn merged_permissions<P>(
    permissions: &P,
    auth: &AuthUser,
    scope: &ResourceScope,
) -> Result<PermissionMap>
where
    P: PermissionService + ?Sized,
{
    let mut merged = PermissionMap::new();
    for (reference_type, reference_id) in scope.references() {
        let map = permissions
            .find_all_permissions(auth, reference_type, &reference_id)
            .await?;
        merge_permissions(&mut merged, &map);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::permission::MockPermissionService;

    fn auth() -> AuthUser {
        AuthUser {
            user_id: "user-1".to_string(),
            username: "jdoe".to_string(),
            display_name: None,
            organization_id: "DEFAULT".to_string(),
        }
    }

    fn map(entries: &[(Permission, &[Acl])]) -> PermissionMap {
        entries
            .iter()
            .map(|(p, acls)| (*p, acls.iter().copied().collect()))
            .collect()
    }

    #[test]
    fn test_scope_references_order() {
        let scope = ResourceScope::application("org", "env", "dom", "app");
        let refs: Vec<_> = scope.references().into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            refs,
            vec![
                ReferenceType::Application,
                ReferenceType::Domain,
                ReferenceType::Environment,
                ReferenceType::Organization,
            ]
        );
        assert_eq!(ResourceScope::environment("org", "env").references().len(), 2);
    }

    #[test]
    fn test_leaf_requires_every_acl() {
        let acls = PermissionAcls::of(
            ReferenceType::Domain,
            "dom",
            Permission::Domain,
            &[Acl::Read, Acl::Update],
        );
        let mut resolved = HashMap::new();
        resolved.insert(
            (ReferenceType::Domain, "dom".to_string()),
            map(&[(Permission::Domain, &[Acl::Read])]),
        );
        assert!(!acls.evaluate(&resolved));

        resolved.insert(
            (ReferenceType::Domain, "dom".to_string()),
            map(&[(Permission::Domain, &[Acl::Read, Acl::Update])]),
        );
        assert!(acls.evaluate(&resolved));
    }

    #[test]
    fn test_empty_combinators() {
        let resolved = HashMap::new();
        assert!(!PermissionAcls::or(vec![]).evaluate(&resolved));
        assert!(PermissionAcls::and(vec![]).evaluate(&resolved));
    }

    #[test]
    fn test_update_all_falls_back_when_nothing_required() {
        let scope = ResourceScope::domain("org", "env", "dom");
        let acls = scope.update_all(BTreeSet::new(), Permission::DomainSettings);
        match acls {
            PermissionAcls::And(children) => {
                assert_eq!(children.len(), 1);
                assert_eq!(
                    children[0],
                    scope.permission(Permission::DomainSettings, &[Acl::Update])
                );
            }
            other => panic!("unexpected expression: {:?}", other),
        }
    }

    /// Permission service answering from a fixed table
    fn permissions_from(table: Vec<(ReferenceType, &'static str, PermissionMap)>) -> MockPermissionService {
        let mut permissions = MockPermissionService::new();
        permissions
            .expect_find_all_permissions()
            .returning(move |_, reference_type, reference_id| {
                Ok(table
                    .iter()
                    .find(|(t, id, _)| *t == reference_type && *id == reference_id)
                    .map(|(_, _, map)| map.clone())
                    .unwrap_or_default())
            });
        permissions
    }

    #[tokio::test]
    async fn test_org_level_grant_satisfies_domain_check() {
        let permissions = permissions_from(vec![(
            ReferenceType::Organization,
            "org",
            map(&[(Permission::Domain, &[Acl::Read])]),
        )]);

        let scope = ResourceScope::domain("org", "env", "dom");
        let acls = scope.permission(Permission::Domain, &[Acl::Read]);

        assert!(enforce(&permissions, &auth(), &acls).await.is_ok());
    }

    #[tokio::test]
    async fn test_and_requires_every_permission() {
        let permissions = permissions_from(vec![(
            ReferenceType::Domain,
            "dom",
            map(&[(Permission::DomainSettings, &[Acl::Update])]),
        )]);

        let scope = ResourceScope::domain("org", "env", "dom");
        let only_settings = scope.update_all(
            BTreeSet::from([Permission::DomainSettings]),
            Permission::DomainSettings,
        );
        assert!(is_granted(&permissions, &auth(), &only_settings)
            .await
            .unwrap());

        let settings_and_oidc = scope.update_all(
            BTreeSet::from([Permission::DomainSettings, Permission::DomainOpenid]),
            Permission::DomainSettings,
        );
        let err = enforce(&permissions, &auth(), &settings_and_oidc)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(msg) if msg == "Permission denied"));
    }

    #[tokio::test]
    async fn test_merged_permissions_unions_levels() {
        let permissions = permissions_from(vec![
            (
                ReferenceType::Domain,
                "dom",
                map(&[(Permission::DomainUser, &[Acl::Read])]),
            ),
            (
                ReferenceType::Organization,
                "org",
                map(&[
                    (Permission::DomainUser, &[Acl::List]),
                    (Permission::Domain, &[Acl::Read]),
                ]),
            ),
        ]);

        let merged = merged_permissions(
            &permissions,
            &auth(),
            &ResourceScope::domain("org", "env", "dom"),
        )
        .await
        .unwrap();

        assert_eq!(merged[&Permission::DomainUser].len(), 2);
        assert!(merged[&Permission::Domain].contains(&Acl::Read));
    }
}
