//! The authentication and authorization pipeline.
//!
//! [`Authenticator`] owns the identity cache, the credential resolver and
//! the configured security manager. [`Authenticator::authorize`] runs one
//! request through every stage:
//!
//! 1. Resolve signature lists into a [`CredentialSet`]
//! 2. Check the content hash and every signature (when enabled)
//! 3. Create a policy for the signer addresses
//! 4. Check validity, then each required permission

use std::sync::Arc;

use ledgerauth_core::{AddressDeriver, Blake3AddressDeriver, IdentityCache};
use ledgerauth_perms::{
    MultiIdsPolicy, Permission, SecurityManager, SecurityPolicy, TransactionPermission,
};

use crate::config::AuthConfig;
use crate::credential::{CollisionPolicy, CredentialResolver, CredentialSet};
use crate::error::{AuthError, Result};
use crate::request::TransactionRequest;

/// What a request must satisfy to be authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Rule for endpoint validity, or `None` to skip the check.
    pub endpoint_validity: Option<MultiIdsPolicy>,
    /// Rule for node validity, or `None` to skip the check.
    pub node_validity: Option<MultiIdsPolicy>,
    pub endpoint_permissions: Vec<(Permission, MultiIdsPolicy)>,
    pub node_permissions: Vec<(Permission, MultiIdsPolicy)>,
}

impl Default for Requirement {
    fn default() -> Self {
        Self {
            endpoint_validity: Some(MultiIdsPolicy::AtLeastOne),
            node_validity: Some(MultiIdsPolicy::AtLeastOne),
            endpoint_permissions: Vec::new(),
            node_permissions: Vec::new(),
        }
    }
}

impl Requirement {
    /// At least one valid endpoint and one valid node; no permissions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Submitting operations directly: some endpoint must hold
    /// [`TransactionPermission::DirectOperation`].
    pub fn direct_operation() -> Self {
        Self::new().endpoint_permission(
            TransactionPermission::DirectOperation,
            MultiIdsPolicy::AtLeastOne,
        )
    }

    /// Invoking a contract: some endpoint must hold
    /// [`TransactionPermission::ContractOperation`].
    pub fn contract_operation() -> Self {
        Self::new().endpoint_permission(
            TransactionPermission::ContractOperation,
            MultiIdsPolicy::AtLeastOne,
        )
    }

    pub fn endpoint_validity(mut self, rule: MultiIdsPolicy) -> Self {
        self.endpoint_validity = Some(rule);
        self
    }

    pub fn node_validity(mut self, rule: MultiIdsPolicy) -> Self {
        self.node_validity = Some(rule);
        self
    }

    pub fn skip_endpoint_validity(mut self) -> Self {
        self.endpoint_validity = None;
        self
    }

    pub fn skip_node_validity(mut self) -> Self {
        self.node_validity = None;
        self
    }

    pub fn endpoint_permission(mut self, permission: impl Into<Permission>, rule: MultiIdsPolicy) -> Self {
        self.endpoint_permissions.push((permission.into(), rule));
        self
    }

    pub fn node_permission(mut self, permission: impl Into<Permission>, rule: MultiIdsPolicy) -> Self {
        self.node_permissions.push((permission.into(), rule));
        self
    }

    /// Run every check against `policy`, failing on the first denial.
    pub fn check(&self, policy: &dyn SecurityPolicy) -> Result<()> {
        if let Some(rule) = self.endpoint_validity {
            policy.check_endpoint_validity(rule)?;
        }
        if let Some(rule) = self.node_validity {
            policy.check_node_validity(rule)?;
        }
        for (permission, rule) in &self.endpoint_permissions {
            policy.check_endpoint_permission(*permission, *rule)?;
        }
        for (permission, rule) in &self.node_permissions {
            policy.check_node_permission(*permission, *rule)?;
        }
        Ok(())
    }
}

/// Authenticates requests and authorizes them under one security manager.
#[derive(Debug, Clone)]
pub struct Authenticator {
    cache: Arc<IdentityCache>,
    resolver: CredentialResolver,
    manager: Arc<dyn SecurityManager>,
    verify_signatures: bool,
}

impl Authenticator {
    /// Build from configuration with the default address deriver.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        Self::with_deriver(config, Arc::new(Blake3AddressDeriver))
    }

    /// Build from configuration with a custom address deriver.
    pub fn with_deriver(config: &AuthConfig, deriver: Arc<dyn AddressDeriver>) -> Result<Self> {
        let manager = config.security.build()?;
        let cache = Arc::new(IdentityCache::new(deriver, config.identity_cache));
        Ok(Self::from_parts(
            cache,
            manager,
            config.collision,
            config.verify_signatures,
        ))
    }

    /// Assemble from already-built parts, e.g. to share one cache between
    /// several authenticators.
    pub fn from_parts(
        cache: Arc<IdentityCache>,
        manager: Arc<dyn SecurityManager>,
        collision: CollisionPolicy,
        verify_signatures: bool,
    ) -> Self {
        Self {
            resolver: CredentialResolver::new(Arc::clone(&cache), collision),
            cache,
            manager,
            verify_signatures,
        }
    }

    pub fn cache(&self) -> &Arc<IdentityCache> {
        &self.cache
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    pub fn manager(&self) -> &Arc<dyn SecurityManager> {
        &self.manager
    }

    /// Resolve credentials and, when enabled, verify the content hash and
    /// every signature.
    pub fn authenticate(&self, request: &TransactionRequest) -> Result<CredentialSet> {
        let credentials = self.resolver.resolve(request)?;
        if self.verify_signatures {
            if !request.is_content_hash_valid() {
                tracing::warn!(hash = ?request.content_hash, "content hash mismatch");
                return Err(AuthError::MalformedRequest(
                    "content hash does not match content".into(),
                ));
            }
            credentials.verify_signatures()?;
        }
        Ok(credentials)
    }

    /// A policy over the signer addresses of `credentials`.
    pub fn policy_for(&self, credentials: &CredentialSet) -> Box<dyn SecurityPolicy> {
        match (credentials.single_endpoint(), credentials.single_node()) {
            (Some(endpoint), Some(node)) => {
                self.manager.create_single_policy(endpoint.clone(), node.clone())
            }
            (None, Some(node)) => self
                .manager
                .create_single_node_policy(credentials.endpoint_addresses(), node.clone()),
            _ => self
                .manager
                .create_policy(credentials.endpoint_addresses(), credentials.node_addresses()),
        }
    }

    /// Authenticate `request` and check it against `requirement`.
    ///
    /// Returns the resolved credentials on success.
    pub fn authorize(
        &self,
        request: &TransactionRequest,
        requirement: &Requirement,
    ) -> Result<CredentialSet> {
        let credentials = self.authenticate(request)?;
        let policy = self.policy_for(&credentials);

        if let Err(e) = requirement.check(policy.as_ref()) {
            tracing::warn!(hash = ?credentials.content_hash(), error = %e, "authorization denied");
            return Err(e);
        }

        tracing::debug!(
            hash = ?credentials.content_hash(),
            endpoints = credentials.endpoint_count(),
            nodes = credentials.node_count(),
            "authorized"
        );
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityConfig;
    use crate::request::{DigitalSignature, RequestBuilder};
    use crate::test_support::{keypair, other_keypair, third_keypair};
    use ledgerauth_core::{Address, Keypair};
    use ledgerauth_perms::{AllowList, LedgerPermission, PermsError, RoleRegistry};

    fn address_of(kp: &Keypair) -> Address {
        Blake3AddressDeriver.derive(kp.public_key())
    }

    fn role_config() -> AuthConfig {
        let registry = RoleRegistry::new()
            .with_role("user", [TransactionPermission::DirectOperation.into()])
            .with_role("validator", [LedgerPermission::ApproveTx.into()])
            .with_endpoint(address_of(keypair()), "user")
            .with_node(address_of(third_keypair()), "validator");
        AuthConfig {
            security: SecurityConfig::RoleBased(registry),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_full_permissioned_accepts_signed_request() {
        let auth = Authenticator::new(&AuthConfig::default()).unwrap();
        let request = RequestBuilder::new(b"hello".to_vec())
            .endpoint(keypair())
            .node(other_keypair())
            .build()
            .unwrap();

        let credentials = auth.authorize(&request, &Requirement::direct_operation()).unwrap();
        assert!(credentials.is_single_endpoint_signature());
        assert_eq!(auth.cache().len(), 2);
    }

    #[test]
    fn test_role_based_allows_and_denies() {
        let auth = Authenticator::new(&role_config()).unwrap();

        let allowed = RequestBuilder::new(b"op".to_vec())
            .endpoint(keypair())
            .node(third_keypair())
            .build()
            .unwrap();
        let requirement = Requirement::direct_operation()
            .node_permission(LedgerPermission::ApproveTx, MultiIdsPolicy::All);
        auth.authorize(&allowed, &requirement).unwrap();

        let err = auth
            .authorize(&allowed, &Requirement::contract_operation())
            .unwrap_err();
        assert!(matches!(err, AuthError::Permission(PermsError::SecurityDenied(_))));

        let stranger = RequestBuilder::new(b"op".to_vec())
            .endpoint(other_keypair())
            .node(third_keypair())
            .build()
            .unwrap();
        assert!(auth.authorize(&stranger, &Requirement::new()).is_err());
    }

    #[test]
    fn test_missing_node_fails_node_validity() {
        let auth = Authenticator::new(&AuthConfig::default()).unwrap();
        let request = RequestBuilder::new(b"no node".to_vec())
            .endpoint(keypair())
            .build()
            .unwrap();

        // Full permissioned policies accept even an empty node set.
        auth.authorize(&request, &Requirement::new()).unwrap();

        let strict = Authenticator::new(&role_config()).unwrap();
        assert!(strict.authorize(&request, &Requirement::new()).is_err());
        strict
            .authorize(&request, &Requirement::direct_operation().skip_node_validity())
            .unwrap();
    }

    #[test]
    fn test_forged_signature_rejected() {
        let auth = Authenticator::new(&AuthConfig::default()).unwrap();
        let forged = DigitalSignature::new(keypair().public_key().to_raw(), vec![3u8; 256]);
        let request = RequestBuilder::new(b"forged".to_vec())
            .endpoint_signature(forged)
            .build()
            .unwrap();

        assert!(matches!(
            auth.authorize(&request, &Requirement::new()),
            Err(AuthError::InvalidSignature(_))
        ));

        let lenient = AuthConfig {
            verify_signatures: false,
            ..AuthConfig::default()
        };
        let auth = Authenticator::new(&lenient).unwrap();
        auth.authorize(&request, &Requirement::new()).unwrap();
    }

    #[test]
    fn test_content_hash_mismatch_rejected() {
        let auth = Authenticator::new(&AuthConfig::default()).unwrap();
        let mut request = RequestBuilder::new(b"original".to_vec())
            .endpoint(keypair())
            .build()
            .unwrap();
        request.content = b"swapped".to_vec().into();

        assert!(matches!(
            auth.authenticate(&request),
            Err(AuthError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_allow_list_multi_signer_rules() {
        let list = AllowList::new()
            .with_endpoint(address_of(keypair()))
            .with_node(address_of(third_keypair()));
        let config = AuthConfig {
            security: SecurityConfig::AllowList(list),
            ..AuthConfig::default()
        };
        let auth = Authenticator::new(&config).unwrap();
        let request = RequestBuilder::new(b"pair".to_vec())
            .endpoint(keypair())
            .endpoint(other_keypair())
            .node(third_keypair())
            .build()
            .unwrap();

        auth.authorize(&request, &Requirement::direct_operation()).unwrap();
        let all = Requirement::new().endpoint_validity(MultiIdsPolicy::All);
        assert!(auth.authorize(&request, &all).is_err());
    }

    #[test]
    fn test_custom_deriver() {
        let deriver = |pk: &ledgerauth_core::PublicKey| Address::from_bytes(pk.to_raw()[..8].to_vec());
        let auth = Authenticator::with_deriver(&AuthConfig::default(), Arc::new(deriver)).unwrap();
        let request = RequestBuilder::new(b"custom".to_vec())
            .endpoint(keypair())
            .build()
            .unwrap();

        let credentials = auth.authenticate(&request).unwrap();
        assert_eq!(credentials.single_endpoint().unwrap().as_bytes().len(), 8);
    }
}
