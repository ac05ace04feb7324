// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Per-container credential cache.
//!
//! [`CredentialsProvider`] answers "what are my credentials?" for a caller
//! identified by IP address. Credentials are cached per address and reused
//! until the container behind the address changes (different id or role) or
//! the credentials come within [`CREDENTIAL_REFRESH_BUFFER`] of expiring.
//!
//! # Locking
//!
//! A single mutex covers the whole lookup, including the STS call. At most one
//! `AssumeRole` request is in flight across all addresses, so concurrent
//! requests for the same address never assume the role twice. Requests for
//! unrelated addresses queue behind a slow STS call.
//!
//! [`CREDENTIAL_REFRESH_BUFFER`]: crate::constants::CREDENTIAL_REFRESH_BUFFER

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::arn::RoleArn;
use crate::constants;
use crate::containers::{ContainerInfo, ContainerService};
use crate::credentials::{ContainerCredentials, Credentials};
use crate::errors::AppError;
use crate::session::generate_session_name;
use crate::sts::{AssumeRoleRequest, RoleAssumer};

pub struct CredentialsProvider {
    containers: Arc<dyn ContainerService>,
    sts: Arc<dyn RoleAssumer>,
    default_role: RoleArn,
    default_policy: Option<String>,
    cache: Mutex<HashMap<IpAddr, ContainerCredentials>>,
}

impl CredentialsProvider {
    pub fn new(
        containers: Arc<dyn ContainerService>,
        sts: Arc<dyn RoleAssumer>,
        default_role: RoleArn,
        default_policy: Option<String>,
    ) -> Self {
        Self {
            containers,
            sts,
            default_role,
            default_policy: default_policy.filter(|policy| !policy.trim().is_empty()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns cached credentials for the container at `address` if still
    /// valid, otherwise assumes its role and caches the result.
    ///
    /// # Errors
    ///
    /// - Lookup errors from the [`ContainerService`] are returned unchanged
    /// - [`AppError::RoleNotConfigured`] if neither the container nor the
    ///   provider has a role
    /// - [`AppError::AssumeRoleError`] if STS rejects the request
    ///
    /// A failure never modifies the cache.
    #[tracing::instrument(skip(self))]
    pub async fn credentials_for_ip(&self, address: IpAddr) -> Result<Credentials, AppError> {
        let mut cache = self.cache.lock().await;

        let container = self.containers.container_for_ip(address).await?;

        if let Some(cached) = cache.get(&address)
            && cached.is_valid(&container)
        {
            tracing::debug!("[proxy] using cached credentials for container {}", container.id);
            return Ok(cached.credentials.clone());
        }

        let (role_arn, policy) = self.effective_role_and_policy(&container)?;
        let session_name = generate_session_name(self.containers.type_name(), &container.id);

        tracing::info!(
            "[proxy] assuming role {} for container {} (session {})",
            role_arn,
            container.id,
            session_name
        );

        let credentials = self
            .assume_role(&role_arn, policy.as_deref(), &session_name)
            .await?;

        cache.insert(
            address,
            ContainerCredentials::new(container, credentials.clone()),
        );

        Ok(credentials)
    }

    /// Calls STS for a one hour session. The policy is left out of the request
    /// when `None` or blank.
    pub async fn assume_role(
        &self,
        role_arn: &RoleArn,
        policy: Option<&str>,
        session_name: &str,
    ) -> Result<Credentials, AppError> {
        let request = AssumeRoleRequest {
            role_arn: role_arn.clone(),
            policy: policy
                .filter(|policy| !policy.trim().is_empty())
                .map(str::to_string),
            session_name: session_name.to_string(),
            duration_seconds: constants::ASSUME_ROLE_DURATION_SECONDS,
        };

        let assumed = self.sts.assume_role(request).await?;

        Ok(Credentials::new(
            assumed.access_key_id,
            assumed.secret_access_key,
            assumed.session_token,
            role_arn.clone(),
            assumed.expiration,
            Utc::now(),
        ))
    }

    /// Snapshot of the cache entry for `address`, if any.
    pub async fn cached(&self, address: IpAddr) -> Option<ContainerCredentials> {
        self.cache.lock().await.get(&address).cloned()
    }

    /// A container's own role wins. The default policy only applies when the
    /// container falls back to the default role and declared no policy itself.
    fn effective_role_and_policy(
        &self,
        container: &ContainerInfo,
    ) -> Result<(RoleArn, Option<String>), AppError> {
        if !container.iam_role.is_empty() {
            return Ok((container.iam_role.clone(), container.iam_policy.clone()));
        }

        if self.default_role.is_empty() {
            return Err(AppError::RoleNotConfigured(container.id.clone()));
        }

        let policy = container
            .iam_policy
            .clone()
            .or_else(|| self.default_policy.clone());

        Ok((self.default_role.clone(), policy))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::TimeDelta;

    use crate::sts::AssumedRole;

    const WEB_ROLE: &str = "arn:aws:iam::123456789012:role/web";
    const API_ROLE: &str = "arn:aws:iam::123456789012:role/api";
    const DEFAULT_ROLE: &str = "arn:aws:iam::123456789012:role/default";
    const DEFAULT_POLICY: &str = r#"{"Version":"2012-10-17","Statement":[]}"#;
    const CONTAINER_POLICY: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Deny"}]}"#;

    struct MockContainers {
        containers: StdMutex<HashMap<IpAddr, ContainerInfo>>,
        lookups: AtomicUsize,
    }

    impl MockContainers {
        fn new() -> Self {
            Self {
                containers: StdMutex::new(HashMap::new()),
                lookups: AtomicUsize::new(0),
            }
        }

        fn set(&self, address: IpAddr, container: ContainerInfo) {
            self.containers.lock().unwrap().insert(address, container);
        }
    }

    #[async_trait]
    impl ContainerService for MockContainers {
        async fn container_for_ip(&self, address: IpAddr) -> Result<ContainerInfo, AppError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.containers
                .lock()
                .unwrap()
                .get(&address)
                .cloned()
                .ok_or_else(|| AppError::ContainerNotFound(address.to_string()))
        }

        fn type_name(&self) -> &str {
            "docker"
        }
    }

    struct MockSts {
        requests: StdMutex<Vec<AssumeRoleRequest>>,
        lifetime: StdMutex<TimeDelta>,
        delay: Duration,
        fail: AtomicBool,
    }

    impl MockSts {
        fn new() -> Self {
            Self::with_delay(Duration::ZERO)
        }

        fn with_delay(delay: Duration) -> Self {
            Self {
                requests: StdMutex::new(Vec::new()),
                lifetime: StdMutex::new(TimeDelta::hours(1)),
                delay,
                fail: AtomicBool::new(false),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_request(&self) -> AssumeRoleRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl RoleAssumer for MockSts {
        async fn assume_role(&self, request: AssumeRoleRequest) -> Result<AssumedRole, AppError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let call = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(request);
                requests.len()
            };
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::AssumeRoleError("AccessDenied".to_string()));
            }
            Ok(AssumedRole {
                access_key_id: format!("AKIA{call}"),
                secret_access_key: format!("secret{call}"),
                session_token: format!("token{call}"),
                expiration: Utc::now() + *self.lifetime.lock().unwrap(),
            })
        }
    }

    fn address() -> IpAddr {
        "172.17.0.2".parse().unwrap()
    }

    fn container(id: &str, role: &str, policy: Option<&str>) -> ContainerInfo {
        ContainerInfo::new(id, role.parse().unwrap(), policy.map(str::to_string))
    }

    fn provider(containers: Arc<MockContainers>, sts: Arc<MockSts>) -> CredentialsProvider {
        CredentialsProvider::new(
            containers,
            sts,
            DEFAULT_ROLE.parse().unwrap(),
            Some(DEFAULT_POLICY.to_string()),
        )
    }

    #[tokio::test]
    async fn test_first_request_assumes_role() {
        let containers = Arc::new(MockContainers::new());
        let sts = Arc::new(MockSts::new());
        containers.set(address(), container("abc123", WEB_ROLE, None));
        let provider = provider(containers, sts.clone());

        let credentials = provider.credentials_for_ip(address()).await.unwrap();

        assert_eq!(credentials.access_key_id(), "AKIA1");
        assert_eq!(credentials.role_arn().as_str(), WEB_ROLE);
        assert!(credentials.generated_at() <= credentials.expiration());

        let request = sts.last_request();
        assert_eq!(request.role_arn.as_str(), WEB_ROLE);
        assert_eq!(request.policy, None);
        assert_eq!(request.session_name, "docker-abc123");
        assert_eq!(request.duration_seconds, 3600);
    }

    #[tokio::test]
    async fn test_valid_entry_is_reused() {
        let containers = Arc::new(MockContainers::new());
        let sts = Arc::new(MockSts::new());
        containers.set(address(), container("abc123", WEB_ROLE, None));
        let provider = provider(containers.clone(), sts.clone());

        let first = provider.credentials_for_ip(address()).await.unwrap();
        let second = provider.credentials_for_ip(address()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(sts.calls(), 1);
        // identity is resolved on every request
        assert_eq!(containers.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_role_change_triggers_refresh() {
        let containers = Arc::new(MockContainers::new());
        let sts = Arc::new(MockSts::new());
        containers.set(address(), container("abc123", WEB_ROLE, None));
        let provider = provider(containers.clone(), sts.clone());

        let first = provider.credentials_for_ip(address()).await.unwrap();
        containers.set(address(), container("abc123", API_ROLE, None));
        let second = provider.credentials_for_ip(address()).await.unwrap();

        assert_eq!(sts.calls(), 2);
        assert_ne!(first.access_key_id(), second.access_key_id());
        assert_eq!(second.role_arn().as_str(), API_ROLE);
        assert_eq!(sts.last_request().role_arn.as_str(), API_ROLE);
    }

    #[tokio::test]
    async fn test_container_change_triggers_refresh() {
        let containers = Arc::new(MockContainers::new());
        let sts = Arc::new(MockSts::new());
        containers.set(address(), container("abc123", WEB_ROLE, None));
        let provider = provider(containers.clone(), sts.clone());

        provider.credentials_for_ip(address()).await.unwrap();
        containers.set(address(), container("def456", WEB_ROLE, None));
        provider.credentials_for_ip(address()).await.unwrap();

        assert_eq!(sts.calls(), 2);
        assert_eq!(sts.last_request().session_name, "docker-def456");
        assert_eq!(provider.cached(address()).await.unwrap().container.id, "def456");
    }

    #[tokio::test]
    async fn test_near_expiry_triggers_refresh() {
        let containers = Arc::new(MockContainers::new());
        let sts = Arc::new(MockSts::new());
        *sts.lifetime.lock().unwrap() = TimeDelta::minutes(4);
        containers.set(address(), container("abc123", WEB_ROLE, None));
        let provider = provider(containers, sts.clone());

        provider.credentials_for_ip(address()).await.unwrap();
        provider.credentials_for_ip(address()).await.unwrap();

        assert_eq!(sts.calls(), 2);
    }

    #[tokio::test]
    async fn test_default_role_and_policy() {
        let containers = Arc::new(MockContainers::new());
        let sts = Arc::new(MockSts::new());
        containers.set(address(), container("abc123", "", None));
        let provider = provider(containers, sts.clone());

        let credentials = provider.credentials_for_ip(address()).await.unwrap();

        let request = sts.last_request();
        assert_eq!(request.role_arn.as_str(), DEFAULT_ROLE);
        assert_eq!(request.policy.as_deref(), Some(DEFAULT_POLICY));
        assert_eq!(credentials.role_arn().as_str(), DEFAULT_ROLE);
    }

    #[tokio::test]
    async fn test_container_policy_overrides_default_policy() {
        let containers = Arc::new(MockContainers::new());
        let sts = Arc::new(MockSts::new());
        containers.set(address(), container("abc123", "", Some(CONTAINER_POLICY)));
        let provider = provider(containers, sts.clone());

        provider.credentials_for_ip(address()).await.unwrap();

        let request = sts.last_request();
        assert_eq!(request.role_arn.as_str(), DEFAULT_ROLE);
        assert_eq!(request.policy.as_deref(), Some(CONTAINER_POLICY));
    }

    #[tokio::test]
    async fn test_own_role_never_gets_default_policy() {
        let containers = Arc::new(MockContainers::new());
        let sts = Arc::new(MockSts::new());
        containers.set(address(), container("abc123", WEB_ROLE, None));
        containers.set(
            "172.17.0.3".parse().unwrap(),
            container("def456", API_ROLE, Some(CONTAINER_POLICY)),
        );
        let provider = provider(containers, sts.clone());

        provider.credentials_for_ip(address()).await.unwrap();
        assert_eq!(sts.last_request().policy, None);

        provider
            .credentials_for_ip("172.17.0.3".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(sts.last_request().policy.as_deref(), Some(CONTAINER_POLICY));
    }

    #[tokio::test]
    async fn test_blank_policy_is_omitted() {
        let sts = Arc::new(MockSts::new());
        let provider = provider(Arc::new(MockContainers::new()), sts.clone());

        provider
            .assume_role(&WEB_ROLE.parse().unwrap(), Some("  "), "docker-abc")
            .await
            .unwrap();

        assert_eq!(sts.last_request().policy, None);
    }

    #[tokio::test]
    async fn test_missing_role_is_an_error() {
        let containers = Arc::new(MockContainers::new());
        let sts = Arc::new(MockSts::new());
        containers.set(address(), container("abc123", "", None));
        let provider = CredentialsProvider::new(containers, sts.clone(), RoleArn::empty(), None);

        let result = provider.credentials_for_ip(address()).await;

        assert_eq!(result, Err(AppError::RoleNotConfigured("abc123".to_string())));
        assert_eq!(sts.calls(), 0);
        assert!(provider.cached(address()).await.is_none());
    }

    #[tokio::test]
    async fn test_lookup_error_is_propagated() {
        let sts = Arc::new(MockSts::new());
        let provider = provider(Arc::new(MockContainers::new()), sts.clone());

        let result = provider.credentials_for_ip(address()).await;

        assert_eq!(result, Err(AppError::ContainerNotFound("172.17.0.2".to_string())));
        assert_eq!(sts.calls(), 0);
    }

    #[tokio::test]
    async fn test_sts_failure_is_propagated_and_not_cached() {
        let containers = Arc::new(MockContainers::new());
        let sts = Arc::new(MockSts::new());
        sts.fail.store(true, Ordering::SeqCst);
        containers.set(address(), container("abc123", WEB_ROLE, None));
        let provider = provider(containers, sts.clone());

        let result = provider.credentials_for_ip(address()).await;

        assert_eq!(result, Err(AppError::AssumeRoleError("AccessDenied".to_string())));
        assert!(provider.cached(address()).await.is_none());
    }

    #[tokio::test]
    async fn test_sts_failure_keeps_valid_entry() {
        let containers = Arc::new(MockContainers::new());
        let sts = Arc::new(MockSts::new());
        containers.set(address(), container("abc123", WEB_ROLE, None));
        let provider = provider(containers, sts.clone());

        let first = provider.credentials_for_ip(address()).await.unwrap();
        sts.fail.store(true, Ordering::SeqCst);
        let second = provider.credentials_for_ip(address()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(sts.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_stale_entry_untouched() {
        let containers = Arc::new(MockContainers::new());
        let sts = Arc::new(MockSts::new());
        containers.set(address(), container("abc123", WEB_ROLE, None));
        let provider = provider(containers.clone(), sts.clone());

        let first = provider.credentials_for_ip(address()).await.unwrap();
        sts.fail.store(true, Ordering::SeqCst);
        containers.set(address(), container("abc123", API_ROLE, None));

        let result = provider.credentials_for_ip(address()).await;
        assert!(matches!(result, Err(AppError::AssumeRoleError(_))));

        let cached = provider.cached(address()).await.unwrap();
        assert_eq!(cached.credentials, first);
        assert_eq!(cached.container.iam_role.as_str(), WEB_ROLE);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_assume_once() {
        let containers = Arc::new(MockContainers::new());
        let sts = Arc::new(MockSts::with_delay(Duration::from_millis(50)));
        containers.set(address(), container("abc123", WEB_ROLE, None));
        let provider = Arc::new(provider(containers, sts.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.credentials_for_ip(address()).await })
            })
            .collect();

        for handle in handles {
            let credentials = handle.await.unwrap().unwrap();
            assert_eq!(credentials.access_key_id(), "AKIA1");
        }
        assert_eq!(sts.calls(), 1);
    }
}
