//! Main entry point for the role catalog.
//!
//! The `Catalog` struct is the single serialization point for role
//! mutations. It owns the published kernel state, the `enable_rbac_checks`
//! system variable, and the audit log.

use std::sync::{Arc, RwLock};

use rolegraph_config::RolegraphConfig;
use rolegraph_kernel::{
    Command, Effect, KernelError, State, apply_committed, apply_committed_batch,
};
use rolegraph_rbac::{AllowReason, AuthorizationGate, Decision, Operation, Principal};
use rolegraph_types::{AuditAction, MZ_SYSTEM_ROLE_ID, RoleId};
use tracing::{debug, info};

use crate::error::{RolegraphError, Result};
use crate::notice::Notice;
use crate::session::Session;
use crate::views::{self, RoleMemberRow, RoleRow};

/// Result of executing a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteResult {
    /// Notices to send to the client, in the order they were raised.
    pub notices: Vec<Notice>,
}

impl ExecuteResult {
    /// Returns the rendered notice messages.
    pub fn notice_messages(&self) -> Vec<String> {
        self.notices.iter().map(ToString::to_string).collect()
    }
}

/// Internal state shared across sessions.
pub(crate) struct CatalogInner {
    /// Published kernel state. Replaced wholesale on every mutation.
    pub(crate) state: Arc<State>,

    /// The `enable_rbac_checks` system variable.
    pub(crate) enable_rbac_checks: bool,

    /// Whether authorization decisions are logged.
    pub(crate) audit_decisions: bool,

    /// Every audit action committed so far.
    pub(crate) audit_log: Vec<AuditAction>,
}

impl CatalogInner {
    fn gate(&self) -> AuthorizationGate {
        let gate = AuthorizationGate::new(self.enable_rbac_checks);
        if self.audit_decisions {
            gate
        } else {
            gate.without_audit()
        }
    }

    /// Executes effects produced by the kernel, returning client notices.
    pub(crate) fn execute_effects(&mut self, effects: Vec<Effect>) -> Vec<Notice> {
        let mut notices = Vec::new();
        for effect in effects {
            match effect {
                Effect::RoleWrite(role) => {
                    debug!(role_id = %role.id, name = %role.name, "role written");
                }
                Effect::RoleDrop(role_id) => {
                    debug!(%role_id, "role dropped");
                }
                Effect::MembershipWrite(edge) => {
                    debug!(
                        role_id = %edge.role_id,
                        member_id = %edge.member_id,
                        grantor_id = %edge.grantor_id,
                        "membership written"
                    );
                }
                Effect::MembershipDrop(edge) => {
                    debug!(
                        role_id = %edge.role_id,
                        member_id = %edge.member_id,
                        "membership dropped"
                    );
                }
                Effect::DatabaseWrite(meta) => {
                    debug!(name = %meta.name, owner_id = %meta.owner_id, "database written");
                }
                Effect::ClusterWrite(meta) => {
                    debug!(
                        name = %meta.name,
                        owner_id = %meta.owner_id,
                        replicas = meta.replicas.len(),
                        "cluster written"
                    );
                }
                Effect::AuditLogAppend(action) => {
                    info!(?action, "audit action");
                    self.audit_log.push(action);
                }
                Effect::Notice(notice) => {
                    let notice = Notice::from(notice);
                    info!(%notice, "notice");
                    notices.push(notice);
                }
            }
        }
        notices
    }
}

/// Per-statement view handed to planners.
///
/// Holds one snapshot of the catalog so every check in a statement sees the
/// same graph.
pub(crate) struct StatementContext<'a> {
    pub(crate) state: &'a State,
    pub(crate) principal: &'a Principal,
    gate: AuthorizationGate,
    notices: Vec<Notice>,
}

impl<'a> StatementContext<'a> {
    fn new(state: &'a State, principal: &'a Principal, gate: AuthorizationGate) -> Self {
        Self {
            state,
            principal,
            gate,
            notices: Vec::new(),
        }
    }

    /// Runs the authorization gate for `operation`.
    pub(crate) fn authorize(&mut self, operation: Operation) -> Result<()> {
        let reason = self.gate.enforce(self.state, self.principal, operation)?;
        if reason == AllowReason::RbacDisabled && !self.notices.contains(&Notice::RbacDisabled) {
            self.notices.push(Notice::RbacDisabled);
        }
        Ok(())
    }

    /// Resolves a role name, failing with "unknown role".
    pub(crate) fn resolve(&self, name: &str) -> Result<RoleId> {
        self.state
            .lookup(name)
            .map(|role| role.id)
            .ok_or_else(|| RolegraphError::UnknownRole(name.to_string()))
    }

    pub(crate) fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// The role catalog.
///
/// Cloning a `Catalog` is cheap and yields another handle to the same
/// catalog.
///
/// # Example
///
/// ```
/// use rolegraph::{Catalog, RoleAttributes};
///
/// let catalog = Catalog::new();
/// let admin = catalog.system_session();
///
/// admin.create_role("joe", RoleAttributes::new())?;
/// admin.create_role("group", RoleAttributes::new())?;
/// admin.grant_role("group", &["joe"])?;
///
/// assert_eq!(catalog.mz_role_members()?.len(), 1);
/// # Ok::<(), rolegraph::RolegraphError>(())
/// ```
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<RwLock<CatalogInner>>,
}

impl Catalog {
    /// Creates a catalog with default configuration and no extra roles.
    pub fn new() -> Self {
        Self::from_inner(CatalogInner {
            state: Arc::new(State::new()),
            enable_rbac_checks: true,
            audit_decisions: true,
            audit_log: Vec::new(),
        })
    }

    /// Opens a catalog from configuration, creating the bootstrap roles.
    pub fn open(config: &RolegraphConfig) -> Result<Self> {
        config.validate()?;

        let commands = config
            .bootstrap
            .roles
            .iter()
            .map(|role| Command::create_role(role.name.as_str(), role.attributes()));
        let (state, effects) = apply_committed_batch(State::new(), commands)?;

        let mut inner = CatalogInner {
            state: Arc::new(state),
            enable_rbac_checks: config.rbac.enable_rbac_checks,
            audit_decisions: config.rbac.audit_decisions,
            audit_log: Vec::new(),
        };
        inner.execute_effects(effects);

        info!(
            roles = config.bootstrap.roles.len(),
            enable_rbac_checks = config.rbac.enable_rbac_checks,
            "catalog opened"
        );

        Ok(Self::from_inner(inner))
    }

    fn from_inner(inner: CatalogInner) -> Self {
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Returns a session acting as the bootstrap superuser.
    pub fn system_session(&self) -> Session {
        Session::new(self.clone(), Principal::superuser(MZ_SYSTEM_ROLE_ID))
    }

    /// Returns a session acting as the named role.
    pub fn session(&self, role_name: &str) -> Result<Session> {
        let state = self.snapshot()?;
        let role = state
            .lookup(role_name)
            .ok_or_else(|| RolegraphError::UnknownRole(role_name.to_string()))?;
        Ok(Session::new(
            self.clone(),
            Principal {
                role_id: role.id,
                is_superuser: role.is_superuser,
            },
        ))
    }

    /// Returns a session for a principal identified elsewhere.
    pub fn session_for(&self, principal: Principal) -> Session {
        Session::new(self.clone(), principal)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Returns a read-consistent snapshot of the catalog.
    pub fn snapshot(&self) -> Result<Arc<State>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RolegraphError::internal("lock poisoned"))?;
        Ok(Arc::clone(&inner.state))
    }

    /// Returns the current value of `enable_rbac_checks`.
    pub fn enable_rbac_checks(&self) -> Result<bool> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RolegraphError::internal("lock poisoned"))?;
        Ok(inner.enable_rbac_checks)
    }

    /// Returns the audit log.
    pub fn audit_log(&self) -> Result<Vec<AuditAction>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RolegraphError::internal("lock poisoned"))?;
        Ok(inner.audit_log.clone())
    }

    /// Returns the `mz_roles` view.
    pub fn mz_roles(&self) -> Result<Vec<RoleRow>> {
        let state = self.snapshot()?;
        Ok(views::mz_roles(&state))
    }

    /// Returns the `mz_role_members` view.
    pub fn mz_role_members(&self) -> Result<Vec<RoleMemberRow>> {
        let state = self.snapshot()?;
        Ok(views::mz_role_members(&state))
    }

    /// Evaluates the gate for `principal` against the current snapshot.
    pub(crate) fn decide(&self, principal: &Principal, operation: Operation) -> Result<Decision> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RolegraphError::internal("lock poisoned"))?;
        Ok(inner.gate().check(&inner.state, principal, operation))
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Runs one statement under the write lock.
    ///
    /// `plan` authorizes and validates against a snapshot, then returns the
    /// command to apply (or `None` for a no-op). The new state is published
    /// only if the kernel accepts the command.
    pub(crate) fn execute<F>(&self, principal: &Principal, plan: F) -> Result<ExecuteResult>
    where
        F: FnOnce(&mut StatementContext<'_>) -> Result<Option<Command>>,
    {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| RolegraphError::internal("lock poisoned"))?;

        let snapshot = Arc::clone(&inner.state);

        // A session can outlive its role.
        if !snapshot.role_exists(&principal.role_id) {
            return Err(RolegraphError::UnknownRole(principal.role_id.to_string()));
        }

        let mut ctx = StatementContext::new(&snapshot, principal, inner.gate());
        let command = plan(&mut ctx)?;
        let mut notices = ctx.notices;

        if let Some(command) = command {
            // Apply command to kernel (pure)
            let (new_state, effects) = apply_committed(State::clone(&snapshot), command)
                .map_err(|e| match e {
                    KernelError::RoleNotFound(id) => RolegraphError::UnknownRole(id.to_string()),
                    e => e.into(),
                })?;

            // Publish
            inner.state = Arc::new(new_state);

            notices.extend(inner.execute_effects(effects));
        }

        Ok(ExecuteResult { notices })
    }

    /// Sets `enable_rbac_checks`. Superuser only.
    pub(crate) fn set_enable_rbac_checks(&self, principal: &Principal, value: bool) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| RolegraphError::internal("lock poisoned"))?;

        let is_superuser = principal.is_superuser
            || inner
                .state
                .get_role(&principal.role_id)
                .is_some_and(|role| role.is_superuser);
        if !is_superuser {
            return Err(RolegraphError::SuperuserRequired {
                action: "alter system",
            });
        }

        info!(
            principal = %principal.role_id,
            enable_rbac_checks = value,
            "system variable updated"
        );
        inner.enable_rbac_checks = value;
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
