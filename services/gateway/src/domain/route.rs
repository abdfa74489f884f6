//! Gateway route table: which upstream serves a path and what the caller must present.

use axum::routing::MethodFilter;

use comply_auth_types::authorize::Requirement;
use comply_domain::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Auth,
    Tenant,
    Registration,
    Document,
    Commission,
}

impl Upstream {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Tenant => "tenant",
            Self::Registration => "registration",
            Self::Document => "document",
            Self::Commission => "commission",
        }
    }
}

/// Base URLs of the downstream services.
#[derive(Debug, Clone)]
pub struct Upstreams {
    pub auth: String,
    pub tenant: String,
    pub registration: String,
    pub document: String,
    pub commission: String,
}

impl Upstreams {
    pub fn base_url(&self, upstream: Upstream) -> &str {
        match upstream {
            Upstream::Auth => &self.auth,
            Upstream::Tenant => &self.tenant,
            Upstream::Registration => &self.registration,
            Upstream::Document => &self.document,
            Upstream::Commission => &self.commission,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No bearer token; the tenant must still resolve.
    Public,
    /// Valid access token required.
    Authenticated,
}

/// Admission rules for one route. Every requirement must be met.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    pub access: Access,
    pub requirements: Vec<Requirement>,
}

impl RoutePolicy {
    pub fn public() -> Self {
        Self {
            access: Access::Public,
            requirements: Vec::new(),
        }
    }

    pub fn authenticated() -> Self {
        Self {
            access: Access::Authenticated,
            requirements: Vec::new(),
        }
    }

    pub fn require(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }
}

/// Path sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The inbound path, unchanged.
    SamePath,
    /// A template whose `{name}` segments are filled from the matched path parameters.
    Rewrite(&'static str),
}

#[derive(Debug, Clone)]
pub struct ProxyRoute {
    pub upstream: Upstream,
    pub target: Target,
    pub policy: RoutePolicy,
}

/// One row of the route table.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub methods: MethodFilter,
    pub path: &'static str,
    pub route: ProxyRoute,
}

pub const ANY_METHOD: MethodFilter = MethodFilter::GET
    .or(MethodFilter::POST)
    .or(MethodFilter::PUT)
    .or(MethodFilter::PATCH)
    .or(MethodFilter::DELETE);

/// Path of the live analytics websocket, served by the local hub.
pub const ANALYTICS_WS_PATH: &str = "/api/v1/analytics/ws";
pub const ANALYTICS_STATS_PATH: &str = "/api/v1/analytics/stats";
pub const ANALYTICS_EVENTS_PATH: &str = "/api/v1/analytics/events";

fn admin_roles() -> Requirement {
    Requirement::AnyRole(vec![
        Role::SystemAdmin,
        Role::GlobalAdmin,
        Role::TenantAdmin,
        Role::TenantManager,
    ])
}

fn platform_roles() -> Requirement {
    Requirement::AnyRole(vec![Role::SystemAdmin, Role::GlobalAdmin])
}

fn entry(
    methods: MethodFilter,
    path: &'static str,
    upstream: Upstream,
    target: Target,
    policy: RoutePolicy,
) -> RouteEntry {
    RouteEntry {
        methods,
        path,
        route: ProxyRoute {
            upstream,
            target,
            policy,
        },
    }
}

/// A collection root plus everything below it.
fn subtree(
    table: &mut Vec<RouteEntry>,
    root: &'static str,
    nested: &'static str,
    upstream: Upstream,
    policy: RoutePolicy,
) {
    table.push(entry(ANY_METHOD, root, upstream, Target::SamePath, policy.clone()));
    table.push(entry(ANY_METHOD, nested, upstream, Target::SamePath, policy));
}

pub fn route_table() -> Vec<RouteEntry> {
    let mut table = Vec::new();

    for path in [
        "/api/v1/auth/register",
        "/api/v1/auth/login",
        "/api/v1/auth/refresh",
        "/api/v1/auth/verify-email",
        "/api/v1/auth/logout",
        "/api/v1/auth/mfa/login",
    ] {
        table.push(entry(
            MethodFilter::POST,
            path,
            Upstream::Auth,
            Target::SamePath,
            RoutePolicy::public(),
        ));
    }
    table.push(entry(
        MethodFilter::GET,
        "/api/v1/auth/me",
        Upstream::Auth,
        Target::SamePath,
        RoutePolicy::authenticated(),
    ));
    for path in ["/api/v1/auth/mfa/setup", "/api/v1/auth/mfa/verify"] {
        table.push(entry(
            MethodFilter::POST,
            path,
            Upstream::Auth,
            Target::SamePath,
            RoutePolicy::authenticated(),
        ));
    }

    subtree(
        &mut table,
        "/api/v1/tenants",
        "/api/v1/tenants/{*rest}",
        Upstream::Tenant,
        RoutePolicy::authenticated().require(platform_roles()),
    );
    subtree(
        &mut table,
        "/api/v1/registrations",
        "/api/v1/registrations/{*rest}",
        Upstream::Registration,
        RoutePolicy::authenticated(),
    );
    subtree(
        &mut table,
        "/api/v1/documents",
        "/api/v1/documents/{*rest}",
        Upstream::Document,
        RoutePolicy::authenticated(),
    );
    subtree(
        &mut table,
        "/api/v1/commissions",
        "/api/v1/commissions/{*rest}",
        Upstream::Commission,
        RoutePolicy::authenticated(),
    );

    table.push(entry(
        ANY_METHOD,
        "/api/v1/admin/users",
        Upstream::Auth,
        Target::Rewrite("/api/v1/users"),
        RoutePolicy::authenticated().require(admin_roles()),
    ));
    table.push(entry(
        ANY_METHOD,
        "/api/v1/admin/users/{*rest}",
        Upstream::Auth,
        Target::Rewrite("/api/v1/users/{rest}"),
        RoutePolicy::authenticated().require(admin_roles()),
    ));
    for (path, target) in [
        (
            "/api/v1/admin/features/{code}/enable",
            "/api/v1/features/{code}/enable",
        ),
        (
            "/api/v1/admin/features/{code}/disable",
            "/api/v1/features/{code}/disable",
        ),
    ] {
        table.push(entry(
            MethodFilter::POST,
            path,
            Upstream::Auth,
            Target::Rewrite(target),
            RoutePolicy::authenticated()
                .require(admin_roles())
                .require(Requirement::Level(2)),
        ));
    }

    table
}
