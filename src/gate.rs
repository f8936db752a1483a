//! Request gating.
//!
//! Every request is classified by path, then (for public and protected
//! routes) its access credential is verified. A missing or unusable access
//! credential on a protected route is exchanged for a fresh pair through the
//! refresh orchestrator before anything is denied. Nothing is kept between
//! requests.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, info, warn};

use crate::auth::{
    ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, append_credential_cookies, get_cookie,
    replace_request_cookie,
};
use crate::auth_service::AuthService;
use crate::config::{GateConfig, LandingPaths};
use crate::jwt::{Claims, JwtConfig, Role};
use crate::refresh::{RefreshError, RefreshOrchestrator, RefreshedCredentials};
use crate::routes::{RouteClass, RouteTable};

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RedirectTo(String),
    /// Allow, and attach the refreshed credentials to the response.
    AllowWithRefreshedCredentials(RefreshedCredentials),
    /// Redirect, and attach the refreshed credentials to the redirect response.
    RedirectWithRefreshedCredentials {
        to: String,
        credentials: RefreshedCredentials,
    },
}

/// A decision plus the claims it was based on, if a credential verified.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub decision: GateDecision,
    pub claims: Option<Claims>,
}

impl GateOutcome {
    fn anonymous(decision: GateDecision) -> Self {
        Self {
            decision,
            claims: None,
        }
    }
}

pub struct GateController {
    jwt: JwtConfig,
    routes: RouteTable,
    refresher: RefreshOrchestrator,
    paths: LandingPaths,
    secure_cookies: bool,
}

impl GateController {
    pub fn new(config: &GateConfig, service: Arc<dyn AuthService>) -> Self {
        Self {
            jwt: JwtConfig::new(&config.secret),
            routes: RouteTable::default(),
            refresher: RefreshOrchestrator::new(service),
            paths: config.paths.clone(),
            secure_cookies: config.secure_cookies,
        }
    }

    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = routes;
        self
    }

    pub fn refresher(&self) -> &RefreshOrchestrator {
        &self.refresher
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    /// Decide what to do with a request for `path` carrying the given credentials.
    pub async fn decide(
        &self,
        path: &str,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> GateDecision {
        self.evaluate(path, access_token, refresh_token)
            .await
            .decision
    }

    pub async fn evaluate(
        &self,
        path: &str,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> GateOutcome {
        let class = self.routes.classify(path);
        debug!(path, ?class, "Request classified");

        if class.is_protected() {
            return self
                .gate_protected(class, access_token, refresh_token)
                .await;
        }

        match class {
            RouteClass::Public => self.gate_public(access_token),
            _ => GateOutcome::anonymous(GateDecision::Allow),
        }
    }

    /// Signed-in visitors are bounced from public pages to their landing page.
    /// A credential that fails verification is ignored.
    fn gate_public(&self, access_token: Option<&str>) -> GateOutcome {
        let Some(token) = access_token else {
            return GateOutcome::anonymous(GateDecision::Allow);
        };

        match self.jwt.verify(token) {
            Ok(claims) => {
                let target = self.paths.landing_for(claims.role).to_string();
                debug!(role = %claims.role, landing = %target, "Authenticated visitor on public route");
                GateOutcome {
                    decision: GateDecision::RedirectTo(target),
                    claims: Some(claims),
                }
            }
            Err(e) => {
                debug!(error = %e, "Ignoring unusable credential on public route");
                GateOutcome::anonymous(GateDecision::Allow)
            }
        }
    }

    async fn gate_protected(
        &self,
        class: RouteClass,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> GateOutcome {
        if let Some(token) = access_token {
            match self.jwt.verify(token) {
                Ok(claims) => return self.authorize(class, claims, None),
                Err(e) => debug!(error = %e, "Access credential rejected"),
            }
        }

        // Absent and unusable access credentials take the same path.
        self.refresh_and_authorize(class, refresh_token).await
    }

    async fn refresh_and_authorize(
        &self,
        class: RouteClass,
        refresh_token: Option<&str>,
    ) -> GateOutcome {
        let credentials = match self.refresher.refresh(refresh_token).await {
            Ok(credentials) => credentials,
            Err(RefreshError::NoRefreshCredential) => {
                debug!("No usable credentials, redirecting to login");
                return self.to_login();
            }
            Err(e) => {
                info!(error = %e, "Refresh failed, redirecting to login");
                return self.to_login();
            }
        };

        match self.jwt.verify(&credentials.access_token) {
            Ok(claims) => self.authorize(class, claims, Some(credentials)),
            Err(e) => {
                warn!(error = %e, "Refreshed access credential failed verification");
                self.to_login()
            }
        }
    }

    /// Role check against verified claims.
    fn authorize(
        &self,
        class: RouteClass,
        claims: Claims,
        refreshed: Option<RefreshedCredentials>,
    ) -> GateOutcome {
        let denied = class == RouteClass::AdminProtected && claims.role != Role::Admin;

        let decision = match (denied, refreshed) {
            (false, None) => GateDecision::Allow,
            (false, Some(credentials)) => GateDecision::AllowWithRefreshedCredentials(credentials),
            (true, None) => GateDecision::RedirectTo(self.paths.user.clone()),
            (true, Some(credentials)) => GateDecision::RedirectWithRefreshedCredentials {
                to: self.paths.user.clone(),
                credentials,
            },
        };
        if denied {
            debug!(subject = %claims.subject, "Non-admin on admin route");
        }

        GateOutcome {
            decision,
            claims: Some(claims),
        }
    }

    fn to_login(&self) -> GateOutcome {
        GateOutcome::anonymous(GateDecision::RedirectTo(self.paths.login.clone()))
    }
}

/// Middleware that applies the gate's decision to each request.
///
/// On an allowed request the verified `Claims` are available to handlers as
/// an extension. Refreshed credentials are written back as cookies on the
/// response.
pub async fn gate_request(
    State(gate): State<Arc<GateController>>,
    mut request: Request,
    next: Next,
) -> Response {
    let access_token = get_cookie(request.headers(), ACCESS_COOKIE_NAME).map(str::to_owned);
    let refresh_token = get_cookie(request.headers(), REFRESH_COOKIE_NAME).map(str::to_owned);
    let path = request.uri().path().to_owned();

    let outcome = gate
        .evaluate(&path, access_token.as_deref(), refresh_token.as_deref())
        .await;

    if let Some(claims) = outcome.claims {
        request.extensions_mut().insert(claims);
    }

    match outcome.decision {
        GateDecision::Allow => next.run(request).await,
        GateDecision::RedirectTo(to) => Redirect::temporary(&to).into_response(),
        GateDecision::AllowWithRefreshedCredentials(credentials) => {
            let headers = request.headers_mut();
            replace_request_cookie(headers, ACCESS_COOKIE_NAME, &credentials.access_token);
            if let Some(refresh_token) = &credentials.refresh_token {
                replace_request_cookie(headers, REFRESH_COOKIE_NAME, refresh_token);
            }

            let mut response = next.run(request).await;
            attach(&mut response, &credentials, gate.secure_cookies());
            response
        }
        GateDecision::RedirectWithRefreshedCredentials { to, credentials } => {
            let mut response = Redirect::temporary(&to).into_response();
            attach(&mut response, &credentials, gate.secure_cookies());
            response
        }
    }
}

fn attach(response: &mut Response, credentials: &RefreshedCredentials, secure: bool) {
    append_credential_cookies(
        response.headers_mut(),
        &credentials.access_token,
        credentials.refresh_token.as_deref(),
        secure,
    );
}
