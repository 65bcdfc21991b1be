//! Route manager: controller resolution, sessions and static fallback.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, error, warn};

use super::path::{is_reserved, split_action, split_segments};
use super::static_files::{application_path, StaticFiles};
use crate::controller::Controller;
use crate::error::DispatchError;
use crate::request::Request;
use crate::result::{ActionResult, Cookie, ResponseSink};
use crate::session::{Session, SessionId, SessionStore, DEFAULT_SESSION_TIMEOUT};
use crate::Result;

/// Builds a controller for one request.
pub type ControllerFactory = Arc<dyn Fn(Arc<Request>) -> Controller + Send + Sync>;

/// Manager-level error or not-found handler, used when no controller
/// instance is available to run its own hooks.
pub type FallbackHandler =
    Arc<dyn Fn(&Request, &DispatchError) -> Option<ActionResult> + Send + Sync>;

/// Name of the session cookie unless configured otherwise.
pub const DEFAULT_SESSION_COOKIE: &str = "MVCSESSIONID";

/// Settings fixed when the route manager is built.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Root directory for static files.
    pub app_root: PathBuf,
    /// Controller used when the first segment names no controller.
    pub default_controller: Option<String>,
    /// Cookie carrying the session ID.
    pub session_cookie: String,
    /// Idle time before a session expires.
    pub session_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            app_root: application_path(),
            default_controller: None,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            session_timeout: DEFAULT_SESSION_TIMEOUT,
        }
    }
}

#[derive(Default, Clone)]
struct RouteTable {
    controllers: HashMap<String, ControllerFactory>,
    default_controller: Option<String>,
    error_handler: Option<FallbackHandler>,
    not_found_handler: Option<FallbackHandler>,
}

impl RouteTable {
    fn default_factory(&self) -> Option<&ControllerFactory> {
        self.default_controller
            .as_ref()
            .and_then(|name| self.controllers.get(name))
    }
}

/// A controller picked for a request, with the segments left for the action.
struct Resolved {
    controller: Controller,
    action_segments: Vec<String>,
    via_default: bool,
}

/// Resolves requests to controller actions and runs them.
///
/// Safe to share across request tasks. The route table sits behind a
/// read-write lock that is only held long enough to copy out what a
/// request needs.
pub struct RouteManager {
    table: RwLock<RouteTable>,
    session_cookie: String,
    sessions: Arc<SessionStore>,
    static_files: StaticFiles,
}

impl RouteManager {
    pub fn new(config: DispatchConfig) -> Self {
        let table = RouteTable {
            default_controller: config.default_controller,
            ..RouteTable::default()
        };

        Self {
            table: RwLock::new(table),
            session_cookie: config.session_cookie,
            sessions: Arc::new(SessionStore::with_timeout(config.session_timeout)),
            static_files: StaticFiles::new(config.app_root),
        }
    }

    /// Register a controller factory under `name`. The last registration wins.
    pub fn register_controller<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(Arc<Request>) -> Controller + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(controller = %name, "Registering controller");
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .controllers
            .insert(name, Arc::new(factory));
    }

    pub fn set_default_controller(&self, name: impl Into<String>) {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .default_controller = Some(name.into());
    }

    pub fn default_controller(&self) -> Option<String> {
        self.snapshot().default_controller
    }

    /// Handler for routing refusals when no default controller exists.
    pub fn set_error_handler<F>(&self, handler: F)
    where
        F: Fn(&Request, &DispatchError) -> Option<ActionResult> + Send + Sync + 'static,
    {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .error_handler = Some(Arc::new(handler));
    }

    /// Handler for unresolved paths when no default controller exists.
    pub fn set_not_found_handler<F>(&self, handler: F)
    where
        F: Fn(&Request, &DispatchError) -> Option<ActionResult> + Send + Sync + 'static,
    {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .not_found_handler = Some(Arc::new(handler));
    }

    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn static_files(&self) -> &StaticFiles {
        &self.static_files
    }

    fn snapshot(&self) -> RouteTable {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Dispatch one request and write exactly one result to `sink`.
    ///
    /// Routing refusals, missing actions and handler faults all become
    /// responses. Only integration errors and sink write failures are
    /// returned.
    pub async fn handle_request(
        &self,
        sink: &mut dyn ResponseSink,
        request: Request,
    ) -> Result<()> {
        let result = self.dispatch(Arc::new(request)).await?;

        result.execute(sink).map_err(|e| {
            error!("Failed to write action result: {}", e);
            e
        })
    }

    /// Resolve and run a request, producing its action result.
    pub async fn dispatch(&self, request: Arc<Request>) -> Result<ActionResult> {
        let table = self.snapshot();
        let segments = split_segments(request.path());

        if let Some(first) = segments.first().filter(|s| is_reserved(s)) {
            let err = DispatchError::ReservedPath(first.clone());
            warn!(path = request.path(), "Refusing reserved path");
            return Ok(self.error_path(&table, &request, &err));
        }

        let Some(resolved) = self.resolve(&table, &request, segments) else {
            if let Some(result) = self.serve_static(&request).await {
                return Ok(result);
            }
            let err = DispatchError::NoController(request.path().to_string());
            debug!(path = request.path(), "No controller or file for path");
            return Ok(self.not_found_path(&table, &request, &err));
        };

        let Resolved {
            mut controller,
            action_segments,
            via_default,
        } = resolved;
        let (action, params) = split_action(&action_segments);

        // Falling back to the default controller is only a match if it
        // actually has the action; otherwise a file at the path wins.
        if via_default && !controller.has_action(request.method(), action) {
            if let Some(result) = self.serve_static(&request).await {
                return Ok(result);
            }
        }

        let sessions = self.set_controller_sessions(Some(&mut controller), Some(request.as_ref()));
        let new_cookie = match sessions {
            Ok(cookie) => cookie,
            Err(e @ (DispatchError::MissingController | DispatchError::MissingRequest)) => {
                return Err(e)
            }
            Err(e) => {
                error!("Session resolution failed: {}", e);
                return Ok(controller.error_result(&e));
            }
        };

        debug!(
            path = request.path(),
            action,
            params = params.len(),
            via_default,
            "Running controller pipeline"
        );
        let outcome = controller.execute(action, params);

        if let Some(mut session) = controller.take_session() {
            self.merge_session(&mut session);
        }
        if let Some(ended) = controller.ended_session() {
            if let Err(e) = self.sessions.remove(ended) {
                error!("Failed to drop session: {}", e);
            }
        }

        let mut result = outcome.result;
        if let Some(cookie) = new_cookie {
            result.add_cookie(cookie);
        }
        Ok(result)
    }

    /// Replay the request's session edits onto the stored record.
    ///
    /// Only keys the request touched change, and a session removed while
    /// the request ran stays removed.
    fn merge_session(&self, session: &mut Session) {
        let changes = session.take_changes();
        let merged = self.sessions.update(&session.id, |stored| {
            stored.replay(changes);
            stored.touch();
        });

        match merged {
            Ok(true) => {}
            Ok(false) => debug!(
                session = %session.id,
                "Session ended during request, dropping edits"
            ),
            Err(e) => error!("Failed to store session: {}", e),
        }
    }

    fn resolve(
        &self,
        table: &RouteTable,
        request: &Arc<Request>,
        segments: Vec<String>,
    ) -> Option<Resolved> {
        if let Some(factory) = segments.first().and_then(|name| table.controllers.get(name)) {
            return Some(Resolved {
                controller: factory(Arc::clone(request)),
                action_segments: segments[1..].to_vec(),
                via_default: false,
            });
        }

        // The default controller sees every segment, so `/x` means its action `x`.
        table.default_factory().map(|factory| Resolved {
            controller: factory(Arc::clone(request)),
            action_segments: segments,
            via_default: true,
        })
    }

    /// Attach the request's session to `controller`, creating one if the
    /// cookie is missing or names no live session.
    ///
    /// Returns the cookie to send when a new session was created. Both
    /// arguments are required; `None` is an integration error.
    pub fn set_controller_sessions(
        &self,
        controller: Option<&mut Controller>,
        request: Option<&Request>,
    ) -> Result<Option<Cookie>> {
        let controller = controller.ok_or(DispatchError::MissingController)?;
        let request = request.ok_or(DispatchError::MissingRequest)?;

        let presented = request
            .cookie(&self.session_cookie)
            .and_then(|raw| raw.parse::<SessionId>().ok());

        if let Some(id) = presented {
            if self.sessions.touch(&id)? {
                if let Some(session) = self.sessions.get(&id)? {
                    controller.set_session(session);
                    return Ok(None);
                }
            }
            debug!(session = %id, "Unknown session cookie, issuing a new session");
        }

        let session = loop {
            match self.sessions.create(SessionId::generate()) {
                Ok(session) => break session,
                Err(DispatchError::SessionExists(_)) => continue,
                Err(e) => return Err(e),
            }
        };

        let cookie = Cookie::new(&self.session_cookie, session.id.as_str())
            .path("/")
            .http_only();
        controller.set_session(session);
        Ok(Some(cookie))
    }

    /// Serve the file behind the request path, writing it to `sink`.
    ///
    /// Returns `false` when nothing was served.
    pub async fn serve_file(&self, sink: &mut dyn ResponseSink, request: &Request) -> bool {
        match self.serve_static(request).await {
            Some(result) => match result.execute(sink) {
                Ok(()) => true,
                Err(e) => {
                    error!("Failed to write static file: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    async fn serve_static(&self, request: &Request) -> Option<ActionResult> {
        match self.static_files.load(request.path()).await {
            Ok(result) => result,
            Err(e) => {
                warn!(path = request.path(), "Static file read failed: {}", e);
                None
            }
        }
    }

    fn error_path(
        &self,
        table: &RouteTable,
        request: &Arc<Request>,
        err: &DispatchError,
    ) -> ActionResult {
        if let Some(factory) = table.default_factory() {
            return factory(Arc::clone(request)).error_result(err);
        }
        table
            .error_handler
            .as_ref()
            .and_then(|handler| handler(request, err))
            .unwrap_or_else(ActionResult::internal_error)
    }

    fn not_found_path(
        &self,
        table: &RouteTable,
        request: &Arc<Request>,
        err: &DispatchError,
    ) -> ActionResult {
        if let Some(factory) = table.default_factory() {
            return factory(Arc::clone(request)).not_found_result();
        }
        table
            .not_found_handler
            .as_ref()
            .and_then(|handler| handler(request, err))
            .unwrap_or_else(ActionResult::not_found)
    }
}

impl Default for RouteManager {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};

    fn manager() -> RouteManager {
        RouteManager::new(DispatchConfig {
            app_root: PathBuf::from("does-not-exist"),
            ..DispatchConfig::default()
        })
    }

    fn echo_controller(request: Arc<Request>) -> Controller {
        let mut c = Controller::new(request);
        c.register_action(Method::GET, "Index", |_, params| {
            Ok(Some(ActionResult::new(format!("index:{}", params.join(",")))))
        });
        c.register_action(Method::GET, "Show", |_, params| {
            Ok(Some(ActionResult::new(format!("show:{}", params.join(",")))))
        });
        c
    }

    #[tokio::test]
    async fn test_resolves_controller_action_params() {
        let mgr = manager();
        mgr.register_controller("home", echo_controller);

        let result = mgr.dispatch(Arc::new(Request::get("/home/Show/1/2"))).await.unwrap();
        assert_eq!(result.body_text(), "show:1,2");

        let result = mgr.dispatch(Arc::new(Request::get("/home"))).await.unwrap();
        assert_eq!(result.body_text(), "index:");
    }

    #[tokio::test]
    async fn test_controller_name_is_case_sensitive() {
        let mgr = manager();
        mgr.register_controller("home", echo_controller);

        let result = mgr.dispatch(Arc::new(Request::get("/Home"))).await.unwrap();
        assert_eq!(result.status_code, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_default_reinterprets_first_segment() {
        let mgr = manager();
        mgr.register_controller("home", echo_controller);
        mgr.set_default_controller("home");

        let result = mgr.dispatch(Arc::new(Request::get("/Show/9"))).await.unwrap();
        assert_eq!(result.body_text(), "show:9");

        let result = mgr.dispatch(Arc::new(Request::get("/"))).await.unwrap();
        assert_eq!(result.body_text(), "index:");
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let mgr = manager();
        mgr.register_controller("home", echo_controller);
        mgr.register_controller("home", |request| {
            let mut c = Controller::new(request);
            c.register_action(Method::GET, "Index", |_, _| Ok(Some(ActionResult::new("second"))));
            c
        });

        let result = mgr.dispatch(Arc::new(Request::get("/home"))).await.unwrap();
        assert_eq!(result.body_text(), "second");
    }

    #[tokio::test]
    async fn test_reserved_uses_manager_error_handler() {
        let mgr = manager();
        mgr.register_controller("views", echo_controller);
        mgr.set_error_handler(|_, err| Some(ActionResult::new(err.to_string())));

        let result = mgr.dispatch(Arc::new(Request::get("/views/Index"))).await.unwrap();
        assert_eq!(result.body_text(), "refused: reserved path 'views'");
    }

    #[tokio::test]
    async fn test_unresolved_uses_manager_not_found_handler() {
        let mgr = manager();
        mgr.set_not_found_handler(|_, _| Some(ActionResult::new("custom 404")));

        let result = mgr.dispatch(Arc::new(Request::get("/nowhere"))).await.unwrap();
        assert_eq!(result.body_text(), "custom 404");
    }

    #[test]
    fn test_set_controller_sessions_requires_both() {
        let mgr = manager();
        let request = Request::get("/");
        let mut controller = Controller::new(Arc::new(request.clone()));

        assert!(matches!(
            mgr.set_controller_sessions(None, Some(&request)),
            Err(DispatchError::MissingController)
        ));
        assert!(matches!(
            mgr.set_controller_sessions(Some(&mut controller), None),
            Err(DispatchError::MissingRequest)
        ));
    }

    #[test]
    fn test_set_controller_sessions_reuses_live_session() {
        let mgr = manager();
        let first = Request::get("/");
        let mut controller = Controller::new(Arc::new(first.clone()));

        let cookie = mgr
            .set_controller_sessions(Some(&mut controller), Some(&first))
            .unwrap()
            .unwrap();
        assert_eq!(cookie.name, DEFAULT_SESSION_COOKIE);
        assert_eq!(mgr.sessions().count(), 1);

        let second = Request::get("/").with_cookie(&cookie.name, &cookie.value);
        let mut controller = Controller::new(Arc::new(second.clone()));
        let issued = mgr
            .set_controller_sessions(Some(&mut controller), Some(&second))
            .unwrap();
        assert!(issued.is_none());
        assert_eq!(controller.session().unwrap().id.as_str(), cookie.value);
        assert_eq!(mgr.sessions().count(), 1);
    }

    #[test]
    fn test_unknown_cookie_gets_new_session() {
        let mgr = manager();
        let request = Request::get("/")
            .with_cookie(DEFAULT_SESSION_COOKIE, "EIMA5VQOU4980S35AYPAEKYABL73GZBA");
        let mut controller = Controller::new(Arc::new(request.clone()));

        let cookie = mgr
            .set_controller_sessions(Some(&mut controller), Some(&request))
            .unwrap()
            .unwrap();
        assert_ne!(cookie.value, "EIMA5VQOU4980S35AYPAEKYABL73GZBA");
        assert_eq!(
            cookie.to_header_value(),
            format!("{}={}; Path=/; HttpOnly", DEFAULT_SESSION_COOKIE, cookie.value)
        );
    }
}
