//! Per-request controller: action table, lifecycle hooks and session.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::error::DispatchError;
use crate::request::Request;
use crate::result::ActionResult;
use crate::session::{Session, SessionId};
use crate::Result;

/// An action: receives the controller and the remaining path segments.
pub type ActionHandler =
    Arc<dyn Fn(&mut Controller, &[String]) -> Result<Option<ActionResult>> + Send + Sync>;

/// Before/after hook. An `Err` sends the pipeline down the error path.
pub type LifecycleHook = Arc<dyn Fn(&mut Controller) -> Result<()> + Send + Sync>;

/// Error hook, given the fault that triggered it.
pub type ErrorHook =
    Arc<dyn Fn(&mut Controller, &DispatchError) -> Option<ActionResult> + Send + Sync>;

/// Not-found hook.
pub type NotFoundHook = Arc<dyn Fn(&mut Controller) -> Option<ActionResult> + Send + Sync>;

/// HTTP method an action is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionMethod {
    /// Only this method.
    Exact(Method),
    /// Any method without a more specific registration.
    Any,
}

impl From<Method> for ActionMethod {
    fn from(method: Method) -> Self {
        Self::Exact(method)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ActionKey {
    method: ActionMethod,
    // Stored lowercased; action names match ASCII case-insensitively.
    name: String,
}

impl ActionKey {
    fn new(method: ActionMethod, name: &str) -> Self {
        Self {
            method,
            name: name.to_ascii_lowercase(),
        }
    }
}

/// A controller instance, built fresh for every request by its factory.
///
/// Application controllers compose this record: the factory registers
/// closures for actions and hooks, capturing whatever shared state they
/// need. The pipeline driver in [`Controller::execute`] calls whichever
/// hooks are present.
pub struct Controller {
    actions: HashMap<ActionKey, ActionHandler>,
    before: Option<LifecycleHook>,
    after: Option<LifecycleHook>,
    error: Option<ErrorHook>,
    not_found: Option<NotFoundHook>,
    /// Set by the before hook to let the action run.
    pub continue_pipeline: bool,
    session: Option<Session>,
    ended: Option<SessionId>,
    request: Arc<Request>,
}

impl Controller {
    pub fn new(request: Arc<Request>) -> Self {
        Self {
            actions: HashMap::new(),
            before: None,
            after: None,
            error: None,
            not_found: None,
            continue_pipeline: false,
            session: None,
            ended: None,
            request,
        }
    }

    /// Register an action under a method (or [`ActionMethod::Any`]) and name.
    ///
    /// Registering the same method and name again replaces the handler.
    pub fn register_action<F>(&mut self, method: impl Into<ActionMethod>, name: &str, handler: F)
    where
        F: Fn(&mut Controller, &[String]) -> Result<Option<ActionResult>> + Send + Sync + 'static,
    {
        self.actions
            .insert(ActionKey::new(method.into(), name), Arc::new(handler));
    }

    pub fn on_before<F>(&mut self, hook: F)
    where
        F: Fn(&mut Controller) -> Result<()> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
    }

    pub fn on_after<F>(&mut self, hook: F)
    where
        F: Fn(&mut Controller) -> Result<()> + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
    }

    pub fn on_error<F>(&mut self, hook: F)
    where
        F: Fn(&mut Controller, &DispatchError) -> Option<ActionResult> + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(hook));
    }

    pub fn on_not_found<F>(&mut self, hook: F)
    where
        F: Fn(&mut Controller) -> Option<ActionResult> + Send + Sync + 'static,
    {
        self.not_found = Some(Arc::new(hook));
    }

    /// Find the handler for a method and action name.
    ///
    /// An exact method registration wins over a wildcard one.
    pub fn action(&self, method: &Method, name: &str) -> Option<ActionHandler> {
        let exact = ActionKey::new(ActionMethod::Exact(method.clone()), name);
        let any = ActionKey::new(ActionMethod::Any, name);
        self.actions
            .get(&exact)
            .or_else(|| self.actions.get(&any))
            .cloned()
    }

    pub fn has_action(&self, method: &Method, name: &str) -> bool {
        self.action(method, name).is_some()
    }

    pub(crate) fn before_hook(&self) -> Option<LifecycleHook> {
        self.before.clone()
    }

    pub(crate) fn after_hook(&self) -> Option<LifecycleHook> {
        self.after.clone()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub fn take_session(&mut self) -> Option<Session> {
        self.session.take()
    }

    /// Drop the current session. The manager removes it from the store
    /// once the pipeline finishes.
    pub fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            self.ended = Some(session.id);
        }
    }

    pub fn ended_session(&self) -> Option<&SessionId> {
        self.ended.as_ref()
    }

    /// Result of the not-found path: the hook's result, or the built-in 404.
    pub fn not_found_result(&mut self) -> ActionResult {
        let hook = self.not_found.clone();
        hook.and_then(|hook| hook(self))
            .unwrap_or_else(ActionResult::not_found)
    }

    /// Result of the error path: the hook's result, or the built-in 500.
    pub fn error_result(&mut self, err: &DispatchError) -> ActionResult {
        let hook = self.error.clone();
        hook.and_then(|hook| hook(self, err))
            .unwrap_or_else(ActionResult::internal_error)
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("error", &self.error.is_some())
            .field("not_found", &self.not_found.is_some())
            .field("continue_pipeline", &self.continue_pipeline)
            .field("session", &self.session.as_ref().map(|s| &s.id))
            .field("request", &self.request.path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    const NO_PARAMS: &[String] = &[];

    fn controller() -> Controller {
        Controller::new(Arc::new(Request::get("/test")))
    }

    #[test]
    fn test_action_lookup_is_method_exact() {
        let mut c = controller();
        c.register_action(Method::GET, "Index", |_, _| Ok(None));

        assert!(c.has_action(&Method::GET, "Index"));
        assert!(c.has_action(&Method::GET, "index"));
        assert!(!c.has_action(&Method::POST, "Index"));
        assert!(!c.has_action(&Method::GET, "Other"));
    }

    #[test]
    fn test_wildcard_method() {
        let mut c = controller();
        c.register_action(ActionMethod::Any, "Save", |_, _| Ok(Some(ActionResult::new("any"))));
        c.register_action(Method::POST, "Save", |_, _| Ok(Some(ActionResult::new("post"))));

        let post = c.action(&Method::POST, "Save").unwrap();
        let result = post(&mut c, NO_PARAMS).unwrap().unwrap();
        assert_eq!(result.body_text(), "post");

        let put = c.action(&Method::PUT, "Save").unwrap();
        let result = put(&mut c, NO_PARAMS).unwrap().unwrap();
        assert_eq!(result.body_text(), "any");
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut c = controller();
        c.register_action(Method::GET, "Index", |_, _| Ok(Some(ActionResult::new("old"))));
        c.register_action(Method::GET, "INDEX", |_, _| Ok(Some(ActionResult::new("new"))));

        let handler = c.action(&Method::GET, "index").unwrap();
        assert_eq!(handler(&mut c, NO_PARAMS).unwrap().unwrap().body_text(), "new");
    }

    #[test]
    fn test_default_results_without_hooks() {
        let mut c = controller();
        assert_eq!(c.not_found_result().status_code, StatusCode::NOT_FOUND);
        assert_eq!(
            c.error_result(&DispatchError::handler("x")).status_code,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_empty_hook_falls_back_to_default() {
        let mut c = controller();
        c.on_not_found(|_| None);
        c.on_error(|_, _| None);

        assert_eq!(c.not_found_result().body_text(), "Not Found");
        assert_eq!(
            c.error_result(&DispatchError::handler("x")).status_code,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_hook_sees_fault() {
        let mut c = controller();
        c.on_error(|_, err| Some(ActionResult::text(format!("caught: {}", err))));

        let result = c.error_result(&DispatchError::handler("boom"));
        assert_eq!(result.body_text(), "caught: handler fault: boom");
    }

    #[test]
    fn test_end_session() {
        let mut c = controller();
        let id = SessionId::generate();
        c.set_session(Session::new(id.clone()));

        c.end_session();
        assert!(c.session().is_none());
        assert_eq!(c.ended_session(), Some(&id));
    }
}
