use crate::app::AppContext;
use axum::Router;

/// Trait for composable route modules.
///
/// Each domain registers its own routes and is merged into the main
/// application router. Handlers access shared services through
/// `State<AppContext>`; state is applied once when the app is assembled.
pub trait RouteModule {
    /// Returns a router with all routes for this module.
    fn routes(&self) -> Router<AppContext>
    where
        Self: Sized;

    /// Optional path prefix for all routes in this module.
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Registers this module's routes into the application router.
    fn register(self, router: Router<AppContext>) -> Router<AppContext>
    where
        Self: Sized,
    {
        let routes = self.routes();

        if let Some(prefix) = self.prefix() {
            router.nest(prefix, routes)
        } else {
            router.merge(routes)
        }
    }
}
