use std::fmt;

use shared::domain::OrderId;

/// Pages of the mini app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Welcome,
    Create,
    Orders,
    OrderDetails(OrderId),
    Profile,
}

impl Route {
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
        match segments.as_slice() {
            [] => Some(Route::Welcome),
            ["create"] => Some(Route::Create),
            ["orders"] => Some(Route::Orders),
            ["orders", id] => id.parse().ok().map(|id| Route::OrderDetails(OrderId(id))),
            ["profile"] => Some(Route::Profile),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Welcome => "/".to_string(),
            Route::Create => "/create".to_string(),
            Route::Orders => "/orders".to_string(),
            Route::OrderDetails(id) => format!("/orders/{id}"),
            Route::Profile => "/profile".to_string(),
        }
    }

    /// Where the header's back button leads.
    pub fn back(&self) -> Route {
        match self {
            Route::OrderDetails(_) => Route::Orders,
            _ => Route::Welcome,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
