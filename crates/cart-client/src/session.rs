use std::sync::RwLock;

use cart_types::ports::auth_gate::AuthGate;

/// In-memory bearer token holder: set on login, cleared on logout. Stands in
/// for the browser session the token used to live in.
#[derive(Default)]
pub struct BearerSession {
    token: RwLock<Option<String>>,
}

impl BearerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().expect("token lock poisoned") = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }
}

impl AuthGate for BearerSession {
    fn current_token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }
}
