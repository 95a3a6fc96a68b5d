/// Token-presence predicate plus bearer-token supplier.
///
/// The engine consults the gate once per operation, never caching the
/// answer, so a login or logout mid-session takes effect on the next cart
/// action.
pub trait AuthGate: Send + Sync + 'static {
    fn current_token(&self) -> Option<String>;

    fn is_authenticated(&self) -> bool {
        self.current_token().is_some()
    }
}
