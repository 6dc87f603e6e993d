/// Options that control how introspection behaves.
#[derive(Debug, Clone, Default)]
pub struct IntrospectOptions {
    /// Include views alongside base tables.
    pub include_views: bool,
}
