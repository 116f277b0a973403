/// Supplies optional base64-encoded cookie material.
///
/// Read once per invocation of a cookie-capable backend, so a rotated secret
/// is picked up without restarting.
pub trait CookieSource: Send + Sync {
    /// Raw base64 text, or `None` when nothing is configured.
    fn load(&self) -> Option<String>;

    /// Short description for logs (never the material itself).
    fn describe(&self) -> String;
}

/// Reads the material from an environment variable.
pub struct EnvCookieSource {
    var: String,
}

impl EnvCookieSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CookieSource for EnvCookieSource {
    fn load(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }

    fn describe(&self) -> String {
        format!("env:{}", self.var)
    }
}

/// Fixed material, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticCookieSource {
    material: Option<String>,
}

impl StaticCookieSource {
    pub fn new(material: Option<String>) -> Self {
        Self { material }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

impl CookieSource for StaticCookieSource {
    fn load(&self) -> Option<String> {
        self.material.clone()
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}
