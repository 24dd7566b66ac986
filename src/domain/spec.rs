//! Service specification model.
//!
//! A [`ServiceSpec`] is the contract between endpoint analysis and project
//! generation. It is built once by the analyzer, validated once, then treated
//! as immutable input to rendering.
//!
//! On the wire the model uses camelCase keys and upper-case HTTP methods:
//!
//! ```
//! use restgate::{HttpMethod, SecurityMode, ServiceSpec};
//!
//! let spec = ServiceSpec::from_yaml_str(r#"
//! projectName: petstore
//! packageName: com.example.petstore
//! security: tokenBearer
//! credentials:
//!   tokenSecret: s3cret
//! routes:
//!   - method: GET
//!     path: /pets
//! "#).unwrap();
//!
//! assert_eq!(spec.routes[0].method, HttpMethod::Get);
//! assert_eq!(spec.security, SecurityMode::TokenBearer);
//! assert!(spec.rate_limit_policy.enabled);
//! ```

use crate::domain::policy::RateLimitPolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// HTTP method of a generated route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One route of the generated service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    pub method: HttpMethod,
    pub path: String,
    /// Schema-like description of the request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_shape: Option<Value>,
    /// Schema-like description of the response body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_shape: Option<Value>,
}

impl RouteSpec {
    /// Create a route without request or response shapes.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            request_shape: None,
            response_shape: None,
        }
    }

    pub fn with_request_shape(mut self, shape: Value) -> Self {
        self.request_shape = Some(shape);
        self
    }

    pub fn with_response_shape(mut self, shape: Value) -> Self {
        self.response_shape = Some(shape);
        self
    }
}

/// Security wiring the generator must emit.
///
/// Has no influence on admission control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecurityMode {
    #[default]
    None,
    Basic,
    TokenBearer,
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityMode::None => write!(f, "none"),
            SecurityMode::Basic => write!(f, "basic"),
            SecurityMode::TokenBearer => write!(f, "token-bearer"),
        }
    }
}

/// Credential configuration backing the security mode.
///
/// `Basic` needs `username` and `password`; `TokenBearer` needs `token_secret`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,
}

impl CredentialConfig {
    /// Check whether the credentials needed by `mode` are present and non-blank.
    pub fn satisfies(&self, mode: SecurityMode) -> bool {
        fn present(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.trim().is_empty())
        }

        match mode {
            SecurityMode::None => true,
            SecurityMode::Basic => present(&self.username) && present(&self.password),
            SecurityMode::TokenBearer => present(&self.token_secret),
        }
    }
}

/// Observability features the generated service should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObservabilityFlags {
    pub metrics: bool,
    pub tracing: bool,
    pub request_logging: bool,
}

impl Default for ObservabilityFlags {
    fn default() -> Self {
        Self {
            metrics: true,
            tracing: false,
            request_logging: true,
        }
    }
}

/// Error returned when a serialized spec cannot be parsed.
#[derive(Debug)]
pub enum SpecParseError {
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
}

impl fmt::Display for SpecParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecParseError::Json(e) => write!(f, "invalid JSON service spec: {}", e),
            SpecParseError::Yaml(e) => write!(f, "invalid YAML service spec: {}", e),
        }
    }
}

impl std::error::Error for SpecParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SpecParseError::Json(e) => Some(e),
            SpecParseError::Yaml(e) => Some(e),
        }
    }
}

/// Structured description of a service to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub project_name: String,
    pub package_name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_server_port")]
    pub server_port: u16,
    /// Routes in declaration order
    pub routes: Vec<RouteSpec>,
    #[serde(default)]
    pub security: SecurityMode,
    #[serde(default)]
    pub credentials: CredentialConfig,
    #[serde(default)]
    pub rate_limit_policy: RateLimitPolicy,
    #[serde(default)]
    pub observability: ObservabilityFlags,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl ServiceSpec {
    /// Create a spec with defaults for everything but names and routes.
    pub fn new(
        project_name: impl Into<String>,
        package_name: impl Into<String>,
        routes: Vec<RouteSpec>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            package_name: package_name.into(),
            version: default_version(),
            server_port: default_server_port(),
            routes,
            security: SecurityMode::None,
            credentials: CredentialConfig::default(),
            rate_limit_policy: RateLimitPolicy::default(),
            observability: ObservabilityFlags::default(),
        }
    }

    pub fn with_security(mut self, mode: SecurityMode, credentials: CredentialConfig) -> Self {
        self.security = mode;
        self.credentials = credentials;
        self
    }

    pub fn with_rate_limit_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit_policy = policy;
        self
    }

    pub fn with_observability(mut self, flags: ObservabilityFlags) -> Self {
        self.observability = flags;
        self
    }

    /// Parse a spec from JSON, the analyzer's native output.
    pub fn from_json_str(input: &str) -> Result<Self, SpecParseError> {
        serde_json::from_str(input).map_err(SpecParseError::Json)
    }

    /// Parse a spec from YAML.
    pub fn from_yaml_str(input: &str) -> Result<Self, SpecParseError> {
        serde_yaml::from_str(input).map_err(SpecParseError::Yaml)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String, SpecParseError> {
        serde_json::to_string_pretty(self).map_err(SpecParseError::Json)
    }

    /// Directory path of the package, e.g. `com/example/petstore`.
    pub fn package_path(&self) -> String {
        self.package_name.replace('.', "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_defaults() {
        let spec = ServiceSpec::from_json_str(
            r#"{
                "projectName": "users",
                "packageName": "com.example.users",
                "routes": [{"method": "GET", "path": "/users"}]
            }"#,
        )
        .unwrap();

        assert_eq!(spec.version, "0.1.0");
        assert_eq!(spec.server_port, 8080);
        assert_eq!(spec.security, SecurityMode::None);
        assert_eq!(spec.rate_limit_policy, RateLimitPolicy::default());
        assert_eq!(spec.observability, ObservabilityFlags::default());
        assert_eq!(spec.routes[0], RouteSpec::new(HttpMethod::Get, "/users"));
    }

    #[test]
    fn test_route_shapes() {
        let spec = ServiceSpec::from_json_str(
            r#"{
                "projectName": "users",
                "packageName": "com.example.users",
                "routes": [{
                    "method": "POST",
                    "path": "/users",
                    "requestShape": {"type": "object"},
                    "responseShape": {"type": "object", "properties": {"id": {"type": "string"}}}
                }]
            }"#,
        )
        .unwrap();

        let route = &spec.routes[0];
        assert_eq!(route.method, HttpMethod::Post);
        assert_eq!(route.request_shape, Some(json!({"type": "object"})));
        assert!(route.response_shape.is_some());
    }

    #[test]
    fn test_unknown_method_is_parse_error() {
        let input = r#"{
            "projectName": "x",
            "packageName": "x",
            "routes": [{"method": "FETCH", "path": "/"}]
        }"#;
        let err = ServiceSpec::from_json_str(input).unwrap_err();
        assert!(matches!(err, SpecParseError::Json(_)));
    }

    #[test]
    fn test_credentials_satisfy_mode() {
        let none = CredentialConfig::default();
        assert!(none.satisfies(SecurityMode::None));
        assert!(!none.satisfies(SecurityMode::Basic));
        assert!(!none.satisfies(SecurityMode::TokenBearer));

        let basic = CredentialConfig {
            username: Some("admin".into()),
            password: Some("  ".into()),
            token_secret: None,
        };
        assert!(!basic.satisfies(SecurityMode::Basic));

        let bearer = CredentialConfig {
            token_secret: Some("secret".into()),
            ..CredentialConfig::default()
        };
        assert!(bearer.satisfies(SecurityMode::TokenBearer));
    }

    #[test]
    fn test_json_roundtrip_keeps_camel_case() {
        let spec = ServiceSpec::new(
            "users",
            "com.example.users",
            vec![RouteSpec::new(HttpMethod::Delete, "/users/{id}")],
        );
        let text = spec.to_json_string().unwrap();
        assert!(text.contains("\"packageName\""));
        assert!(text.contains("\"DELETE\""));
        assert_eq!(ServiceSpec::from_json_str(&text).unwrap(), spec);
    }

    #[test]
    fn test_package_path() {
        let spec = ServiceSpec::new("a", "com.example.a", vec![]);
        assert_eq!(spec.package_path(), "com/example/a");
    }
}
