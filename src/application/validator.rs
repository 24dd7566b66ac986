//! Service spec validation.
//!
//! Validation is pure and collects every violation rather than stopping at the
//! first one, so an operator sees the whole list in one pass. Violations are
//! reported in a fixed order: naming, routes, rate limit policy, server, then
//! security.

use crate::domain::policy::PolicyError;
use crate::domain::spec::{HttpMethod, SecurityMode, ServiceSpec};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;
use tracing::warn;

/// Package names are dot-separated lowercase identifier segments.
const PACKAGE_NAME_PATTERN: &str = r"^[a-z][a-z0-9]*(\.[a-z][a-z0-9]*)*$";

fn package_name_regex() -> Option<&'static Regex> {
    static PACKAGE_NAME: OnceLock<Option<Regex>> = OnceLock::new();
    PACKAGE_NAME
        .get_or_init(|| Regex::new(PACKAGE_NAME_PATTERN).ok())
        .as_ref()
}

/// A single rule broken by a [`ServiceSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    EmptyProjectName,
    InvalidPackageName(String),
    EmptyRouteSet,
    /// Route paths must start with `/`
    InvalidRoutePath(HttpMethod, String),
    /// The same method and path are declared more than once
    DuplicateRoute(HttpMethod, String),
    InvalidRateLimitPolicy(PolicyError),
    InvalidServerPort,
    /// The security mode needs credentials that are missing or blank
    MissingSecurityCredentials(SecurityMode),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::EmptyProjectName => write!(f, "project name must not be empty"),
            Violation::InvalidPackageName(name) => write!(
                f,
                "package name '{}' must be dot-separated lowercase identifiers",
                name
            ),
            Violation::EmptyRouteSet => write!(f, "at least one route is required"),
            Violation::InvalidRoutePath(method, path) => {
                write!(f, "route {} '{}' must start with '/'", method, path)
            }
            Violation::DuplicateRoute(method, path) => {
                write!(f, "route {} {} is declared more than once", method, path)
            }
            Violation::InvalidRateLimitPolicy(reason) => {
                write!(f, "invalid rate limit policy: {}", reason)
            }
            Violation::InvalidServerPort => write!(f, "server port must not be 0"),
            Violation::MissingSecurityCredentials(mode) => {
                write!(f, "security mode '{}' is missing credentials", mode)
            }
        }
    }
}

/// Outcome of validating a spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    /// Never empty
    Invalid(Vec<Violation>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Violations found, empty when valid.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid(violations) => violations,
        }
    }

    /// Pair this result with the spec it was computed for.
    ///
    /// # Errors
    /// Returns `SpecValidationError` carrying every violation when invalid.
    pub fn into_validated(self, spec: ServiceSpec) -> Result<ValidatedSpec, SpecValidationError> {
        match self {
            ValidationResult::Valid => Ok(ValidatedSpec(spec)),
            ValidationResult::Invalid(violations) => Err(SpecValidationError { violations }),
        }
    }
}

/// A spec that passed validation.
///
/// Built by [`SpecValidator::validate_owned`] or
/// [`ValidationResult::into_validated`]; renderers accept nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSpec(ServiceSpec);

impl ValidatedSpec {
    pub fn spec(&self) -> &ServiceSpec {
        &self.0
    }

    pub fn into_inner(self) -> ServiceSpec {
        self.0
    }
}

impl AsRef<ServiceSpec> for ValidatedSpec {
    fn as_ref(&self) -> &ServiceSpec {
        &self.0
    }
}

/// Error carrying all violations of an invalid spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecValidationError {
    pub violations: Vec<Violation>,
}

impl fmt::Display for SpecValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service spec has {} violation(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for SpecValidationError {}

/// Checks a [`ServiceSpec`] before it is handed to a renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecValidator;

impl SpecValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a spec, collecting every violation.
    pub fn validate(&self, spec: &ServiceSpec) -> ValidationResult {
        let mut violations = Vec::new();

        if spec.project_name.trim().is_empty() {
            violations.push(Violation::EmptyProjectName);
        }

        let package_ok = package_name_regex().is_some_and(|re| re.is_match(&spec.package_name));
        if !package_ok {
            violations.push(Violation::InvalidPackageName(spec.package_name.clone()));
        }

        if spec.routes.is_empty() {
            violations.push(Violation::EmptyRouteSet);
        }

        for route in &spec.routes {
            if !route.path.starts_with('/') {
                violations.push(Violation::InvalidRoutePath(route.method, route.path.clone()));
            }
        }

        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for route in &spec.routes {
            let key = (route.method, route.path.as_str());
            if !seen.insert(key) && reported.insert(key) {
                violations.push(Violation::DuplicateRoute(route.method, route.path.clone()));
            }
        }

        if spec.rate_limit_policy.enabled {
            if let Err(reason) = spec.rate_limit_policy.validate() {
                violations.push(Violation::InvalidRateLimitPolicy(reason));
            }
        }

        if spec.server_port == 0 {
            violations.push(Violation::InvalidServerPort);
        }

        if !spec.credentials.satisfies(spec.security) {
            violations.push(Violation::MissingSecurityCredentials(spec.security));
        }

        if violations.is_empty() {
            ValidationResult::Valid
        } else {
            warn!(
                project = %spec.project_name,
                violations = violations.len(),
                "service spec failed validation"
            );
            ValidationResult::Invalid(violations)
        }
    }

    /// Validate and take ownership of the spec in one step.
    pub fn validate_owned(&self, spec: ServiceSpec) -> Result<ValidatedSpec, SpecValidationError> {
        self.validate(&spec).into_validated(spec)
    }
}
