//! What the host knows about job parameters and invocations.

use tracer_primitives::InvocationId;

use crate::overrides::TracerConfigurationOverride;

/// Declared type of a job parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParameterKind {
    /// A tracer handle.
    Tracer,
    /// Anything else, identified by its type name.
    Other(String),
}

/// A job parameter as presented to binding providers.
#[derive(Clone, Debug)]
pub struct ParameterDescriptor {
    name: String,
    kind: ParameterKind,
    configuration_override: Option<TracerConfigurationOverride>,
}

impl ParameterDescriptor {
    /// Describes a parameter of the given kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            configuration_override: None,
        }
    }

    /// Describes a tracer parameter.
    #[must_use]
    pub fn tracer(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Tracer)
    }

    /// Attaches a configuration override.
    #[must_use]
    pub fn with_override(mut self, configuration_override: TracerConfigurationOverride) -> Self {
        self.configuration_override = Some(configuration_override);
        self
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared kind.
    #[must_use]
    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    /// Override attached to the parameter, if any.
    #[must_use]
    pub fn configuration_override(&self) -> Option<&TracerConfigurationOverride> {
        self.configuration_override.as_ref()
    }
}

/// One job invocation.
#[derive(Clone, Debug)]
pub struct BindingContext {
    invocation_id: InvocationId,
    function_name: String,
}

impl BindingContext {
    /// Creates a context for `function_name` with a fresh invocation id.
    #[must_use]
    pub fn new(function_name: impl Into<String>) -> Self {
        Self::with_invocation_id(InvocationId::random(), function_name)
    }

    /// Creates a context with an id assigned by the host.
    #[must_use]
    pub fn with_invocation_id(invocation_id: InvocationId, function_name: impl Into<String>) -> Self {
        Self {
            invocation_id,
            function_name: function_name.into(),
        }
    }

    /// Invocation identifier.
    #[must_use]
    pub const fn invocation_id(&self) -> InvocationId {
        self.invocation_id
    }

    /// Name of the invoked function.
    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }
}
