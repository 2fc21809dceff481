/// Annotation selecting how requests are routed to the async producer.
pub const ASYNC_MODE_ANNOTATION: &str = "async.knative.dev/mode";
pub const ASYNC_ALWAYS_MODE: &str = "always.async.knative.dev";
pub const ASYNC_CONDITIONAL_MODE: &str = "conditional.async.knative.dev";

/// Annotation used by Knative to pick the ingress implementation.
pub const INGRESS_CLASS_ANNOTATION: &str = "networking.knative.dev/ingress.class";
pub const DEFAULT_INGRESS_CLASS: &str = "kourier.ingress.networking.knative.dev";
pub const LAST_APPLIED_ANNOTATION: &str = "kubectl.kubernetes.io/last-applied-configuration";

pub const NEW_SUFFIX: &str = "-new";
pub const ASYNC_SUFFIX: &str = "-async";

/// Set on `-async` services to the name of the ingress they serve.
pub const ASYNC_SERVICE_LABEL: &str = "async.knative.dev/ingress";

pub const PRODUCER_SERVICE_NAME: &str = "async-producer";
/// Carries the original virtual host to the producer.
pub const ASYNC_ORIGINAL_HOST_HEADER: &str = "Async-Original-Host";

pub const PREFER_HEADER: &str = "Prefer";
pub const PREFER_ASYNC: &str = "respond-async";
pub const PREFER_SYNC: &str = "respond-sync";

pub const FIELD_MANAGER: &str = "async-ingress-controller";
