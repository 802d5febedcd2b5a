//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Annotation listing the comma-separated keys a Secret wants generated
pub const ANNOTATION_AUTOGENERATE: &str = "secret-generator.microscaler.io/autogenerate";

/// Annotation marking every auto-generated key as produced by the secure generator
pub const ANNOTATION_SECURE: &str = "secret-generator.microscaler.io/secure";

/// One-shot annotation requesting regeneration (`yes` or a comma-separated key list)
pub const ANNOTATION_REGENERATE: &str = "secret-generator.microscaler.io/regenerate";

/// Annotation overriding the generated length for an annotated Secret
pub const ANNOTATION_LENGTH: &str = "secret-generator.microscaler.io/length";

/// Annotation overriding the encoding for an annotated Secret
pub const ANNOTATION_ENCODING: &str = "secret-generator.microscaler.io/encoding";

/// Regenerate directive value meaning "every auto-generated key"
pub const REGENERATE_ALL: &str = "yes";

/// Value written to the secure marker annotation
pub const SECURE_MARKER_VALUE: &str = "yes";

/// Suffix on a length string selecting byte-length mode
pub const BYTE_LENGTH_SUFFIX: char = 'b';

/// Default generated length when neither the resource nor the environment sets one
pub const DEFAULT_SECRET_LENGTH: &str = "40";

/// Default encoding when neither the resource nor the environment sets one
pub const DEFAULT_SECRET_ENCODING: &str = "base64";

/// Secret type used when a StringSecret does not declare one
pub const DEFAULT_SECRET_TYPE: &str = "Opaque";

/// Upper bound on the size of one generated value after encoding, and on the
/// declared length itself (Secrets are capped at 1MiB by the API server)
pub const MAX_SECRET_LENGTH: usize = 1_048_576;

/// Field manager recorded on patches issued by the controller
pub const FIELD_MANAGER: &str = "secret-generator-controller";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Fixed delay before retrying a pass that failed to read the random source (seconds)
pub const DEFAULT_GENERATION_ERROR_REQUEUE_SECS: u64 = 30;

/// Delay before retrying a pass that lost an optimistic-concurrency race (seconds)
pub const DEFAULT_CONFLICT_REQUEUE_SECS: u64 = 1;

/// Default requeue interval for unclassified reconciliation errors (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 60;

/// Fibonacci backoff bounds for unclassified errors (minutes)
pub const BACKOFF_MIN_MINUTES: u64 = 1;
pub const BACKOFF_MAX_MINUTES: u64 = 10;
