//! # Domain Invariants
//!
//! Local checks run before a request leaves the process.

use shared_types::OperationKind;

use super::entities::OperationSpec;
use super::errors::GatewayError;

/// Invariant: the requested path matches the registered kind.
pub fn invariant_kind(spec: &OperationSpec, requested: OperationKind) -> Result<(), GatewayError> {
    if spec.kind != requested {
        return Err(GatewayError::OperationKindMismatch {
            operation: spec.qualified_name(),
            registered: spec.kind,
            requested,
        });
    }
    Ok(())
}

/// Invariant: positional argument count equals the declared arity.
pub fn invariant_arity(spec: &OperationSpec, args: &[String]) -> Result<(), GatewayError> {
    if args.len() != spec.arity {
        return Err(GatewayError::ArgumentArity {
            operation: spec.qualified_name(),
            expected: spec.arity,
            actual: args.len(),
        });
    }
    Ok(())
}
