// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Storage lives in `store` and `inventory`, remote payment providers in
// `payment`. This layer decides the order in which they are called.
//
// ============================================================================

pub mod checkout;
