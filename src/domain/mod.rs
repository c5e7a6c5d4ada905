// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust types and traits that describe the captioning
// problem: splits, caption records, special markers and the
// metric sink abstraction.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Splits, caption records and special markers
pub mod caption;

// Core abstractions (traits) that other layers implement
pub mod traits;
