//! Keystroke Biometrics - typing-rhythm enrollment and verification.
//!
//! This library reduces typing sessions to a two-number signature (mean dwell
//! time, mean flight time), guards each user's profile against poisoned
//! training sessions, and ranks a typing sample against every enrolled profile.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Keystroke Biometrics                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │ Keystrokes  │──▶│  Aggregate  │──▶│    Gate     │──▶ store │
//! │  │ (dwell/fly) │   │ (signature) │   │ (enroll)    │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │                           │                                   │
//! │                           ▼                                   │
//! │                    ┌─────────────┐   ┌─────────────┐         │
//! │                    │  Verifier   │◀──│Profile Store│         │
//! │                    │ (Manhattan) │   │ (aggregates)│         │
//! │                    └─────────────┘   └─────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use keystroke_biometrics::{BiometricService, KeystrokeRecorder, MemoryProfileStore, SessionRequest};
//!
//! let service = BiometricService::new(MemoryProfileStore::new());
//!
//! let mut recorder = KeystrokeRecorder::new();
//! recorder.record("h", "72", 0, 95);
//! recorder.record("i", "73", 140, 230);
//!
//! let request = SessionRequest::new("ana", "hi", recorder.into_events());
//! service.enroll(&request).unwrap();
//!
//! let result = service.verify(&request).unwrap();
//! assert!(result.verified);
//! ```

pub mod audit;
pub mod config;
pub mod core;
pub mod error;
pub mod keystroke;
pub mod service;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use audit::{AuditLog, AuditStats, SharedAuditLog};
pub use config::{Config, ConfigError, GateConfig, ServerSettings, VerifierConfig};
pub use core::{
    aggregate, ConsistencyGate, Deviation, GateDecision, ProfileAggregate, ProfileHistory,
    SessionSignature, VerificationMatch, VerificationResult, Verifier,
};
pub use error::BiometricsError;
pub use keystroke::{KeystrokeEvent, KeystrokeRecorder};
pub use service::{BiometricService, SessionReceipt, SessionRequest, UserStats};
pub use store::{JsonFileProfileStore, MemoryProfileStore, ProfileStore, StoredSession};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notice describing what the signature does and does not protect against.
pub const SECURITY_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              KEYSTROKE BIOMETRICS - SECURITY NOTICE              ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Users are identified by how they type, not by what they type.   ║
║                                                                  ║
║  ✓ WHAT IS STORED:                                               ║
║    • How long each key is held (dwell time)                      ║
║    • The gap between releasing one key and pressing the next     ║
║    • The training text and key labels of enrolled sessions       ║
║                                                                  ║
║  ✗ WHAT THIS DOES NOT PROVIDE:                                   ║
║    • Cryptographic authentication                                ║
║    • Protection against replayed or synthetic keystrokes         ║
║    • A calibrated probability; confidence is 100 - distance      ║
║                                                                  ║
║  Use it as one signal alongside a real credential.               ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
