// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Shipyard
//!
//! The declarative configuration layer of a container deployment tool.
//!
//! ## Overview
//!
//! Shipyard turns a human-authored service manifest into a validated,
//! environment-resolved model and fingerprints each service so a deployment
//! driver can tell whether its container must be recreated.
//!
//! ## Pipeline
//!
//! 1. **Expand**: `${NAME}` and `${NAME:-DEFAULT}` are resolved against the
//!    environment (after loading `.env`)
//! 2. **Parse**: the expanded YAML becomes a [`config::Config`]
//! 3. **Normalize**: post-parse defaults (service path `./`)
//! 4. **Validate**: every violation is collected and reported together
//! 5. **Fingerprint**: an order-insensitive SHA-256 per service
//!
//! Images are built and pushed separately by [`build::ImagePipeline`].
//!
//! ## Modules
//!
//! - [`config`]: Manifest expansion, parsing, validation and fingerprinting
//! - [`build`]: Image build/push pipeline
//! - [`cli`]: Command-line interface
//! - [`error`]: Error types
//!
//! ## Example
//!
//! ```yaml
//! project:
//!   name: shop
//!   domain: shop.example.com
//!   email: ops@example.com
//!
//! server:
//!   host: 203.0.113.10
//!   port: 22
//!   user: deploy
//!   ssh_key: ~/.ssh/id_ed25519
//!
//! services:
//!   - name: web
//!     image: registry.example.com/shop/web:${TAG:-latest}
//!     port: ${WEB_PORT:-3000}
//!     routes:
//!       - path: /
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod build;
pub mod cli;
pub mod config;
pub mod error;

// ============================================================================
// Re-exports
// ============================================================================

pub use build::{Executor, ImagePipeline, LocalExecutor};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{Config, ConfigParser, ConfigValidator, Fingerprinter, Service};
pub use error::{Result, ShipyardError};
