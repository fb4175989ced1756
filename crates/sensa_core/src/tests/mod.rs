//! Integration tests for the sensitivity engine
//!
//! Tests are organized by topic:
//! - `scenarios` - End-to-end session runs on analytic models
//! - `properties` - Sampling and estimator properties that must hold for any input
//! - `morris_selection` - Duplicate handling and subset size of the Morris builder

mod morris_selection;
