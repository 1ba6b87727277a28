//! End-to-end tests spanning config, parsing and authorization.

mod patch_flow;
