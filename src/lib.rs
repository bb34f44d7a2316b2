//! Student Access & Billing Bridge
//!
//! Mediates between the Flexge enrollment platform and the Asaas billing
//! platform, neither of which knows about the other: the inactivity scan
//! applies threshold-based access transitions, the payment orchestrator
//! resolves students into billing customers and issues charges, and the
//! subscription switcher changes payment methods. State lives on the remote
//! platforms; every workflow re-derives it per invocation.
//!
//! # Modules
//!
//! - `assistant`: Generative-model collaborator (explanations, image triage).
//! - `billing`: Asaas billing platform client.
//! - `config`: Configuration management.
//! - `enrollment`: Flexge enrollment platform client.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `inactivity`: Inactivity classifier and batch enforcer.
//! - `notify`: Notification channel, worker, mail and WhatsApp transports.
//! - `payments`: Payment orchestration workflows.
//! - `resolver`: Student-to-customer resolution.
//! - `subscriptions`: Subscription billing-type switcher.

pub mod assistant;
pub mod billing;
pub mod config;
pub mod enrollment;
pub mod errors;
pub mod handlers;
pub mod inactivity;
pub mod notify;
pub mod payments;
pub mod resolver;
pub mod subscriptions;
