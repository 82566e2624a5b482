// # dyndnsd
//
// Thin HTTP layer over `dyndns-core`:
// - **config**: Environment-only daemon configuration
// - **auth**: Basic-auth gate in front of every route
// - **server**: The `GET /` update endpoint
//
// No DNS logic lives here. The handler turns a request into a
// `DesiredUpdate`, hands it to the `Reconciler` and renders the outcome.

pub mod auth;
pub mod config;
pub mod server;

pub use auth::BasicCredentials;
pub use config::Config;
pub use server::{AppState, router};
